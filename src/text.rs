//! Text layout for the 12 cell alphanumeric display
//!
//! The display is three 4 cell modules driven as one line. Everything here
//! works on bytes: the segment drivers take ASCII glyphs.

use heapless::String;

/// Number of character cells on the display
pub const DISPLAY_WIDTH: usize = 12;

/// Capacity of text buffers handed to effects
pub const TEXT_CAPACITY: usize = 128;

/// One full display line
pub type Cells = [u8; DISPLAY_WIDTH];

/// Owned text of an effect
pub type TextBuffer = String<TEXT_CAPACITY>;

const BLANK: u8 = b' ';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Lay out `text` on the display line
///
/// Center alignment puts `floor((12 - len) / 2)` blanks on the left and the
/// remainder on the right. Text wider than the display is cut after the 12th
/// cell.
pub fn layout(text: &str, alignment: TextAlignment) -> Cells {
    let bytes = text.as_bytes();
    let len = bytes.len().min(DISPLAY_WIDTH);
    let start = match alignment {
        TextAlignment::Left => 0,
        TextAlignment::Center => (DISPLAY_WIDTH - len) / 2,
        TextAlignment::Right => DISPLAY_WIDTH - len,
    };

    let mut cells = [BLANK; DISPLAY_WIDTH];
    cells[start..start + len].copy_from_slice(&bytes[..len]);
    cells
}

/// Render a window of a scrolling line
///
/// The virtual line is `DISPLAY_WIDTH` blanks, the text, and another
/// `DISPLAY_WIDTH` blanks. `offset` is the index of the first visible cell.
pub fn scroll_window(text: &str, offset: usize) -> Cells {
    let bytes = text.as_bytes();
    let mut cells = [BLANK; DISPLAY_WIDTH];
    for (j, cell) in cells.iter_mut().enumerate() {
        let position = offset + j;
        if position >= DISPLAY_WIDTH && position < DISPLAY_WIDTH + bytes.len() {
            *cell = bytes[position - DISPLAY_WIDTH];
        }
    }
    cells
}

/// Pad `text` on both sides to `width` with `pad`
///
/// Text longer than `width` is returned unchanged.
pub fn pad_center(text: &str, width: usize, pad: char) -> TextBuffer {
    let len = text.len();
    if len > width {
        return copy_truncated(text);
    }
    let left = (width - len) / 2;
    let right = width - len - left;
    padded(text, left, right, pad)
}

/// Pad `text` on the left to `width` with `pad`
///
/// Text longer than `width` is returned unchanged.
pub fn pad_right_aligned(text: &str, width: usize, pad: char) -> TextBuffer {
    let len = text.len();
    if len > width {
        return copy_truncated(text);
    }
    padded(text, width - len, 0, pad)
}

fn padded(text: &str, left: usize, right: usize, pad: char) -> TextBuffer {
    let mut out = TextBuffer::new();
    for _ in 0..left {
        let _ = out.push(pad);
    }
    let _ = out.push_str(text);
    for _ in 0..right {
        let _ = out.push(pad);
    }
    out
}

/// Copy `text` into a buffer, keeping as many whole characters as fit
pub fn copy_truncated<const N: usize>(text: &str) -> String<N> {
    let mut out = String::new();
    for ch in text.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

/// View a display line as text
///
/// Non UTF-8 glyphs make the whole line read as empty.
pub fn cells_as_str(cells: &Cells) -> &str {
    core::str::from_utf8(cells).unwrap_or("")
}
