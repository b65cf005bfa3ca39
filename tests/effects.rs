mod common;

mod tests {
    use embassy_time::Duration;
    use wopr_effects::Pitch;
    use wopr_effects::effect::{
        ClockEffect, ClockMode, CodeSolveEffect, CodeSolveVariant, CountdownEffect, Effect,
        EffectDuration, Note, RainbowEffect, ScrollTextEffect, SongEffect, TextEffect,
        note_duration,
    };
    use wopr_effects::frame::AudioState;
    use wopr_effects::{DateTime, Rgb, TextAlignment};

    use crate::common::{Harness, TUESDAY_AFTERNOON};

    static LITTLE_TUNE: [Note; 3] = [
        Note::new(Pitch::A, 4, 4, "LA"),
        Note::rest(8, "-"),
        Note::new(Pitch::C, 5, -4, ""),
    ];

    #[test]
    fn test_text_effect_centers_and_holds() {
        let mut harness = Harness::new();
        let mut effect = TextEffect::new("HELLO", TextAlignment::Center);

        effect.start(&mut harness.ctx(0));
        assert!(effect.is_running());
        assert_eq!(harness.frame.text(), "   HELLO    ");

        effect.tick(&mut harness.ctx(60_000));
        assert!(effect.is_running());
        assert_eq!(harness.frame.text(), "   HELLO    ");
    }

    #[test]
    fn test_text_effect_clears_after_duration() {
        let mut harness = Harness::new();
        let mut effect =
            TextEffect::new("BYE", TextAlignment::Right).with_duration(EffectDuration::from_millis(1000));

        effect.start(&mut harness.ctx(0));
        assert_eq!(harness.frame.text(), "         BYE");

        effect.tick(&mut harness.ctx(1000));
        assert!(effect.is_running());

        effect.tick(&mut harness.ctx(1001));
        assert!(!effect.is_running());
        assert!(harness.frame.is_dark());
    }

    #[test]
    fn test_scroll_moves_one_cell_per_step() {
        let mut harness = Harness::new();
        let mut effect = ScrollTextEffect::new("AB").with_speed(Duration::from_millis(200));

        effect.start(&mut harness.ctx(0));
        assert_eq!(harness.frame.text(), "            ");

        effect.tick(&mut harness.ctx(100));
        assert_eq!(harness.frame.text(), "            ");

        effect.tick(&mut harness.ctx(200));
        assert_eq!(harness.frame.text(), "           A");

        effect.tick(&mut harness.ctx(400));
        assert_eq!(harness.frame.text(), "          AB");
    }

    #[test]
    fn test_scroll_finite_holds_last_frame_then_stops() {
        let mut harness = Harness::new();
        let mut effect = ScrollTextEffect::new("AB")
            .with_speed(Duration::from_millis(100))
            .with_duration(EffectDuration::from_millis(500));

        effect.start(&mut harness.ctx(0));
        for millis in (100..=1300).step_by(100) {
            effect.tick(&mut harness.ctx(millis));
        }
        assert_eq!(harness.frame.text(), "B           ");

        // Window index len + 12 is the last frame
        effect.tick(&mut harness.ctx(1400));
        assert_eq!(harness.frame.text(), "            ");
        assert!(effect.is_running());

        effect.tick(&mut harness.ctx(1900));
        assert!(effect.is_running());

        effect.tick(&mut harness.ctx(1901));
        assert!(!effect.is_running());
    }

    #[test]
    fn test_scroll_infinite_repeats() {
        let mut harness = Harness::new();
        let mut effect = ScrollTextEffect::new("A").with_speed(Duration::from_millis(100));

        effect.start(&mut harness.ctx(0));
        for millis in (100..=1300).step_by(100) {
            effect.tick(&mut harness.ctx(millis));
        }
        // Index 13 is past the end, so the window restarts at index 0
        effect.tick(&mut harness.ctx(1400));
        assert!(effect.is_running());
        assert_eq!(harness.frame.text(), "            ");

        effect.tick(&mut harness.ctx(1500));
        assert_eq!(harness.frame.text(), "           A");
    }

    #[test]
    fn test_clock_alternates_separators() {
        let mut harness = Harness::synced(TUESDAY_AFTERNOON);
        let mut effect = ClockEffect::new(ClockMode::Time);

        effect.start(&mut harness.ctx(0));
        assert_eq!(effect.time_format(), "%H %M %S");
        assert_eq!(effect.odd_time_format(), "%H.%M.%S");
        assert_eq!(harness.frame.text(), "  14 07 09  ");

        effect.tick(&mut harness.ctx(250));
        assert_eq!(harness.frame.text(), "  14 07 09  ");

        effect.tick(&mut harness.ctx(500));
        assert_eq!(harness.frame.text(), "  14.07.09  ");

        effect.tick(&mut harness.ctx(1000));
        assert_eq!(harness.frame.text(), "  14 07 10  ");
    }

    #[test]
    fn test_clock_format_fallbacks() {
        let mut harness = Harness::synced(TUESDAY_AFTERNOON);
        harness.config.time_format.clear();
        harness.config.date_format.clear();

        let mut effect = ClockEffect::new(ClockMode::DateTime);
        effect.start(&mut harness.ctx(0));
        assert_eq!(effect.time_format(), "%H:%M:%S");
        assert_eq!(effect.date_format(), "%Y-%m-%d");

        let mut explicit = ClockEffect::new(ClockMode::Time).with_time_format("%I:%M %p");
        explicit.start(&mut harness.ctx(0));
        assert_eq!(explicit.time_format(), "%I:%M %p");
        assert_eq!(harness.frame.text(), "  02:07 PM  ");
    }

    #[test]
    fn test_date_clock() {
        let mut harness = Harness::synced(TUESDAY_AFTERNOON);
        let mut effect = ClockEffect::new(ClockMode::Date).with_date_format("%a %d %b");

        effect.start(&mut harness.ctx(0));
        assert_eq!(harness.frame.text(), " Tue 05 Mar ");
    }

    #[test]
    fn test_date_time_shows_date_for_three_of_ten_refreshes() {
        let mut harness = Harness::synced(TUESDAY_AFTERNOON);
        let mut effect = ClockEffect::new(ClockMode::DateTime);

        let mut shown = Vec::new();
        effect.start(&mut harness.ctx(0));
        shown.push(harness.frame.text().to_string());
        for millis in (500..5000).step_by(500) {
            effect.tick(&mut harness.ctx(millis));
            shown.push(harness.frame.text().to_string());
        }

        let dates = shown.iter().filter(|text| text.as_str() == " 2024-03-05 ").count();
        assert_eq!(dates, 3);
        assert_eq!(shown.len(), 10);
        assert_eq!(shown[6], " 2024-03-05 ");
        assert_ne!(shown[5], " 2024-03-05 ");
    }

    #[test]
    fn test_clock_without_time() {
        let mut harness = Harness::new();
        let mut time = ClockEffect::new(ClockMode::Time);
        time.start(&mut harness.ctx(0));
        assert_eq!(harness.frame.text(), "Time failed ");

        let mut date = ClockEffect::new(ClockMode::Date);
        date.start(&mut harness.ctx(0));
        assert_eq!(harness.frame.text(), "Time failed ");
    }

    #[test]
    fn test_rainbow_clock_names() {
        assert_eq!(ClockEffect::new(ClockMode::Time).with_rainbow().name(), "Time R");
        assert_eq!(ClockEffect::new(ClockMode::Date).with_rainbow().name(), "Date R");
        assert_eq!(
            ClockEffect::new(ClockMode::DateTime).with_rainbow().name(),
            "Date Time R"
        );
        assert_eq!(ClockEffect::new(ClockMode::DateTime).name(), "Date Time");
    }

    #[test]
    fn test_rainbow_clock_lights_strip() {
        let mut harness = Harness::synced(TUESDAY_AFTERNOON);
        let mut effect = ClockEffect::new(ClockMode::Time).with_rainbow();

        effect.start(&mut harness.ctx(0));
        assert!(harness.frame.pixels().iter().any(|pixel| *pixel != Rgb::default()));
        assert_eq!(harness.frame.text(), "  14 07 09  ");
    }

    #[test]
    fn test_countdown_seconds_until() {
        let countdown = CountdownEffect::christmas();
        assert_eq!(countdown.seconds_until(&DateTime::date(2024, 12, 24)), 86_400);
        assert_eq!(
            countdown.seconds_until(&DateTime::new(2024, 12, 24, 23, 59, 59)),
            1
        );
        // On the day itself the next occurrence is a year away
        assert_eq!(
            countdown.seconds_until(&DateTime::date(2024, 12, 25)),
            365 * 86_400
        );
        assert_eq!(
            countdown.seconds_until(&DateTime::date(2024, 12, 26)),
            364 * 86_400
        );
    }

    #[test]
    fn test_countdown_scrolls_remaining_seconds() {
        let christmas_eve = DateTime::new(2024, 12, 24, 23, 59, 50).to_unix();
        let mut harness = Harness::synced(christmas_eve);
        let mut effect = CountdownEffect::christmas();

        effect.start(&mut harness.ctx(0));
        assert!(effect.is_running());
        assert_eq!(effect.name(), "Xmas seconds");
        assert_eq!(effect.text(), "10 Seconds until XMAS...");
    }

    #[test]
    fn test_countdown_without_time_does_not_start() {
        let mut harness = Harness::new();
        let mut effect = CountdownEffect::christmas();

        effect.start(&mut harness.ctx(0));
        assert!(!effect.is_running());
        assert_eq!(effect.text(), "Failed to obtain time");
    }

    #[test]
    fn test_movie_code_starts_with_presolved_blanks() {
        let mut harness = Harness::new();
        let mut effect = CodeSolveEffect::new(CodeSolveVariant::Movie);

        effect.start(&mut harness.ctx(0));
        assert!(effect.is_running());
        assert_eq!(effect.solution(), "CPE 1704 TKS");
        assert_eq!(effect.order(), &[7, 1, 4, 6, 11, 2, 5, 0, 10, 9]);
        assert!(effect.revealed()[3]);
        assert!(effect.revealed()[8]);
        assert_eq!(effect.revealed().iter().filter(|done| **done).count(), 2);

        match harness.frame.audio() {
            AudioState::Tone(hz) => assert!((90..250).contains(&hz)),
            other => panic!("expected a chatter tone, got {other:?}"),
        }

        // No progress yet: DEFCON 5 on the first pixel
        let pixels = harness.frame.pixels();
        assert_eq!(pixels[0], harness.palette[4]);
        assert!(pixels[1..].iter().all(|pixel| *pixel == Rgb::default()));
    }

    #[test]
    fn test_code_solve_runs_to_completion() {
        let mut harness = Harness::new();
        let mut effect = CodeSolveEffect::new(CodeSolveVariant::Movie);

        let mut saw_solution = false;
        let mut saw_launching = false;
        effect.start(&mut harness.ctx(0));
        let mut millis = 0;
        while effect.is_running() && millis < 120_000 {
            millis += 10;
            effect.tick(&mut harness.ctx(millis));
            saw_solution |= harness.frame.text() == "CPE 1704 TKS";
            saw_launching |= harness.frame.text() == "LAUNCHING...";
        }

        assert!(!effect.is_running());
        assert!(saw_solution);
        assert!(saw_launching);
        assert!(harness.frame.is_dark());
        assert!(effect.revealed().iter().all(|done| *done));
    }

    #[test]
    fn test_code_solve_outlasts_finite_duration() {
        let mut harness = Harness::new();
        let mut effect = CodeSolveEffect::new(CodeSolveVariant::Movie)
            .with_duration(EffectDuration::from_millis(3000));

        effect.start(&mut harness.ctx(0));
        let mut millis = 0;
        while millis < 3010 {
            millis += 10;
            effect.tick(&mut harness.ctx(millis));
        }
        assert!(effect.is_running());
        assert!(effect.step() < effect.order().len());

        let mut saw_launching = false;
        while effect.is_running() && millis < 120_000 {
            millis += 10;
            effect.tick(&mut harness.ctx(millis));
            saw_launching |= harness.frame.text() == "LAUNCHING...";
        }
        assert!(!effect.is_running());
        assert!(saw_launching);
        assert!(effect.revealed().iter().all(|done| *done));
        assert!(harness.frame.is_dark());
    }

    #[test]
    fn test_second_stop_leaves_same_frame() {
        let mut harness = Harness::new();
        let mut effect = CodeSolveEffect::new(CodeSolveVariant::Movie);
        effect.start(&mut harness.ctx(0));
        effect.tick(&mut harness.ctx(100));

        effect.stop(&mut harness.ctx(110));
        let cells = *harness.frame.cells();
        let pixels = *harness.frame.pixels();
        let audio = harness.frame.audio();
        assert!(!effect.is_running());
        assert!(harness.frame.is_dark());

        effect.stop(&mut harness.ctx(120));
        assert!(!effect.is_running());
        assert_eq!(*harness.frame.cells(), cells);
        assert_eq!(*harness.frame.pixels(), pixels);
        assert_eq!(harness.frame.audio(), audio);

        let mut text = TextEffect::new("WOPR", TextAlignment::Right);
        text.start(&mut harness.ctx(130));
        text.stop(&mut harness.ctx(140));
        text.stop(&mut harness.ctx(150));
        assert!(!text.is_running());
        assert_eq!(*harness.frame.cells(), cells);
        assert_eq!(harness.frame.audio(), AudioState::Silent);
    }

    #[test]
    fn test_random_code_shuffles_every_cell() {
        let mut harness = Harness::new();
        let mut effect = CodeSolveEffect::new(CodeSolveVariant::Random);

        effect.start(&mut harness.ctx(0));
        let mut order = effect.order().to_vec();
        order.sort_unstable();
        assert_eq!(order, (0..12).collect::<Vec<u8>>());
        assert!(
            effect
                .solution()
                .bytes()
                .all(|glyph| glyph.is_ascii_digit() || glyph.is_ascii_uppercase() || glyph == b' ')
        );
        assert!(effect.revealed().iter().all(|done| !*done));
    }

    #[test]
    fn test_message_code() {
        let mut harness = Harness::new();
        let mut effect = CodeSolveEffect::new(CodeSolveVariant::Message);

        effect.start(&mut harness.ctx(0));
        assert_eq!(effect.solution(), "LOLZ FOR YOU");
        assert_eq!(effect.order().len(), 12);
    }

    #[test]
    fn test_note_duration() {
        let whole = Duration::from_millis(2000);
        assert_eq!(note_duration(whole, 4), Duration::from_millis(500));
        assert_eq!(note_duration(whole, 8), Duration::from_millis(250));
        assert_eq!(note_duration(whole, -4), Duration::from_millis(750));
        assert_eq!(note_duration(whole, 0), Duration::from_millis(0));
    }

    #[test]
    fn test_song_plays_notes_and_lyrics() {
        let mut harness = Harness::new();
        let mut effect = SongEffect::new(&LITTLE_TUNE).with_tempo(120);
        assert_eq!(effect.whole_note(), Duration::from_millis(2000));

        effect.start(&mut harness.ctx(0));
        assert_eq!(
            harness.frame.audio(),
            AudioState::Note {
                pitch: Pitch::A,
                octave: 4
            }
        );
        assert_eq!(harness.frame.text(), "     LA     ");

        effect.tick(&mut harness.ctx(499));
        assert_eq!(effect.step(), 1);

        // Rest with "-" silences and clears
        effect.tick(&mut harness.ctx(500));
        assert_eq!(harness.frame.audio(), AudioState::Silent);
        assert_eq!(harness.frame.text(), "            ");

        // Empty lyric leaves the display alone
        effect.tick(&mut harness.ctx(750));
        assert_eq!(
            harness.frame.audio(),
            AudioState::Note {
                pitch: Pitch::C,
                octave: 5
            }
        );

        effect.tick(&mut harness.ctx(1499));
        assert!(effect.is_running());

        effect.tick(&mut harness.ctx(1500));
        assert!(!effect.is_running());
        assert_eq!(harness.frame.audio(), AudioState::Silent);
        assert_eq!(effect.step(), 3);
    }

    #[test]
    fn test_builtin_songs_are_locked() {
        let mut nokia = SongEffect::nokia_tune();
        assert_eq!(nokia.name(), "Nokia Tune");
        assert_eq!(nokia.tempo(), 180);
        assert!(!nokia.set_tempo(90));
        assert!(!nokia.set_song(&LITTLE_TUNE));
        assert_eq!(nokia.tempo(), 180);

        let rick = SongEffect::the_rick();
        assert_eq!(rick.name(), "The Rick");
        assert_eq!(rick.tempo(), 114);

        let mut custom = SongEffect::new(&LITTLE_TUNE);
        assert!(custom.set_tempo(60));
        assert_eq!(custom.whole_note(), Duration::from_millis(4000));
    }

    #[test]
    fn test_rainbow_rotates_every_40ms() {
        let mut harness = Harness::new();
        let mut effect = RainbowEffect::new();

        effect.start(&mut harness.ctx(0));
        assert_eq!(effect.hue(), 256);
        let first = *harness.frame.pixels();
        assert!(first.iter().all(|pixel| *pixel != Rgb::default()));

        effect.tick(&mut harness.ctx(20));
        assert_eq!(effect.hue(), 256);

        effect.tick(&mut harness.ctx(40));
        assert_eq!(effect.hue(), 512);

        effect.stop(&mut harness.ctx(50));
        assert!(!effect.is_running());
        assert!(harness.frame.is_dark());
    }
}
