mod tests {
    use wopr_effects::defcon::{DEFAULT_DEFCON_COLORS, show_level};
    use wopr_effects::{DefconLevel, Frame, Rgb};

    #[test]
    fn test_defcon_raw_values() {
        assert_eq!(DefconLevel::from_raw(0), DefconLevel::One);
        assert_eq!(DefconLevel::from_raw(4), DefconLevel::Five);
        assert_eq!(DefconLevel::from_raw(9), DefconLevel::None);
        assert_eq!(DefconLevel::Three.as_raw(), 2);
        assert_eq!(DefconLevel::default(), DefconLevel::None);
    }

    #[test]
    fn test_defcon_names() {
        assert_eq!(DefconLevel::One.as_str(), "DEFCON 1");
        assert_eq!(DefconLevel::None.as_str(), "None");
        assert_eq!(DefconLevel::parse_from_str("DEFCON 3"), DefconLevel::Three);
        assert_eq!(DefconLevel::parse_from_str("DEFCON3"), DefconLevel::Three);
        assert_eq!(DefconLevel::parse_from_str("defcon 3"), DefconLevel::None);
        assert_eq!(DefconLevel::parse_from_str("DEFCON 9"), DefconLevel::None);
        assert_eq!(DefconLevel::parse_from_str("DEFCON"), DefconLevel::None);
    }

    #[test]
    fn test_defcon_pixels() {
        assert_eq!(DefconLevel::One.pixel(), Some(4));
        assert_eq!(DefconLevel::Five.pixel(), Some(0));
        assert_eq!(DefconLevel::None.pixel(), None);
    }

    #[test]
    fn test_defcon_from_progress() {
        assert_eq!(DefconLevel::from_progress(0, 10), DefconLevel::Five);
        assert_eq!(DefconLevel::from_progress(3, 10), DefconLevel::Four);
        assert_eq!(DefconLevel::from_progress(5, 10), DefconLevel::Three);
        assert_eq!(DefconLevel::from_progress(10, 10), DefconLevel::One);
        assert_eq!(DefconLevel::from_progress(15, 10), DefconLevel::One);
        assert_eq!(DefconLevel::from_progress(5, 0), DefconLevel::One);
    }

    #[test]
    fn test_show_level_lights_one_pixel() {
        let mut frame = Frame::new();
        show_level(&mut frame, DefconLevel::Two, &DEFAULT_DEFCON_COLORS);

        let off = Rgb::default();
        let red = Rgb { r: 255, g: 0, b: 0 };
        assert_eq!(frame.pixels(), &[off, off, off, red, off]);

        show_level(&mut frame, DefconLevel::None, &DEFAULT_DEFCON_COLORS);
        assert_eq!(frame.pixels(), &[off; 5]);
    }
}
