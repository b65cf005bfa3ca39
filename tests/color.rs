mod tests {
    use wopr_effects::color::{
        Rgb, format_rgb, gamma8, gamma_correct, hue_wheel, parse_rgb, rgb_from_u32, rgb_to_u32,
    };

    const ORANGE: Rgb = Rgb {
        r: 255,
        g: 128,
        b: 0,
    };

    #[test]
    fn test_rgb_from_u32() {
        assert_eq!(rgb_from_u32(0xFF_80_00), ORANGE);
        assert_eq!(rgb_to_u32(ORANGE), 0xFF_80_00);
        assert_eq!(rgb_to_u32(rgb_from_u32(0x12_34_56)), 0x12_34_56);
    }

    #[test]
    fn test_format_rgb() {
        assert_eq!(format_rgb(ORANGE), "255,128,0");
        assert_eq!(format_rgb(Rgb { r: 255, g: 255, b: 255 }), "255,255,255");
    }

    #[test]
    fn test_parse_rgb() {
        assert_eq!(parse_rgb("255,128,0"), Some(ORANGE));
        assert_eq!(parse_rgb(" 255, 128 ,0 "), Some(ORANGE));
        assert_eq!(parse_rgb("255,128"), None);
        assert_eq!(parse_rgb("255,128,0,0"), None);
        assert_eq!(parse_rgb("256,0,0"), None);
        assert_eq!(parse_rgb("red"), None);
        assert_eq!(parse_rgb(""), None);
    }

    #[test]
    fn test_gamma8() {
        assert_eq!(gamma8(0), 0);
        assert_eq!(gamma8(255), 255);

        let mid = gamma8(128);
        assert!(mid > 0 && mid < 128);
        assert!(gamma8(200) > mid);

        assert_eq!(
            gamma_correct(Rgb { r: 255, g: 0, b: 128 }),
            Rgb { r: 255, g: 0, b: mid }
        );
    }

    #[test]
    fn test_hue_wheel() {
        assert_eq!(hue_wheel(0), Rgb { r: 255, g: 0, b: 0 });
        // Only the high byte of the hue selects the color
        assert_eq!(hue_wheel(0x00FF), hue_wheel(0));
        assert_ne!(hue_wheel(0x5500), hue_wheel(0));
    }
}
