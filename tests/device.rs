mod tests {
    use embassy_time::{Duration, Instant};
    use wopr_effects::command::{CommandSink, ConfigChange, DeviceCommand};
    use wopr_effects::config::{ConfigLayer, JsonDocument};
    use wopr_effects::effect::{EffectDuration, RainbowEffect, TextEffect};
    use wopr_effects::text::copy_truncated;
    use wopr_effects::{
        BoardVariant, Button, ButtonEvent, ButtonPress, DefconLevel, Device, DeviceLayer, Frame,
        Rgb, TextAlignment,
    };

    type TestDevice = Device<Frame, 8>;

    const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };

    fn device(variant: BoardVariant) -> TestDevice {
        let mut device = Device::new(Frame::new(), variant, 42);
        device.begin().unwrap();
        device
    }

    fn at(millis: u64) -> Instant {
        Instant::from_millis(millis)
    }

    fn show_pressed(device: &mut TestDevice, press: ButtonPress, _now: Instant) {
        let label = match press.event {
            ButtonEvent::Click => "CLICK",
            ButtonEvent::DoubleClick => "DOUBLE",
        };
        device.display_show_text(label, TextAlignment::Left);
    }

    #[test]
    fn test_begin_applies_brightness_and_clears() {
        let device = device(BoardVariant::Original);
        let frame = device.target();

        // 50% of the driver ranges
        assert_eq!(frame.display_brightness(), 7);
        assert_eq!(frame.pixel_brightness(), 127);
        assert!(frame.is_dark());
        assert_eq!(device.variant().model(), "W.O.P.R");
    }

    #[test]
    fn test_display_brightness_and_state() {
        let mut device = device(BoardVariant::Original);

        device.display_set_brightness(100);
        assert_eq!(device.target().display_brightness(), 15);

        device.display_set_state(false);
        assert_eq!(device.target().display_brightness(), 0);
        assert_eq!(device.display_brightness(), 100);

        device.display_set_state(true);
        assert_eq!(device.target().display_brightness(), 15);

        device.display_set_brightness(250);
        assert_eq!(device.display_brightness(), 100);
    }

    #[test]
    fn test_display_text_and_cells() {
        let mut device = device(BoardVariant::Original);

        device.display_show_text("ABC", TextAlignment::Center);
        assert_eq!(device.target().text(), "    ABC     ");

        device.display_set_cell(0, b'X');
        device.display_set_cell(12, b'Y');
        assert_eq!(device.target().text(), "X   ABC     ");

        device.display_clear();
        assert_eq!(device.target().text(), "            ");
    }

    #[test]
    fn test_defcon_level_lights_one_pixel() {
        let mut device = device(BoardVariant::Original);

        device.defcon_set_level(DefconLevel::Three);
        let pixels = device.target().pixels();
        assert_eq!(pixels[2], Rgb { r: 255, g: 255, b: 0 });
        assert_eq!(pixels.iter().filter(|pixel| **pixel != Rgb::default()).count(), 1);
        assert_eq!(device.defcon_level(), DefconLevel::Three);

        device.defcon_set_level(DefconLevel::One);
        assert_eq!(device.target().pixels()[4], Rgb { r: 255, g: 255, b: 255 });
        assert_eq!(device.target().pixels()[2], Rgb::default());

        device.defcon_set_level(DefconLevel::None);
        assert!(device.target().pixels().iter().all(|pixel| *pixel == Rgb::default()));
    }

    #[test]
    fn test_defcon_palette_override() {
        let mut device = device(BoardVariant::Original);
        let purple = Rgb { r: 128, g: 0, b: 128 };

        device.defcon_set_palette_color(DefconLevel::Five, purple);
        device.defcon_set_level(DefconLevel::Five);
        assert_eq!(device.target().pixels()[0], purple);

        device.defcon_set_level_color(DefconLevel::Four, RED);
        assert_eq!(device.target().pixels()[1], RED);
        assert_eq!(device.target().pixels()[0], purple);
    }

    #[test]
    fn test_defcon_color_and_state() {
        let mut device = device(BoardVariant::Original);

        device.defcon_set_color(RED);
        assert_eq!(device.defcon_color(), RED);
        assert_eq!(device.target().pixels(), &[RED; 5]);

        device.defcon_set_state(false);
        assert_eq!(device.target().pixel_brightness(), 0);
        assert_eq!(device.defcon_pixels(), &[RED; 5]);

        device.defcon_set_state(true);
        assert_eq!(device.target().pixel_brightness(), 127);
        assert_eq!(device.target().pixels(), &[RED; 5]);

        device.defcon_clear();
        assert!(device.target().is_dark());
    }

    #[test]
    fn test_back_buttons_need_haxorz() {
        let mut original = device(BoardVariant::Original);
        let back = ButtonPress::new(Button::BackTop, ButtonEvent::Click);
        assert_eq!(original.queue_button(back), Err(back));
        assert!(
            original
                .queue_button(ButtonPress::new(Button::FrontLeft, ButtonEvent::Click))
                .is_ok()
        );

        let mut haxorz = device(BoardVariant::Haxorz);
        assert!(haxorz.queue_button(back).is_ok());
    }

    #[test]
    fn test_button_queue_is_bounded() {
        let mut device = device(BoardVariant::Original);
        let press = ButtonPress::new(Button::FrontRight, ButtonEvent::Click);
        for _ in 0..8 {
            device.queue_button(press).unwrap();
        }
        assert_eq!(device.queue_button(press), Err(press));

        let outcome = device.step(at(0));
        assert_eq!(outcome.presses.len(), 8);
        assert!(device.queue_button(press).is_ok());
    }

    #[test]
    fn test_button_handlers_run_on_tick() {
        let mut device = device(BoardVariant::Original);
        device.set_button_handler(Button::FrontLeft, ButtonEvent::DoubleClick, show_pressed);

        device
            .queue_button(ButtonPress::new(Button::FrontLeft, ButtonEvent::Click))
            .unwrap();
        let outcome = device.tick(at(0));
        assert_eq!(outcome.presses.len(), 1);
        assert_eq!(device.target().text(), "            ");

        device
            .queue_button(ButtonPress::new(Button::FrontLeft, ButtonEvent::DoubleClick))
            .unwrap();
        device.tick(at(10));
        assert_eq!(device.target().text(), "DOUBLE      ");

        device.clear_button_handler(Button::FrontLeft, ButtonEvent::DoubleClick);
        device.display_clear();
        device
            .queue_button(ButtonPress::new(Button::FrontLeft, ButtonEvent::DoubleClick))
            .unwrap();
        device.tick(at(20));
        assert_eq!(device.target().text(), "            ");
    }

    #[test]
    fn test_defcon_state_keeps_effect_pixels() {
        let mut device = device(BoardVariant::Original);
        device.register_effect(RainbowEffect::new()).unwrap();
        device.defcon_set_color(RED);

        assert!(device.start_effect("Rainbow", at(0)));
        let painted = *device.target().pixels();
        assert_ne!(painted, [RED; 5]);

        device.defcon_set_state(false);
        device.defcon_set_state(true);
        assert_eq!(device.target().pixels(), &painted);

        device.defcon_set_brightness(80);
        assert!(device.target().pixel_brightness() > 127);
        assert_eq!(device.target().pixels(), &painted);
        assert_eq!(device.defcon_pixels(), &[RED; 5]);

        // With the strip free again the kept pixels come back
        device.stop_effect(at(10));
        device.defcon_set_state(true);
        assert_eq!(device.target().pixels(), &[RED; 5]);
    }

    #[test]
    fn test_effects_by_name() {
        let mut device = device(BoardVariant::Original);
        device.register_effect(RainbowEffect::new()).unwrap();

        assert!(device.start_effect("Rainbow", at(0)));
        assert!(device.current_effect_is_running());
        assert_eq!(device.current_effect_name(), Some("Rainbow"));
        assert!(!device.start_effect("Disco", at(10)));

        device.stop_effect(at(20));
        assert!(!device.current_effect_is_running());
        assert!(device.target().is_dark());
    }

    #[test]
    fn test_default_effect_follows_configured_timeout() {
        let mut device = device(BoardVariant::Original);
        device
            .register_default_effect(TextEffect::new("IDLE", TextAlignment::Left).with_name("Idle"))
            .unwrap();
        device.set_effects_timeout(2);

        device.tick(at(0));
        device.tick(at(1999));
        assert!(!device.current_effect_is_running());

        device.tick(at(2000));
        assert_eq!(device.current_effect_name(), Some("Idle"));
        assert_eq!(device.target().text(), "IDLE        ");
    }

    #[test]
    fn test_scroll_text_runs_once() {
        let mut device = device(BoardVariant::Original);
        device.display_scroll_text_with_speed("HI", Duration::from_millis(100), at(0));
        assert_eq!(device.current_effect_name(), Some("Scroll text"));

        device.tick(at(100));
        assert_eq!(device.target().text(), "           H");

        for millis in (200..=1400).step_by(100) {
            device.tick(at(millis));
        }
        assert!(device.current_effect_is_running());

        device.tick(at(1401));
        assert!(!device.current_effect_is_running());
        assert_eq!(device.scheduler().len(), 0);
    }

    #[test]
    fn test_show_text_command_stops_effect() {
        let mut device = device(BoardVariant::Original);
        device.register_effect(RainbowEffect::new()).unwrap();
        device.start_effect("Rainbow", at(0));

        device.apply(DeviceCommand::ShowText(copy_truncated("HELLO")), at(10));
        assert!(!device.current_effect_is_running());
        assert_eq!(device.target().text(), "HELLO       ");
        assert!(device.target().pixels().iter().all(|pixel| *pixel == Rgb::default()));
    }

    #[test]
    fn test_state_commands() {
        let mut device = device(BoardVariant::Original);

        device.apply(DeviceCommand::DisplayBrightness(20), at(0));
        device.apply(DeviceCommand::DefconLevel(DefconLevel::Two), at(0));
        device.apply(DeviceCommand::DefconBrightness(100), at(0));
        device.apply(DeviceCommand::DisplayState(false), at(0));

        assert_eq!(device.display_brightness(), 20);
        assert!(!device.display_state());
        assert_eq!(device.target().display_brightness(), 0);
        assert_eq!(device.target().pixel_brightness(), 255);
        assert_eq!(device.target().pixels()[3], RED);

        device.apply(DeviceCommand::Restart, at(0));
        assert!(device.restart_requested());
        assert!(device.tick(at(10)).restart_requested);
    }

    #[test]
    fn test_config_changes_mark_dirty_once() {
        let mut device = device(BoardVariant::Original);

        device.apply(DeviceCommand::Config(ConfigChange::EffectsTimeout(5)), at(0));
        device.apply(
            DeviceCommand::Config(ConfigChange::TimeFormat(copy_truncated("%H:%M"))),
            at(0),
        );
        assert!(device.is_config_dirty());
        assert_eq!(device.config().effects_timeout, 5);
        assert_eq!(device.config().time_format, "%H:%M");
        assert_eq!(device.scheduler().idle_timeout(), Duration::from_secs(5));

        assert!(device.tick(at(0)).config_dirty);
        assert!(!device.tick(at(10)).config_dirty);
    }

    #[test]
    fn test_network_settings_are_not_device_settings() {
        let mut device = device(BoardVariant::Original);
        assert!(!device.apply_config_change(&ConfigChange::HostName(copy_truncated("desk"))));
        assert!(!device.apply_config_change(&ConfigChange::UseWebPortal(false)));
        assert!(!device.is_config_dirty());
    }

    #[test]
    fn test_device_config_sections() {
        let mut device = device(BoardVariant::Original);
        device
            .load_sections(br#"{"timeFormat":"%H:%M","displayBrightness":100,"hostName":"desk"}"#)
            .unwrap();

        assert_eq!(device.config().time_format, "%H:%M");
        assert_eq!(device.config().date_format, "%Y-%m-%d");
        assert_eq!(device.config().effects_timeout, 30);
        assert_eq!(device.target().display_brightness(), 15);
        assert!(!device.is_config_dirty());

        let mut doc = JsonDocument::<512>::new();
        device.save_sections(&mut doc).unwrap();
        assert!(doc.as_str().contains(r#""timeFormat":"%H:%M""#));
        assert!(doc.as_str().contains(r#""displayBrightness":100"#));
        assert!(!doc.as_str().contains("hostName"));
    }

    #[test]
    fn test_sync_time_feeds_clock() {
        let mut device = device(BoardVariant::Original);
        assert!(!device.time().is_synced());

        device.sync_time(1_709_647_629, at(0));
        assert!(device.time().is_synced());
    }

    #[test]
    fn test_finite_effect_then_default() {
        let mut device = device(BoardVariant::Haxorz);
        device.set_effects_timeout(1);
        device
            .register_default_effect(TextEffect::new("IDLE", TextAlignment::Right).with_name("Idle"))
            .unwrap();
        device
            .register_effect(RainbowEffect::new().with_duration(EffectDuration::from_millis(200)))
            .unwrap();

        device.start_effect("Rainbow", at(0));
        device.tick(at(201));
        assert!(!device.current_effect_is_running());

        device.tick(at(202));
        device.tick(at(1202));
        assert_eq!(device.current_effect_name(), Some("Idle"));
        assert_eq!(device.target().text(), "        IDLE");
    }
}
