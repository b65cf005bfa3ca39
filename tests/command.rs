mod tests {
    use embassy_time::Instant;
    use wopr_effects::channel::{Channel, TryReceiveError, TrySendError};
    use wopr_effects::text::copy_truncated;
    use wopr_effects::{
        BoardVariant, CommandChannel, CommandProcessor, CommandSink, DefconLevel, Device,
        DeviceCommand, Frame, Rgb,
    };

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(DeviceCommand, u64)>,
    }

    impl CommandSink for Recorder {
        fn apply(&mut self, command: DeviceCommand, now: Instant) {
            self.seen.push((command, now.as_millis()));
        }
    }

    #[test]
    fn test_channel_is_bounded_and_ordered() {
        let channel = Channel::<u8, 2>::new();
        let sender = channel.sender();

        assert_eq!(sender.try_send(1), Ok(()));
        assert_eq!(sender.try_send(2), Ok(()));
        assert_eq!(sender.try_send(3), Err(TrySendError(3)));
        assert_eq!(channel.len(), 2);
        assert_eq!(channel.take_rejected(), 1);
        assert_eq!(channel.take_rejected(), 0);

        let receiver = channel.receiver();
        assert_eq!(receiver.try_receive(), Ok(1));
        assert_eq!(receiver.try_receive(), Ok(2));
        assert_eq!(receiver.try_receive(), Err(TryReceiveError));
        assert!(receiver.is_empty());
    }

    #[test]
    fn test_channel_clear() {
        let channel = Channel::<u8, 4>::default();
        channel.try_send(1).unwrap();
        channel.try_send(2).unwrap();
        channel.clear();
        assert!(channel.is_empty());
        assert_eq!(channel.try_receive(), Err(TryReceiveError));
    }

    #[test]
    fn test_processor_applies_in_arrival_order() {
        let channel = CommandChannel::<4>::new();
        let sender = channel.sender();
        sender.try_send(DeviceCommand::DisplayState(false)).unwrap();
        sender.try_send(DeviceCommand::Restart).unwrap();
        sender
            .try_send(DeviceCommand::DefconLevel(DefconLevel::Three))
            .unwrap();

        let mut processor = CommandProcessor::new(channel.receiver());
        let mut recorder = Recorder::default();
        assert_eq!(processor.process_pending(&mut recorder, Instant::from_millis(40)), 3);
        assert_eq!(
            recorder.seen,
            [
                (DeviceCommand::DisplayState(false), 40),
                (DeviceCommand::Restart, 40),
                (DeviceCommand::DefconLevel(DefconLevel::Three), 40),
            ]
        );

        assert_eq!(processor.process_pending(&mut recorder, Instant::from_millis(50)), 0);
        assert_eq!(recorder.seen.len(), 3);

        // A full queue turns commands away; the count is cleared when drained
        for _ in 0..5 {
            let _ = sender.try_send(DeviceCommand::StopEffect);
        }
        assert_eq!(processor.process_pending(&mut recorder, Instant::from_millis(60)), 4);
        assert_eq!(channel.take_rejected(), 0);
    }

    #[test]
    fn test_processor_drives_a_device() {
        let mut device = Device::<Frame, 4>::new(Frame::new(), BoardVariant::Original, 2);
        device.begin().unwrap();

        let channel = CommandChannel::<8>::new();
        let sender = channel.sender();
        sender
            .try_send(DeviceCommand::ShowText(copy_truncated("CPE1704TKS")))
            .unwrap();
        sender
            .try_send(DeviceCommand::DefconColor(Rgb { r: 0, g: 0, b: 255 }))
            .unwrap();
        sender.try_send(DeviceCommand::DefconBrightness(100)).unwrap();

        let mut processor = CommandProcessor::new(channel.receiver());
        processor.process_pending(&mut device, Instant::from_millis(0));

        assert_eq!(device.target().text(), "CPE1704TKS  ");
        assert_eq!(device.defcon_color(), Rgb { r: 0, g: 0, b: 255 });
        assert_eq!(device.defcon_brightness(), 100);
        assert_eq!(device.target().pixel_brightness(), 255);
        assert!(channel.is_empty());
    }
}
