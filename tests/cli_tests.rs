#[cfg(test)]
mod tests {
    use clap::Parser;
    use scorescribe::*;
    use std::path::PathBuf;

    fn mock_devices() -> Vec<String> {
        vec!["Mock Device 1".to_string(), "Mock Device 2".to_string()]
    }

    #[test]
    fn test_args_with_device_binding() {
        let args = Args::parse_from(["test", "--bind-to-device", "Mock Device 1"]);
        assert_eq!(args.bind_to_device, Some("Mock Device 1".to_string()));
        assert!(!args.device_list);
        assert_eq!(args.echo_to, None);
    }

    #[test]
    fn test_args_without_device_binding() {
        let args = Args::parse_from(["test"]);
        assert_eq!(args.bind_to_device, None);
        assert!(!args.device_list);
        assert_eq!(args.output, None);
        assert_eq!(args.config, None);
    }

    #[test]
    fn test_args_paths_and_meter() {
        let args = Args::parse_from([
            "test",
            "--config",
            "studio.toml",
            "-o",
            "take1.musicxml",
            "--beats",
            "3",
            "--beat-type",
            "8",
        ]);
        assert_eq!(args.config, Some(PathBuf::from("studio.toml")));
        assert_eq!(args.output, Some(PathBuf::from("take1.musicxml")));

        let mut settings = Settings::default();
        args.apply_to(&mut settings);
        assert_eq!(settings.beats, 3);
        assert_eq!(settings.beat_type, 8);
        assert_eq!(settings.title, Settings::default().title);
    }

    #[test]
    fn test_valid_device_binding() {
        assert!(validate_device("Device 1", &mock_devices()).is_ok());
    }

    #[test]
    fn test_invalid_device_binding() {
        let err = validate_device("Nonexistent Device", &mock_devices()).unwrap_err();
        assert!(err.contains("Nonexistent Device"));
        assert!(err.contains("  - Mock Device 2"));
    }

    #[test]
    fn test_mock_engine_device_list() {
        let engine = midi::MockMidiEngine::new(Vec::new());
        assert_eq!(midi::MidiEngine::list_devices(&engine), mock_devices());
    }
}
