#[cfg(test)]
mod tests {

    use std::time::Duration;
    use crate::core::PlayerConfig;
    use crate::pipeline::SeekMode;

    #[test]
    fn test_player_config_default() {
        let config = PlayerConfig::default();
        assert_eq!(config.tick_interval_ms, 300);
        assert_eq!(config.default_volume, 50);
        assert!(!config.start_muted);
        assert_eq!(config.seek_mode, SeekMode::KeyUnit);
        assert!(config.show_stream_info);
        assert_eq!(config.tick_interval(), Duration::from_millis(300));
    }

    #[test]
    fn test_player_config_serialization() {
        let mut config = PlayerConfig::default();
        config.default_volume = 80;
        config.start_muted = true;
        config.seek_mode = SeekMode::Accurate;

        let serialized = serde_json::to_string(&config).expect("Failed to serialize config");
        let deserialized: PlayerConfig = serde_json::from_str(&serialized).expect("Failed to deserialize config");

        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_config_backward_compatibility() {
        // Older files only carried the tick interval
        let old_config_json = r#"{ "tick_interval_ms": 500 }"#;

        let config: PlayerConfig = serde_json::from_str(old_config_json).expect("Failed to parse old config");

        assert_eq!(config.tick_interval_ms, 500);
        assert_eq!(config.default_volume, 50);
        assert_eq!(config.seek_mode, SeekMode::KeyUnit);
    }

    #[test]
    fn test_validated_clamps_out_of_range_values() {
        let config: PlayerConfig =
            serde_json::from_str(r#"{ "tick_interval_ms": 1, "default_volume": 250 }"#)
                .expect("Failed to parse config");

        let config = config.validated();

        assert_eq!(config.default_volume, 100);
        assert_eq!(config.tick_interval_ms, PlayerConfig::MIN_TICK_INTERVAL_MS);
    }

    #[test]
    fn test_load_creates_default_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("multi-player").join("config.json");

        let config = PlayerConfig::load_from(&path).expect("load");

        assert_eq!(config, PlayerConfig::default());
        assert!(path.exists());
    }

    #[test]
    fn test_save_then_load_keeps_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        let mut config = PlayerConfig::default();
        config.tick_interval_ms = 100;
        config.show_stream_info = false;

        config.save_to(&path).expect("save");
        let loaded = PlayerConfig::load_from(&path).expect("load");

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").expect("write");

        let config = PlayerConfig::load_from(&path).expect("load");

        assert_eq!(config, PlayerConfig::default());
    }
}
