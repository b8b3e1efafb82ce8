//! Property-based tests for target validation
//!
//! These tests verify that validator rules hold across a wide range of
//! generated paths and modes.

use ignis_schemas::ignition::{Config, Directory, File};
use ignis_schemas::validate;
use proptest::prelude::*;

fn config_with_file(path: String, mode: i64) -> Config {
    let mut config = Config::default();
    config.ignition.version = "3.4.0".to_string();
    config.storage.files.push(File {
        path,
        mode: Some(mode),
        ..Default::default()
    });
    config
}

proptest! {
    #[test]
    fn prop_absolute_paths_with_legal_modes_are_valid(
        path in "(/[a-z0-9_.-]{1,12}){1,5}",
        mode in 0i64..=0o7777,
    ) {
        let config = config_with_file(path, mode);
        prop_assert!(validate(&config).is_empty());
    }

    #[test]
    fn prop_relative_paths_are_rejected(path in "[a-z0-9_.-]{1,12}(/[a-z0-9_.-]{1,12}){0,4}") {
        let config = config_with_file(path, 0o644);
        let errors = validate(&config);
        prop_assert!(errors.has_errors());
        prop_assert!(errors.iter().any(|e| e.message == "path not absolute"));
    }

    #[test]
    fn prop_modes_above_07777_are_rejected(mode in 0o10000i64..0o777777) {
        let mut config = Config::default();
        config.ignition.version = "3.4.0".to_string();
        config.storage.directories.push(Directory {
            path: "/var/d".to_string(),
            mode: Some(mode),
            ..Default::default()
        });
        prop_assert!(validate(&config).iter().any(|e| e.message == "illegal file mode"));
    }

    #[test]
    fn prop_duplicate_paths_reported_once_per_extra(count in 2usize..6) {
        let mut config = Config::default();
        config.ignition.version = "3.4.0".to_string();
        for _ in 0..count {
            config.storage.files.push(File {
                path: "/etc/same".to_string(),
                ..Default::default()
            });
        }
        let duplicates = validate(&config)
            .iter()
            .filter(|e| e.message == "duplicate entry defined")
            .count();
        prop_assert_eq!(duplicates, count - 1);
    }
}
