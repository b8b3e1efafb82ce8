//! Common unit tests for target config validation
//!
//! These tests exercise the public `validate` entry point with complete
//! configs, checking both what is rejected and where the finding is anchored.

use ignis_schemas::ignition::*;
use ignis_schemas::{validate, validate_for_version, Severity};
use pretty_assertions::assert_eq;
use semver::Version;
use serde_json::json;

fn parse(value: serde_json::Value) -> Config {
    serde_json::from_value(value).expect("config should deserialize")
}

fn messages(config: &Config) -> Vec<String> {
    validate(config).iter().map(|e| e.to_string()).collect()
}

#[cfg(test)]
mod structure_validation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_complete_config_is_valid() {
        let config = parse(json!({
            "ignition": {"version": "3.4.0"},
            "passwd": {"users": [{"name": "core", "sshAuthorizedKeys": ["ssh-ed25519 AAAA"]}]},
            "storage": {
                "disks": [{
                    "device": "/dev/vda",
                    "wipeTable": true,
                    "partitions": [{"label": "root", "number": 4, "sizeMiB": 0}]
                }],
                "filesystems": [{"device": "/dev/disk/by-label/root", "format": "xfs", "path": "/var"}],
                "files": [{"path": "/etc/motd", "mode": 420, "contents": {"source": "data:,hello"}}],
                "directories": [{"path": "/var/lib/app", "mode": 493}],
                "links": [{"path": "/etc/localtime", "target": "/usr/share/zoneinfo/UTC"}]
            },
            "systemd": {"units": [{"name": "app.service", "enabled": true, "contents": "[Unit]\n"}]}
        }));
        assert!(validate(&config).is_empty(), "{:?}", messages(&config));
    }

    #[test]
    fn test_missing_required_names() {
        let config = parse(json!({
            "ignition": {"version": "3.4.0"},
            "passwd": {"users": [{"uid": 1000}], "groups": [{"gid": 1000}]},
            "storage": {"luks": [{"device": "/dev/sda4"}]}
        }));
        assert_eq!(
            messages(&config),
            vec![
                "error at $.passwd.users.0.name: name is required",
                "error at $.passwd.groups.0.name: name is required",
                "error at $.storage.luks.0.name: luks name is required",
            ]
        );
    }

    #[test]
    fn test_duplicate_units_and_users() {
        let config = parse(json!({
            "ignition": {"version": "3.2.0"},
            "passwd": {"users": [{"name": "core"}, {"name": "core"}]},
            "systemd": {"units": [{"name": "a.service"}, {"name": "a.service"}]}
        }));
        let found = messages(&config);
        assert!(found.contains(&"error at $.passwd.users.1.name: duplicate entry defined".to_string()));
        assert!(found.contains(&"error at $.systemd.units.1.name: duplicate entry defined".to_string()));
    }

    #[test]
    fn test_link_without_target() {
        let config = parse(json!({
            "ignition": {"version": "3.4.0"},
            "storage": {"links": [{"path": "/etc/a"}]}
        }));
        assert_eq!(
            messages(&config),
            vec!["error at $.storage.links.0.target: link target is required"]
        );
    }

    #[test]
    fn test_masked_unit_with_contents_is_warning() {
        let config = parse(json!({
            "ignition": {"version": "3.4.0"},
            "systemd": {"units": [{"name": "a.service", "mask": true, "contents": "x"}]}
        }));
        let errors = validate(&config);
        assert!(!errors.has_errors());
        assert_eq!(errors.errors[0].severity, Severity::Warning);
    }
}

#[cfg(test)]
mod value_validation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_url_schemes() {
        for (source, ok) in [
            ("https://example.com/a", true),
            ("data:,x", true),
            ("s3://bucket/key", true),
            ("gs://bucket/key", true),
            ("tftp://host/file", true),
            ("ftp://host/file", false),
            ("not a url", false),
        ] {
            let config = parse(json!({
                "ignition": {"version": "3.4.0"},
                "storage": {"files": [{"path": "/a", "contents": {"source": source}}]}
            }));
            assert_eq!(!validate(&config).has_errors(), ok, "source {}", source);
        }
    }

    #[test]
    fn test_hash_sizes() {
        let sha256 = format!("sha256-{}", "a".repeat(64));
        let sha512 = format!("sha512-{}", "b".repeat(128));
        let short = format!("sha512-{}", "b".repeat(64));
        for (hash, ok) in [(sha256, true), (sha512, true), (short, false)] {
            let config = parse(json!({
                "ignition": {"version": "3.4.0"},
                "storage": {"files": [{
                    "path": "/a",
                    "contents": {"source": "https://example.com/a", "verification": {"hash": hash}}
                }]}
            }));
            assert_eq!(!validate(&config).has_errors(), ok);
        }
    }

    #[test]
    fn test_compression_values() {
        let config = parse(json!({
            "ignition": {"version": "3.4.0"},
            "storage": {"files": [{"path": "/a", "contents": {"source": "data:,x", "compression": "xz"}}]}
        }));
        assert_eq!(
            messages(&config),
            vec!["error at $.storage.files.0.contents.compression: invalid compression method"]
        );
    }

    #[test]
    fn test_filesystem_format_and_raid_level() {
        let config = parse(json!({
            "ignition": {"version": "3.4.0"},
            "storage": {
                "filesystems": [{"device": "/dev/md/a", "format": "zfs"}],
                "raid": [{"name": "a", "level": "raid7", "devices": ["/dev/sda"]}]
            }
        }));
        assert_eq!(
            messages(&config),
            vec![
                "error at $.storage.raid.0.level: unrecognized raid level",
                "error at $.storage.filesystems.0.format: invalid filesystem format",
            ]
        );
    }

    #[test]
    fn test_partition_label_length() {
        let config = parse(json!({
            "ignition": {"version": "3.4.0"},
            "storage": {"disks": [{"device": "/dev/vda", "partitions": [{"label": "x".repeat(37)}]}]}
        }));
        assert!(validate(&config).has_errors());
    }
}

#[cfg(test)]
mod version_validation {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_tang_advertisement_requires_3_4() {
        let config = parse(json!({
            "ignition": {"version": "3.3.0"},
            "storage": {"luks": [{
                "name": "root",
                "device": "/dev/sda4",
                "clevis": {"tang": [{"url": "https://tang.example.com", "advertisement": "{}"}]}
            }]}
        }));
        assert!(validate(&config).has_errors());
        assert!(!validate_for_version(&config, &Version::new(3, 4, 0)).has_errors());
    }

    #[test]
    fn test_every_supported_version_accepts_minimal_config() {
        for version in SUPPORTED_VERSIONS {
            let config = parse(json!({"ignition": {"version": version}}));
            assert!(validate(&config).is_empty(), "version {}", version);
        }
    }
}
