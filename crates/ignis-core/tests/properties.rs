//! Properties that hold for every translation

mod test_support;

use ignis_core::path::{Path, Schema};
use ignis_core::util::check_for_decimal_mode;
use ignis_core::{ConfigError, Document, TranslateOptions};
use proptest::prelude::*;
use test_support::*;

const RICH_CONFIG: &str = "\
variant: fcos
version: 1.5.0
passwd:
  users:
    - name: core
      ssh_authorized_keys:
        - ssh-ed25519 AAAA core@example
storage:
  disks:
    - device: /dev/vdb
      wipe_table: true
      partitions:
        - label: data
          size_mib: 2048
  filesystems:
    - device: /dev/disk/by-partlabel/data
      format: xfs
      path: /var/data
      with_mount_unit: true
  files:
    - path: /etc/hostname
      mode: 0644
      contents:
        inline: node1
    - path: /etc/motd
      append:
        - inline: welcome
  directories:
    - path: /var/lib/app
      mode: 0750
  links:
    - path: /etc/localtime
      target: /usr/share/zoneinfo/UTC
systemd:
  units:
    - name: app.service
      enabled: true
      contents: |
        [Service]
        ExecStart=/usr/bin/true
      dropins:
        - name: debug.conf
          contents: |
            [Service]
            Environment=DEBUG=1
kernel_arguments:
  should_exist:
    - quiet
extensions:
  - name: usbguard
boot_device:
  luks:
    tpm2: true
";

#[test]
fn every_target_node_is_traced() {
    let translated = translate_fcos(RICH_CONFIG, &TranslateOptions::default());
    assert!(translated.report.is_empty(), "{}", translated.report);
    let document = translated.value.as_ref().unwrap();
    let value = document.to_value().unwrap();
    if let Err(missing) = translated.translations.debug_verify_coverage(&value) {
        panic!("untraced target paths: {:?}", missing);
    }
    assert!(translated
        .translations
        .iter()
        .all(|t| t.from.schema == Schema::Source && t.to.schema == Schema::Target));
}

#[test]
fn output_is_deterministic() {
    let first = transpile(RICH_CONFIG).unwrap();
    for _ in 0..3 {
        let again = transpile(RICH_CONFIG).unwrap();
        assert_eq!(again.output, first.output);
        assert_eq!(again.report, first.report);
    }
}

#[test]
fn rich_config_passes_target_validation() {
    let translated = translate_fcos(RICH_CONFIG, &TranslateOptions::default());
    let Some(document @ Document::Ignition(_)) = &translated.value else {
        panic!("expected an ignition config");
    };
    assert!(document.validate().is_empty());
}

#[test]
fn tree_output_is_sorted_and_traced() {
    let dir = files_dir(&[("tree/b.conf", "b"), ("tree/a.conf", "a"), ("tree/sub/c", "c")]);
    let yaml = "variant: fcos\nversion: 1.5.0\nstorage:\n  trees:\n    - local: tree\n      path: /etc/app\n";
    let output = output_json(&transpile_in(yaml, &dir).unwrap());
    let paths: Vec<&str> = output["storage"]["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["/etc/app/a.conf", "/etc/app/b.conf", "/etc/app/sub/c"]);
}

#[cfg(unix)]
#[test]
fn symlink_out_of_files_dir_is_rejected() {
    let outside = files_dir(&[("secret", "hunter2")]);
    let dir = files_dir(&[]);
    std::os::unix::fs::symlink(outside.path().join("secret"), dir.path().join("link")).unwrap();
    let yaml = "variant: fcos\nversion: 1.5.0\nstorage:\n  files:\n    - path: /etc/secret\n      contents:\n        local: link\n";
    let err = transpile_in(yaml, &dir).unwrap_err();
    let entry = err.report().unwrap().iter().next().unwrap().clone();
    assert_eq!(entry.message, ConfigError::FilesDirEscape.to_string());
    assert_eq!(entry.path, Path::source("storage.files.0.contents.local"));
}

// (mode as parsed from YAML, warns on a file, warns on a directory)
const DECIMAL_MODE_TABLE: &[(i64, bool, bool)] = &[
    (644, true, false),
    (600, true, false),
    (640, true, false),
    (444, true, false),
    (400, true, false),
    (664, true, false),
    (660, true, false),
    (755, true, true),
    (750, true, true),
    (700, true, true),
    (775, true, true),
    (770, true, true),
    (777, true, true),
    (555, true, true),
    (500, true, true),
    (4755, true, false),
    (1777, true, true),
    // written with a leading zero
    (0o644, false, false),
    (0o600, false, false),
    (0o640, false, false),
    (0o755, false, false),
    (0o750, false, false),
    (0o700, false, false),
    (0o777, false, false),
    (0o4755, false, false),
    (0o1777, false, false),
    // not a sensible permission set either way
    (5, false, false),
    (244, false, false),
    (604, false, false),
    (648, false, false),
    (7777, false, false),
    (12345, false, false),
];

#[test]
fn decimal_mode_table() {
    for &(mode, file_warns, dir_warns) in DECIMAL_MODE_TABLE {
        assert_eq!(check_for_decimal_mode(mode, false).is_err(), file_warns, "file mode {}", mode);
        assert_eq!(check_for_decimal_mode(mode, true).is_err(), dir_warns, "directory mode {}", mode);
    }
}

proptest! {
    #[test]
    fn modes_with_digits_8_or_9_never_warn(mode in 8i64..100_000, is_dir in any::<bool>()) {
        prop_assume!(mode.to_string().bytes().any(|b| b == b'8' || b == b'9'));
        prop_assert!(check_for_decimal_mode(mode, is_dir).is_ok());
    }

    #[test]
    fn modes_above_four_octal_digits_never_warn(mode in 10_000i64..1_000_000, is_dir in any::<bool>()) {
        prop_assert!(check_for_decimal_mode(mode, is_dir).is_ok());
    }

    #[test]
    fn exactly_one_error_for_competing_sources(
        source in any::<bool>(),
        inline in any::<bool>(),
        local in any::<bool>(),
    ) {
        let dir = files_dir(&[("f", "local")]);
        let mut contents = String::new();
        if source {
            contents.push_str("        source: https://example.com/f\n");
        }
        if inline {
            contents.push_str("        inline: inline\n");
        }
        if local {
            contents.push_str("        local: f\n");
        }
        let yaml = format!(
            "variant: fcos\nversion: 1.5.0\nstorage:\n  files:\n    - path: /etc/f\n      contents:\n{}",
            if contents.is_empty() { "        {}\n".to_string() } else { contents }
        );
        let count = [source, inline, local].iter().filter(|set| **set).count();
        let errors = match transpile_in(&yaml, &dir) {
            Ok(transpiled) => transpiled.report,
            Err(err) => err.report().cloned().unwrap_or_default(),
        };
        let conflicts: Vec<_> = errors
            .iter()
            .filter(|e| e.message == ConfigError::TooManyResourceSources.to_string())
            .collect();
        prop_assert_eq!(conflicts.len(), usize::from(count > 1));
        if let Some(entry) = conflicts.first() {
            let second = if source && inline { "inline" } else { "local" };
            prop_assert_eq!(
                &entry.path,
                &Path::source("storage.files.0.contents").append(second)
            );
        }
    }
}
