//! Boot device planning
//!
//! `boot_device` describes the root disk layout at a high level: mirroring
//! the boot disk across several devices and/or encrypting the root
//! filesystem. Planning expands it into disks, RAID arrays, a LUKS volume and
//! filesystems, which become the merge parent of the user's own storage
//! section.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::base::schema::Tang;
use crate::error::ConfigError;
use crate::path::Path;
use crate::report::Report;
use crate::translation::Translated;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

const BIOS_BOOT_GUID: &str = "21686148-6449-6E6F-744E-656564454649";
const ESP_GUID: &str = "C12A7328-F81F-11D2-BA4B-00A0C93EC93B";
const PREP_GUID: &str = "9E1A2D38-C612-4316-AA26-8B49521E5A8B";
const RESERVED_GUID: &str = "8DA63339-0007-60C0-C436-083AC8230908";

const LAYOUTS: &[&str] = &["aarch64", "ppc64le", "x86_64"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootDevice {
    pub layout: Option<String>,
    pub luks: BootDeviceLuks,
    pub mirror: BootDeviceMirror,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootDeviceLuks {
    /// Device to encrypt when not mirroring
    pub device: Option<String>,
    pub discard: Option<bool>,
    pub tang: Vec<Tang>,
    pub threshold: Option<i64>,
    pub tpm2: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootDeviceMirror {
    pub devices: Vec<String>,
}

impl BootDevice {
    pub fn wants_luks(&self) -> bool {
        self.luks.tpm2 == Some(true) || !self.luks.tang.is_empty()
    }

    pub fn wants_mirror(&self) -> bool {
        !self.mirror.devices.is_empty()
    }

    pub fn validate(&self, prefix: &Path) -> Report {
        let mut report = Report::new();
        let path = prefix.append("boot_device");
        if let Some(layout) = &self.layout {
            if !LAYOUTS.contains(&layout.as_str()) {
                report.add_error(path.append("layout"), ConfigError::UnknownBootDeviceLayout);
            }
        }
        if self.mirror.devices.len() == 1 {
            report.add_error(
                path.append("mirror").append("devices"),
                ConfigError::TooFewMirrorDevices,
            );
        }
        report
    }
}

/// A storage fragment plus where each of its parts came from
struct Plan {
    value: Map<String, Value>,
    translated: Translated<Value>,
}

impl Plan {
    fn new() -> Self {
        Self {
            value: Map::new(),
            translated: Translated::new(Value::Null),
        }
    }

    /// Append `entry` to `storage.<kind>`, tracing it and any new container
    /// back to `from`
    fn push(&mut self, kind: &str, entry: Value, from: &Path) {
        let storage = self
            .value
            .entry("storage")
            .or_insert_with(|| json!({}));
        let Some(storage) = storage.as_object_mut() else {
            return;
        };
        let list = storage.entry(kind).or_insert_with(|| json!([]));
        let Some(list) = list.as_array_mut() else {
            return;
        };
        let list_to = Path::target("storage").append(kind);
        let ts = &mut self.translated.translations;
        if ts.lookup(&Path::target("storage")).is_none() {
            ts.add(from.clone(), Path::target("storage"));
        }
        if ts.lookup(&list_to).is_none() {
            ts.add(from.clone(), list_to.clone());
        }
        ts.add_from_common_source(from, &list_to.append(list.len()), &entry);
        list.push(entry);
    }

    fn finish(mut self) -> Translated<Value> {
        self.translated.value = Value::Object(self.value);
        self.translated
    }
}

/// Expand `boot_device` into storage entries
///
/// Returns an empty object when neither mirroring nor encryption is
/// requested.
pub fn plan_boot_device(boot_device: &BootDevice, prefix: &Path) -> Translated<Value> {
    let mut plan = Plan::new();
    let wants_luks = boot_device.wants_luks();
    let wants_mirror = boot_device.wants_mirror();
    if !wants_luks && !wants_mirror {
        return plan.finish();
    }

    let layout = boot_device.layout.as_deref().unwrap_or("x86_64");
    let mirror_path = prefix.append("boot_device").append("mirror");
    let luks_path = prefix.append("boot_device").append("luks");
    let has_esp = layout != "ppc64le";

    if wants_mirror {
        for (i, device) in boot_device.mirror.devices.iter().enumerate() {
            let n = i + 1;
            let mut partitions = Vec::new();
            match layout {
                "aarch64" => {
                    partitions.push(partition(&format!("reserved-{}", n), Some(1), Some(RESERVED_GUID)));
                    partitions.push(partition(&format!("esp-{}", n), Some(127), Some(ESP_GUID)));
                }
                "ppc64le" => {
                    partitions.push(partition(&format!("prep-{}", n), Some(4), Some(PREP_GUID)));
                    partitions.push(partition(&format!("reserved-{}", n), Some(1), Some(RESERVED_GUID)));
                }
                _ => {
                    partitions.push(partition(&format!("bios-{}", n), Some(1), Some(BIOS_BOOT_GUID)));
                    partitions.push(partition(&format!("esp-{}", n), Some(127), Some(ESP_GUID)));
                }
            }
            partitions.push(partition(&format!("boot-{}", n), Some(384), None));
            partitions.push(partition(&format!("root-{}", n), None, None));
            plan.push(
                "disks",
                json!({"device": device, "partitions": partitions, "wipeTable": true}),
                &mirror_path,
            );
        }

        let count = boot_device.mirror.devices.len();
        let members = |role: &str| -> Vec<String> {
            (1..=count)
                .map(|n| format!("/dev/disk/by-partlabel/{}-{}", role, n))
                .collect()
        };
        if has_esp {
            plan.push(
                "raid",
                json!({"name": "md-esp", "level": "raid1", "devices": members("esp"), "options": ["--metadata=1.0"]}),
                &mirror_path,
            );
        }
        plan.push(
            "raid",
            json!({"name": "md-boot", "level": "raid1", "devices": members("boot"), "options": ["--metadata=1.0"]}),
            &mirror_path,
        );
        plan.push(
            "raid",
            json!({"name": "md-root", "level": "raid1", "devices": members("root")}),
            &mirror_path,
        );
    }

    if wants_luks {
        let device = if wants_mirror {
            "/dev/md/md-root".to_string()
        } else {
            boot_device
                .luks
                .device
                .clone()
                .unwrap_or_else(|| "/dev/disk/by-partlabel/root".to_string())
        };
        let mut clevis = Map::new();
        if !boot_device.luks.tang.is_empty() {
            let tang: Vec<Value> = boot_device
                .luks
                .tang
                .iter()
                .map(|t| {
                    let mut entry = Map::new();
                    entry.insert("url".into(), json!(t.url));
                    if let Some(thumbprint) = &t.thumbprint {
                        entry.insert("thumbprint".into(), json!(thumbprint));
                    }
                    if let Some(advertisement) = &t.advertisement {
                        entry.insert("advertisement".into(), json!(advertisement));
                    }
                    Value::Object(entry)
                })
                .collect();
            clevis.insert("tang".into(), Value::Array(tang));
        }
        if let Some(threshold) = boot_device.luks.threshold {
            clevis.insert("threshold".into(), json!(threshold));
        }
        if let Some(tpm2) = boot_device.luks.tpm2 {
            clevis.insert("tpm2".into(), json!(tpm2));
        }
        let mut luks = json!({
            "name": "root",
            "label": "luks-root",
            "device": device,
            "clevis": Value::Object(clevis),
            "wipeVolume": true,
        });
        if let (Some(discard), Value::Object(map)) = (boot_device.luks.discard, &mut luks) {
            map.insert("discard".into(), json!(discard));
        }
        plan.push("luks", luks, &luks_path);
    }

    if wants_mirror {
        if has_esp {
            plan.push(
                "filesystems",
                json!({"device": "/dev/md/md-esp", "format": "vfat", "label": "EFI-SYSTEM", "wipeFilesystem": true}),
                &mirror_path,
            );
        }
        plan.push(
            "filesystems",
            json!({"device": "/dev/md/md-boot", "format": "ext4", "label": "boot", "wipeFilesystem": true}),
            &mirror_path,
        );
    }
    let (root_device, root_from) = if wants_luks {
        ("/dev/mapper/root", &luks_path)
    } else {
        ("/dev/md/md-root", &mirror_path)
    };
    plan.push(
        "filesystems",
        json!({"device": root_device, "format": "xfs", "label": "root", "wipeFilesystem": true}),
        root_from,
    );
    plan.finish()
}

fn partition(label: &str, size_mib: Option<i64>, type_guid: Option<&str>) -> Value {
    let mut entry = Map::new();
    entry.insert("label".into(), json!(label));
    if let Some(size) = size_mib {
        entry.insert("sizeMiB".into(), json!(size));
    }
    if let Some(guid) = type_guid {
        entry.insert("typeGuid".into(), json!(guid));
    }
    Value::Object(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Schema;
    use pretty_assertions::assert_eq;

    fn root() -> Path {
        Path::root(Schema::Source)
    }

    fn mirrored(devices: &[&str]) -> BootDevice {
        BootDevice {
            mirror: BootDeviceMirror {
                devices: devices.iter().map(|d| d.to_string()).collect(),
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_validation() {
        let mut bd = mirrored(&["/dev/vda"]);
        bd.layout = Some("s390x".into());
        let report = bd.validate(&root());
        let found: Vec<(String, String)> = report
            .iter()
            .map(|e| (e.path.to_string(), e.message.clone()))
            .collect();
        assert_eq!(
            found,
            vec![
                (
                    "$.boot_device.layout".to_string(),
                    ConfigError::UnknownBootDeviceLayout.to_string()
                ),
                (
                    "$.boot_device.mirror.devices".to_string(),
                    ConfigError::TooFewMirrorDevices.to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_nothing_requested() {
        let plan = plan_boot_device(&BootDevice::default(), &root());
        assert_eq!(plan.value, json!({}));
        assert!(plan.translations.is_empty());
    }

    #[test]
    fn test_mirror_x86_64_with_luks() {
        let mut bd = mirrored(&["/dev/vda", "/dev/vdb", "/dev/vdc"]);
        bd.luks.tang.push(Tang {
            url: "https://tang.example.com".into(),
            thumbprint: Some("abc".into()),
            ..Default::default()
        });
        bd.luks.threshold = Some(1);
        bd.luks.tpm2 = Some(true);
        let plan = plan_boot_device(&bd, &root());
        let storage = &plan.value["storage"];

        let disks = storage["disks"].as_array().unwrap();
        assert_eq!(disks.len(), 3);
        assert_eq!(
            disks[2]["partitions"],
            json!([
                {"label": "bios-3", "sizeMiB": 1, "typeGuid": BIOS_BOOT_GUID},
                {"label": "esp-3", "sizeMiB": 127, "typeGuid": ESP_GUID},
                {"label": "boot-3", "sizeMiB": 384},
                {"label": "root-3"}
            ])
        );

        let raid = storage["raid"].as_array().unwrap();
        let names: Vec<&str> = raid.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["md-esp", "md-boot", "md-root"]);
        assert_eq!(raid[0]["options"], json!(["--metadata=1.0"]));
        assert!(raid[2].get("options").is_none());
        assert_eq!(
            raid[2]["devices"],
            json!([
                "/dev/disk/by-partlabel/root-1",
                "/dev/disk/by-partlabel/root-2",
                "/dev/disk/by-partlabel/root-3"
            ])
        );

        assert_eq!(
            storage["luks"],
            json!([{
                "name": "root",
                "label": "luks-root",
                "device": "/dev/md/md-root",
                "clevis": {"tang": [{"url": "https://tang.example.com", "thumbprint": "abc"}], "threshold": 1, "tpm2": true},
                "wipeVolume": true
            }])
        );

        let filesystems: Vec<(&str, &str)> = storage["filesystems"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| (f["device"].as_str().unwrap(), f["format"].as_str().unwrap()))
            .collect();
        assert_eq!(
            filesystems,
            vec![
                ("/dev/md/md-esp", "vfat"),
                ("/dev/md/md-boot", "ext4"),
                ("/dev/mapper/root", "xfs"),
            ]
        );

        let ts = &plan.translations;
        assert!(ts.debug_verify_coverage(&plan.value).is_ok());
        for translation in ts.iter() {
            assert!(
                translation.from == Path::source("boot_device.mirror")
                    || translation.from == Path::source("boot_device.luks"),
                "{}",
                translation
            );
        }
        assert_eq!(
            ts.lookup(&Path::target("storage.luks.0.clevis.tpm2")).unwrap().from,
            Path::source("boot_device.luks")
        );
    }

    #[test]
    fn test_ppc64le_has_no_esp() {
        let plan = plan_boot_device(&mirrored(&["/dev/sda", "/dev/sdb"]), &root());
        let storage = &plan.value["storage"];
        let raid: Vec<&str> = storage["raid"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["name"].as_str().unwrap())
            .collect();
        assert_eq!(raid, vec!["md-esp", "md-boot", "md-root"]);

        let mut bd = mirrored(&["/dev/sda", "/dev/sdb"]);
        bd.layout = Some("ppc64le".into());
        let plan = plan_boot_device(&bd, &root());
        let storage = &plan.value["storage"];
        assert_eq!(storage["raid"].as_array().unwrap().len(), 2);
        assert_eq!(storage["disks"][0]["partitions"][0]["label"], json!("prep-1"));
        assert_eq!(storage["filesystems"][1]["device"], json!("/dev/md/md-root"));
    }

    #[test]
    fn test_single_disk_luks() {
        let bd = BootDevice {
            luks: BootDeviceLuks {
                tpm2: Some(true),
                discard: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        let plan = plan_boot_device(&bd, &root());
        let storage = &plan.value["storage"];
        assert!(storage.get("disks").is_none());
        assert_eq!(storage["luks"][0]["device"], json!("/dev/disk/by-partlabel/root"));
        assert_eq!(storage["luks"][0]["discard"], json!(true));
        assert_eq!(storage["filesystems"][0]["device"], json!("/dev/mapper/root"));
    }
}
