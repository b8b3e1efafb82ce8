//! FIPS cipher selection for LUKS volumes
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

use crate::path::Path;
use crate::translation::TranslationSet;
use serde_json::{json, Value};

pub const FIPS_CIPHER: &str = "aes-cbc-essiv:sha256";

fn has_cipher(options: &[Value]) -> bool {
    options.iter().filter_map(Value::as_str).any(|option| {
        option == "--cipher" || option == "-c" || option.starts_with("--cipher=")
    })
}

/// Append `--cipher aes-cbc-essiv:sha256` to every LUKS volume in `config`
/// that does not already choose a cipher
///
/// `config` is an Ignition document whose paths sit below `to_prefix` in the
/// translation set; new options are traced to `from`. Applying this twice
/// changes nothing the second time.
pub fn apply_fips_ciphers(config: &mut Value, translations: &mut TranslationSet, from: &Path, to_prefix: &Path) {
    let Some(volumes) = config
        .get_mut("storage")
        .and_then(|storage| storage.get_mut("luks"))
        .and_then(Value::as_array_mut)
    else {
        return;
    };
    for (i, volume) in volumes.iter_mut().enumerate() {
        let Value::Object(volume) = volume else {
            continue;
        };
        let options_to = to_prefix
            .join(&Path::target("storage.luks"))
            .append(i)
            .append("options");
        let options = volume.entry("options").or_insert_with(|| json!([]));
        let Some(options) = options.as_array_mut() else {
            continue;
        };
        if has_cipher(options) {
            continue;
        }
        if options.is_empty() {
            translations.add(from.clone(), options_to.clone());
        }
        for option in ["--cipher", FIPS_CIPHER] {
            translations.add(from.clone(), options_to.append(options.len()));
            options.push(json!(option));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Schema;
    use pretty_assertions::assert_eq;

    fn config() -> Value {
        json!({"storage": {"luks": [
            {"name": "root"},
            {"name": "data", "options": ["--cipher=aes-xts-plain64"]},
            {"name": "scratch", "options": ["--type", "luks2"]},
            {"name": "short", "options": ["-c", "aes-xts-plain64"]}
        ]}})
    }

    #[test]
    fn test_ciphers_added_once() {
        let mut value = config();
        let mut ts = TranslationSet::default();
        let from = Path::source("openshift.fips");
        let root = Path::root(Schema::Target);
        apply_fips_ciphers(&mut value, &mut ts, &from, &root);
        let luks = value["storage"]["luks"].as_array().unwrap();
        assert_eq!(luks[0]["options"], json!(["--cipher", FIPS_CIPHER]));
        assert_eq!(luks[1]["options"], json!(["--cipher=aes-xts-plain64"]));
        assert_eq!(luks[2]["options"], json!(["--type", "luks2", "--cipher", FIPS_CIPHER]));
        assert_eq!(luks[3]["options"], json!(["-c", "aes-xts-plain64"]));
        assert_eq!(
            ts.lookup(&Path::target("storage.luks.2.options.3")).unwrap().from,
            from
        );
        assert!(ts.lookup(&Path::target("storage.luks.0.options")).is_some());

        let once = value.clone();
        apply_fips_ciphers(&mut value, &mut ts, &from, &root);
        assert_eq!(value, once);
    }

    #[test]
    fn test_prefixed_paths() {
        let mut value = config();
        let mut ts = TranslationSet::default();
        apply_fips_ciphers(
            &mut value,
            &mut ts,
            &Path::source("openshift.fips"),
            &Path::target("spec.config"),
        );
        assert!(ts
            .lookup(&Path::target("spec.config.storage.luks.0.options.1"))
            .is_some());
    }
}
