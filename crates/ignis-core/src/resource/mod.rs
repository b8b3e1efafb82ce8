//! Resource materialization
//!
//! A source resource names its contents in one of three ways: a remote
//! `source` URL, an `inline` string, or a `local` file under the files
//! directory. Inline and local bodies are embedded in the target as data URLs,
//! gzipped when that is shorter and the caller has not pinned a compression.
//!
//! Copyright (c) 2025 Ignis Team
//! Licensed under the Apache-2.0 license

pub mod data_url;
pub mod tree;

pub use tree::translate_trees;

use crate::base::schema::Resource;
use crate::error::ConfigError;
use crate::options::TranslateOptions;
use crate::path::Path;
use crate::translation::{Translated, TranslationSet};
use crate::util::files_dir::read_local;
use serde_json::{json, Map, Value};
use tracing::debug;

/// Translate the source resource at `from` into a target resource at `to`
///
/// Failures to read or render a body are reported at the offending field and
/// leave the resource out of the target.
pub fn translate_resource(
    value: &Value,
    from: &Path,
    to: &Path,
    options: &TranslateOptions,
) -> Translated<Option<Value>> {
    let mut result = Translated::new(None);
    let resource: Resource = match serde_json::from_value(value.clone()) {
        Ok(resource) => resource,
        Err(err) => {
            result
                .report
                .add_error(from.clone(), ConfigError::Unmarshal(err.to_string()));
            return result;
        }
    };

    let mut out = Map::new();
    let body = if let Some(source) = &resource.source {
        out.insert("source".into(), json!(source));
        result
            .translations
            .add(from.append("source"), to.append("source"));
        None
    } else if let Some(inline) = &resource.inline {
        let name = from.append("inline").to_string();
        Some(("inline", render(options, &name, inline.as_bytes().to_vec())))
    } else if let Some(local) = &resource.local {
        let body = read_local(options.files_dir.as_deref(), local)
            .and_then(|data| render(options, local, data));
        Some(("local", body))
    } else {
        None
    };

    match body {
        Some((field, Ok(data))) => {
            let field_path = from.append(field);
            let embedded = embed(
                &resource,
                &data,
                &field_path,
                from,
                to,
                options,
                &mut out,
                &mut result.translations,
            );
            if let Err(err) = embedded {
                result.report.add_error(field_path, err);
                return result;
            }
        }
        Some((field, Err(err))) => {
            result.report.add_error(from.append(field), err);
            return result;
        }
        None => {
            if let Some(compression) = &resource.compression {
                out.insert("compression".into(), json!(compression));
                result
                    .translations
                    .add(from.append("compression"), to.append("compression"));
            }
        }
    }

    if !resource.http_headers.is_empty() {
        let headers_from = from.append("http_headers");
        let headers_to = to.append("httpHeaders");
        let mut headers = Vec::with_capacity(resource.http_headers.len());
        for (i, header) in resource.http_headers.iter().enumerate() {
            let mut entry = Map::new();
            entry.insert("name".into(), json!(header.name));
            result.translations.add(
                headers_from.append(i).append("name"),
                headers_to.append(i).append("name"),
            );
            if let Some(value) = &header.value {
                entry.insert("value".into(), json!(value));
                result.translations.add(
                    headers_from.append(i).append("value"),
                    headers_to.append(i).append("value"),
                );
            }
            result
                .translations
                .add(headers_from.append(i), headers_to.append(i));
            headers.push(Value::Object(entry));
        }
        result.translations.add(headers_from, headers_to);
        out.insert("httpHeaders".into(), Value::Array(headers));
    }

    if let Some(hash) = &resource.verification.hash {
        out.insert("verification".into(), json!({ "hash": hash }));
        let verification_from = from.append("verification");
        let verification_to = to.append("verification");
        result
            .translations
            .add(verification_from.append("hash"), verification_to.append("hash"));
        result.translations.add(verification_from, verification_to);
    }

    if !out.is_empty() {
        if !to.is_empty() {
            result.translations.add(from.clone(), to.clone());
        }
        result.value = Some(Value::Object(out));
    }
    result
}

/// Embed `data` as the resource's `source`, choosing the compression
#[allow(clippy::too_many_arguments)]
fn embed(
    resource: &Resource,
    data: &[u8],
    field_path: &Path,
    from: &Path,
    to: &Path,
    options: &TranslateOptions,
    out: &mut Map<String, Value>,
    translations: &mut TranslationSet,
) -> Result<(), ConfigError> {
    let io = |err: std::io::Error| ConfigError::Io(err.to_string());
    let url = match resource.compression.as_deref() {
        None => {
            let encoded = data_url::encode(data, !options.no_resource_auto_compression).map_err(io)?;
            if encoded.gzipped {
                debug!(path = %field_path, "compressed resource contents");
                out.insert("compression".into(), json!("gzip"));
                translations.add(field_path.clone(), to.append("compression"));
            }
            encoded.url
        }
        Some(pinned) => {
            out.insert("compression".into(), json!(pinned));
            translations.add(from.append("compression"), to.append("compression"));
            if pinned == "gzip" {
                data_url::make_gzip_data_url(data).map_err(io)?
            } else {
                data_url::make_data_url(data)
            }
        }
    };
    out.insert("source".into(), json!(url));
    translations.add(field_path.clone(), to.append("source"));
    Ok(())
}

/// Apply the configured renderer to a UTF-8 body
pub(crate) fn render(
    options: &TranslateOptions,
    name: &str,
    data: Vec<u8>,
) -> Result<Vec<u8>, ConfigError> {
    let Some(renderer) = &options.renderer else {
        return Ok(data);
    };
    match String::from_utf8(data) {
        Ok(text) => renderer
            .render(name, &text)
            .map(String::into_bytes)
            .map_err(|detail| ConfigError::Template {
                name: name.to_string(),
                detail,
            }),
        Err(err) => Ok(err.into_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TemplateRenderer;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn translate(value: Value, options: &TranslateOptions) -> Translated<Option<Value>> {
        translate_resource(
            &value,
            &Path::source("storage.files.0.contents"),
            &Path::target("storage.files.0.contents"),
            options,
        )
    }

    #[test]
    fn test_short_inline_is_not_compressed() {
        let result = translate(json!({"inline": "xyzzy"}), &TranslateOptions::default());
        assert_eq!(result.value, Some(json!({"source": "data:,xyzzy"})));
        assert_eq!(
            result
                .translations
                .lookup(&Path::target("storage.files.0.contents.source"))
                .unwrap()
                .from,
            Path::source("storage.files.0.contents.inline")
        );
        assert!(result.report.is_empty());
    }

    #[test]
    fn test_long_inline_is_gzipped() {
        let body = "hello world ".repeat(13);
        let result = translate(json!({ "inline": body }), &TranslateOptions::default());
        let value = result.value.unwrap();
        assert_eq!(value["compression"], json!("gzip"));
        assert!(value["source"].as_str().unwrap().starts_with("data:;base64,"));
        for target in ["source", "compression"] {
            assert_eq!(
                result
                    .translations
                    .lookup(&Path::target("storage.files.0.contents").append(target))
                    .unwrap()
                    .from,
                Path::source("storage.files.0.contents.inline")
            );
        }
    }

    #[test]
    fn test_auto_compression_disabled() {
        let options = TranslateOptions {
            no_resource_auto_compression: true,
            ..Default::default()
        };
        let result = translate(json!({"inline": "a".repeat(200)}), &options);
        let value = result.value.unwrap();
        assert!(value.get("compression").is_none());
        assert!(value["source"].as_str().unwrap().starts_with("data:,aaaa"));
    }

    #[test]
    fn test_pinned_compression() {
        let gz = translate(
            json!({"inline": "x", "compression": "gzip"}),
            &TranslateOptions::default(),
        );
        let value = gz.value.unwrap();
        assert_eq!(value["compression"], json!("gzip"));
        assert!(value["source"].as_str().unwrap().starts_with("data:;base64,H4sI"));

        let other = translate(
            json!({"inline": "x", "compression": "xz"}),
            &TranslateOptions::default(),
        );
        assert_eq!(
            other.value,
            Some(json!({"compression": "xz", "source": "data:,x"}))
        );
    }

    #[test]
    fn test_remote_source_with_headers_and_hash() {
        let result = translate(
            json!({
                "source": "https://example.com/motd",
                "http_headers": [{"name": "Authorization", "value": "Bearer x"}],
                "verification": {"hash": "sha512-abc"}
            }),
            &TranslateOptions::default(),
        );
        let value = result.value.unwrap();
        assert_eq!(
            value,
            json!({
                "source": "https://example.com/motd",
                "httpHeaders": [{"name": "Authorization", "value": "Bearer x"}],
                "verification": {"hash": "sha512-abc"}
            })
        );
        assert_eq!(
            result
                .translations
                .lookup(&Path::target("storage.files.0.contents.httpHeaders.0.value"))
                .unwrap()
                .from,
            Path::source("storage.files.0.contents.http_headers.0.value")
        );
    }

    #[test]
    fn test_local_escape_is_reported() {
        let dir = TempDir::new().unwrap();
        let options = TranslateOptions::default().with_files_dir(dir.path());
        let result = translate(json!({"local": "../secret"}), &options);
        assert_eq!(result.value, None);
        let entries: Vec<_> = result.report.iter().collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, ConfigError::FilesDirEscape.to_string());
        assert_eq!(entries[0].path, Path::source("storage.files.0.contents.local"));
    }

    #[test]
    fn test_local_binary_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("blob"), [0xff, 0xfe, 0x00]).unwrap();
        let options = TranslateOptions::default().with_files_dir(dir.path());
        let result = translate(json!({"local": "blob"}), &options);
        assert_eq!(result.value, Some(json!({"source": "data:;base64,//4A"})));
    }

    struct Shout;

    impl TemplateRenderer for Shout {
        fn render(&self, name: &str, body: &str) -> Result<String, String> {
            if body.contains("fail") {
                return Err(format!("cannot render {}", name));
            }
            Ok(body.to_uppercase())
        }
    }

    #[test]
    fn test_renderer_applies_to_inline() {
        let options = TranslateOptions::default().with_renderer(Arc::new(Shout));
        let result = translate(json!({"inline": "abc"}), &options);
        assert_eq!(result.value, Some(json!({"source": "data:,ABC"})));

        let failed = translate(json!({"inline": "fail"}), &options);
        assert_eq!(failed.value, None);
        assert!(failed.report.is_fatal());
    }

    #[test]
    fn test_identity_renderer_keeps_body() {
        let options = TranslateOptions::default().with_renderer(Arc::new(crate::options::IdentityRenderer));
        let result = translate(json!({"inline": "fail"}), &options);
        assert_eq!(result.value, Some(json!({"source": "data:,fail"})));
        assert!(result.report.is_empty());
    }
}
