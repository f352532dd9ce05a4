//! JSON rule file loading.
//!
//! The rule file is either a bare array of rules or an object with a `quirks` array:
//!
//! ```json
//! [
//!   {
//!     "vendor": "8086", "device": "ffff", "subvendor": "ffff", "subdevice": "ffff",
//!     "fields": [ { "reg": "3c", "size": "1", "mask": "ff" } ]
//!   }
//! ]
//! ```
//!
//! Identity patterns and register/mask values are hex strings (an optional `0x` prefix is
//! accepted); `"ffff"` is the wildcard. `size` must be a single decimal digit. A rule that does not
//! fit this shape is skipped with a warning so one bad entry does not discard the whole file.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{QuirkError, Result};
use crate::rules::{parse_hex_u16, parse_hex_u32, FieldOverride, IdPattern, QuirkRule};

#[derive(Debug, Deserialize)]
struct RawRule {
    vendor: String,
    device: String,
    subvendor: String,
    subdevice: String,
    #[serde(default)]
    fields: Vec<RawField>,
}

#[derive(Debug, Deserialize)]
struct RawField {
    reg: String,
    size: String,
    mask: String,
}

pub fn load_rules(path: &Path) -> Result<Vec<QuirkRule>> {
    let bytes = fs::read(path).map_err(|e| QuirkError::io(path, e))?;
    parse_rules(&bytes).map_err(|source| QuirkError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a rule document, dropping (and logging) individual rules that are malformed.
pub fn parse_rules(bytes: &[u8]) -> std::result::Result<Vec<QuirkRule>, serde_json::Error> {
    // Be tolerant of UTF-8 BOMs produced by some editors/tools.
    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    let entries = match serde_json::from_slice::<Value>(bytes)? {
        Value::Array(entries) => entries,
        Value::Object(mut obj) => match obj.remove("quirks") {
            Some(Value::Array(entries)) => entries,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };

    let mut rules = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        match parse_rule(index, entry) {
            Ok(rule) => rules.push(rule),
            Err(err) => tracing::warn!("skipping {err}"),
        }
    }
    Ok(rules)
}

fn parse_rule(index: usize, entry: Value) -> Result<QuirkRule> {
    let invalid = |reason: String| QuirkError::InvalidRule { index, reason };

    let raw: RawRule = serde_json::from_value(entry).map_err(|e| invalid(e.to_string()))?;

    let pattern = |name: &str, text: &str| -> Result<IdPattern> {
        parse_hex_u16(text)
            .map(IdPattern::from)
            .ok_or_else(|| invalid(format!("{name} {text:?} is not a 16-bit hex value")))
    };

    let vendor = pattern("vendor", &raw.vendor)?;
    let device = pattern("device", &raw.device)?;
    let subvendor = pattern("subvendor", &raw.subvendor)?;
    let subdevice = pattern("subdevice", &raw.subdevice)?;

    let fields = raw
        .fields
        .iter()
        .enumerate()
        .map(|(n, field)| {
            parse_field(field).map_err(|reason| invalid(format!("field #{n}: {reason}")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(QuirkRule {
        vendor,
        device,
        subvendor,
        subdevice,
        fields,
    })
}

fn parse_field(field: &RawField) -> std::result::Result<FieldOverride, String> {
    let register = parse_hex_u32(&field.reg)
        .ok_or_else(|| format!("reg {:?} is not a 32-bit hex value", field.reg))?;
    let mask = parse_hex_u32(&field.mask)
        .ok_or_else(|| format!("mask {:?} is not a 32-bit hex value", field.mask))?;
    let size = match field.size.as_bytes() {
        [digit @ b'0'..=b'9'] => digit - b'0',
        _ => return Err(format!("size {:?} is not a single digit", field.size)),
    };
    Ok(FieldOverride {
        register,
        size,
        mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_array() {
        let rules = parse_rules(
            br#"[
                {
                    "vendor": "8086", "device": "ffff", "subvendor": "FFFF", "subdevice": "0x0001",
                    "fields": [
                        { "reg": "10", "size": "4", "mask": "ffffffff" },
                        { "reg": "0x3c", "size": "1", "mask": "ff" }
                    ]
                }
            ]"#,
        )
        .unwrap();

        assert_eq!(
            rules,
            vec![QuirkRule {
                vendor: IdPattern::Exact(0x8086),
                device: IdPattern::Any,
                subvendor: IdPattern::Any,
                subdevice: IdPattern::Exact(1),
                fields: vec![
                    FieldOverride {
                        register: 0x10,
                        size: 4,
                        mask: 0xffff_ffff,
                    },
                    FieldOverride {
                        register: 0x3c,
                        size: 1,
                        mask: 0xff,
                    },
                ],
            }]
        );
    }

    #[test]
    fn parses_quirks_object_with_bom() {
        let mut doc = b"\xef\xbb\xbf".to_vec();
        doc.extend_from_slice(
            br#"{"quirks": [
                {"vendor": "ffff", "device": "ffff", "subvendor": "ffff", "subdevice": "ffff"}
            ]}"#,
        );
        let rules = parse_rules(&doc).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].fields.is_empty());
    }

    #[test]
    fn skips_malformed_rules_and_keeps_order() {
        let rules = parse_rules(
            br#"[
                {"vendor": "1000", "device": "ffff", "subvendor": "ffff", "subdevice": "ffff"},
                {"vendor": "10000", "device": "ffff", "subvendor": "ffff", "subdevice": "ffff"},
                {"vendor": "ffff", "device": "ffff", "subvendor": "ffff"},
                {"vendor": "ffff", "device": "ffff", "subvendor": "ffff", "subdevice": "ffff",
                 "fields": [{"reg": "10", "size": "12", "mask": "ff"}]},
                {"vendor": "ffff", "device": "ffff", "subvendor": "ffff", "subdevice": "ffff",
                 "fields": [{"reg": "zz", "size": "1", "mask": "ff"}]},
                {"vendor": "2000", "device": "ffff", "subvendor": "ffff", "subdevice": "ffff"}
            ]"#,
        )
        .unwrap();

        let vendors: Vec<_> = rules.iter().map(|r| r.vendor).collect();
        assert_eq!(vendors, [IdPattern::Exact(0x1000), IdPattern::Exact(0x2000)]);
    }

    #[test]
    fn out_of_range_digit_size_is_left_to_the_writer() {
        let rules = parse_rules(
            br#"[{"vendor": "ffff", "device": "ffff", "subvendor": "ffff", "subdevice": "ffff",
                  "fields": [{"reg": "10", "size": "7", "mask": "ff"}]}]"#,
        )
        .unwrap();
        assert_eq!(rules[0].fields[0].size, 7);
    }

    #[test]
    fn unexpected_document_shapes_yield_no_rules() {
        assert!(parse_rules(b"{}").unwrap().is_empty());
        assert!(parse_rules(b"[]").unwrap().is_empty());
        assert!(parse_rules(b"42").unwrap().is_empty());
        assert!(parse_rules(b"{\"quirks\": 1}").unwrap().is_empty());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(parse_rules(b"[{").is_err());
        assert!(parse_rules(b"").is_err());
    }

    #[test]
    fn load_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quirks.json");
        std::fs::write(&path, "not json").unwrap();
        match load_rules(&path).unwrap_err() {
            QuirkError::Json { path: p, .. } => assert_eq!(p, path),
            other => panic!("unexpected error {other}"),
        }
    }
}
