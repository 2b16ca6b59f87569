//! INI settings parser
//!
//! Parses `[section]` / `key=value` text into a flattened
//! [`RawSettingsMap`], keys joined as `"section/key"`. Keys before the first
//! section header stay bare.

use crate::{RawSettingsMap, Result, SettingsValue};
use std::path::Path;

/// Text encoding for INI sources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IniEncoding {
    #[default]
    Utf8,
    Latin1,
}

impl IniEncoding {
    fn decode(self, bytes: &[u8]) -> String {
        match self {
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            Self::Latin1 => bytes.iter().map(|&b| b as char).collect(),
        }
    }
}

/// Load an INI file into a flattened settings map.
///
/// An absent file is not an error: it yields an empty map.
pub fn load_ini(path: impl AsRef<Path>, encoding: IniEncoding) -> Result<RawSettingsMap> {
    let path = path.as_ref();
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(RawSettingsMap::new());
        }
        Err(err) => return Err(crate::Error::io(path, err)),
    };
    Ok(parse_ini(&encoding.decode(&bytes)))
}

/// Parse INI text into a flattened settings map.
///
/// Lines that are empty or start with `;` or `#` are skipped, as are lines
/// without a `=`. Unquoted integer and boolean literals are typed; quoted
/// values are always strings.
pub fn parse_ini(text: &str) -> RawSettingsMap {
    let mut map = RawSettingsMap::new();
    let mut section = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            section = header.trim().to_string();
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            tracing::debug!(line, "skipping malformed settings line");
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let name = if section.is_empty() {
            key.to_string()
        } else {
            format!("{section}/{key}")
        };
        map.insert(name, parse_scalar(value.trim()));
    }
    map
}

fn parse_scalar(raw: &str) -> SettingsValue {
    if raw.len() >= 2 {
        for quote in ['"', '\''] {
            if raw.starts_with(quote) && raw.ends_with(quote) {
                return SettingsValue::String(raw[1..raw.len() - 1].to_string());
            }
        }
    }
    if let Ok(n) = raw.parse::<i64>() {
        return SettingsValue::Integer(n);
    }
    match raw {
        "true" => SettingsValue::Boolean(true),
        "false" => SettingsValue::Boolean(false),
        _ => SettingsValue::String(raw.to_string()),
    }
}
