//! Settings source loading and name-based discovery
//!
//! The [`SourceLoader`] turns settings files into [`RawSettingsMap`]s. Format
//! is chosen by file extension through a decoder registry, so new formats can
//! be added without touching discovery.

use crate::{IniEncoding, RawSettingsMap, Result, SettingsValue, ini};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Decoder for one settings format.
///
/// Decoders report `Err` only for I/O failures on an existing file; content
/// problems are handled inside the decoder (warn, empty map) so they never
/// escape the loading boundary.
pub type Decoder = fn(&Path, IniEncoding) -> Result<RawSettingsMap>;

/// Registry of normalized extension → decoder.
#[derive(Debug, Clone)]
pub struct FormatRegistry {
    decoders: HashMap<String, Decoder>,
}

impl FormatRegistry {
    /// Registry with the built-in formats: `ini` and `json`.
    pub fn with_builtins() -> Self {
        let mut registry = Self {
            decoders: HashMap::new(),
        };
        registry.register("ini", decode_ini);
        registry.register("json", decode_json);
        registry
    }

    /// Register a decoder for an extension (matched case-insensitively).
    pub fn register(&mut self, extension: &str, decoder: Decoder) {
        self.decoders.insert(extension.to_lowercase(), decoder);
    }

    pub fn get(&self, extension: &str) -> Option<Decoder> {
        self.decoders.get(&extension.to_lowercase()).copied()
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn decode_ini(path: &Path, encoding: IniEncoding) -> Result<RawSettingsMap> {
    ini::load_ini(path, encoding)
}

fn decode_json(path: &Path, _encoding: IniEncoding) -> Result<RawSettingsMap> {
    load_json(path)
}

/// Load a JSON settings file: a single top-level object whose first-level
/// entries are flattened into the map.
///
/// An absent file yields an empty map. Malformed content or a non-object
/// root logs a warning and yields an empty map; neither is an error.
pub fn load_json(path: impl AsRef<Path>) -> Result<RawSettingsMap> {
    let path = path.as_ref();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(RawSettingsMap::new());
        }
        Err(err) => return Err(crate::Error::io(path, err)),
    };

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(serde_json::Value::Object(entries)) => Ok(entries
            .into_iter()
            .map(|(k, v)| (k, SettingsValue::from(v)))
            .collect()),
        Ok(other) => {
            tracing::warn!(
                path = %path.display(),
                root = other.to_string(),
                "JSON settings root is not an object; ignoring file"
            );
            Ok(RawSettingsMap::new())
        }
        Err(err) => {
            tracing::warn!(
                path = %path.display(),
                error = %err,
                "malformed JSON settings; treating as empty"
            );
            Ok(RawSettingsMap::new())
        }
    }
}

/// Loads settings sources and discovers named configs on disk.
pub struct SourceLoader {
    formats: FormatRegistry,
    encoding: IniEncoding,
    scans: AtomicUsize,
}

impl SourceLoader {
    pub fn new(encoding: IniEncoding) -> Self {
        Self {
            formats: FormatRegistry::with_builtins(),
            encoding,
            scans: AtomicUsize::new(0),
        }
    }

    /// Register an additional settings format.
    pub fn register_format(&mut self, extension: &str, decoder: Decoder) {
        self.formats.register(extension, decoder);
    }

    /// Load an INI file with the configured encoding.
    pub fn load_ini(&self, path: impl AsRef<Path>) -> Result<RawSettingsMap> {
        ini::load_ini(path, self.encoding)
    }

    /// Number of directory scans performed by [`discover_and_load`].
    ///
    /// Cached lookups above this layer must keep this from growing; see the
    /// named-config cache.
    ///
    /// [`discover_and_load`]: Self::discover_and_load
    pub fn scan_count(&self) -> usize {
        self.scans.load(Ordering::Relaxed)
    }

    /// Discover and load a named config in `directory`.
    ///
    /// Candidates are files named exactly `logical_name` or matching
    /// `logical_name.*`, visited in directory listing order (which is
    /// platform-dependent; with several candidates the winner is
    /// unspecified). Each candidate is dispatched to the decoder registered
    /// for its suffix — the part after `logical_name.`, matched
    /// case-insensitively; a multi-dot suffix such as `local.json` falls
    /// back to its last extension. A candidate with no registered decoder
    /// logs a warning and is skipped. The first dispatched candidate wins, even
    /// when its content problems made it decode to an empty map; candidates
    /// are never merged.
    ///
    /// Returns `None` when no candidate was dispatched, letting the caller
    /// distinguish an absent config from an empty one.
    pub fn discover_and_load(
        &self,
        directory: impl AsRef<Path>,
        logical_name: &str,
    ) -> Option<RawSettingsMap> {
        let directory = directory.as_ref();
        self.scans.fetch_add(1, Ordering::Relaxed);

        let entries = std::fs::read_dir(directory).ok()?;
        let dotted = format!("{logical_name}.");

        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };

            let suffix = if file_name == logical_name {
                ""
            } else if let Some(suffix) = file_name.strip_prefix(&dotted) {
                suffix
            } else {
                continue;
            };

            let Some(decoder) = self.formats.get(suffix).or_else(|| {
                suffix
                    .rsplit_once('.')
                    .and_then(|(_, last)| self.formats.get(last))
            }) else {
                tracing::warn!(file = file_name, "unrecognized settings format; skipping");
                continue;
            };

            match decoder(&entry.path(), self.encoding) {
                Ok(map) => return Some(map),
                Err(err) => {
                    tracing::warn!(
                        file = file_name,
                        error = %err,
                        "failed to read settings candidate; trying next"
                    );
                }
            }
        }
        None
    }
}

impl Default for SourceLoader {
    fn default() -> Self {
        Self::new(IniEncoding::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn discovery_returns_exactly_one_candidate() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("widgets.json"), r#"{"source": "json"}"#).unwrap();
        fs::write(dir.path().join("widgets.ini"), "source=ini\n").unwrap();

        let loader = SourceLoader::default();
        let map = loader.discover_and_load(dir.path(), "widgets").unwrap();

        // One of the two candidates, never a merge of both
        let source = map.str_value("source").unwrap().unwrap();
        assert!(source == "json" || source == "ini");
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn unknown_extension_is_skipped_during_discovery() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("cache.yaml"), "backend: memory\n").unwrap();
        fs::write(dir.path().join("cache.ini"), "Backend=memory\n").unwrap();

        let loader = SourceLoader::default();
        let map = loader.discover_and_load(dir.path(), "cache").unwrap();

        assert_eq!(map.str_value("Backend").unwrap(), Some("memory"));
    }

    #[test]
    fn multi_dot_suffix_dispatches_on_last_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("widgets.local.json"), r#"{"Color": "blue"}"#).unwrap();

        let loader = SourceLoader::default();
        let map = loader.discover_and_load(dir.path(), "widgets").unwrap();

        assert_eq!(map.str_value("Color").unwrap(), Some("blue"));
    }

    #[test]
    fn discovery_without_candidates_returns_none() {
        let dir = TempDir::new().unwrap();
        let loader = SourceLoader::default();

        assert!(loader.discover_and_load(dir.path(), "missing").is_none());
        assert_eq!(loader.scan_count(), 1);
    }

    #[test]
    fn malformed_json_still_counts_as_dispatched() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();

        let loader = SourceLoader::default();
        let map = loader.discover_and_load(dir.path(), "broken").unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn registered_format_extends_discovery() {
        fn decode_flag(_path: &Path, _encoding: IniEncoding) -> Result<RawSettingsMap> {
            let mut map = RawSettingsMap::new();
            map.insert("decoded", true);
            Ok(map)
        }

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("feature.flag"), "").unwrap();

        let mut loader = SourceLoader::default();
        loader.register_format("FLAG", decode_flag);

        let map = loader.discover_and_load(dir.path(), "feature").unwrap();
        assert_eq!(map.bool_value("decoded").unwrap(), Some(true));
    }

    #[test]
    fn json_flattens_only_top_level_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.json");
        fs::write(
            &path,
            r#"{"Name": "app", "Limits": {"Requests": 10}, "Ports": [80, 443]}"#,
        )
        .unwrap();

        let map = load_json(&path).unwrap();
        assert_eq!(map.len(), 3);
        assert_eq!(map.str_value("Name").unwrap(), Some("app"));
        assert!(matches!(map.get("Limits"), Some(SettingsValue::Map(_))));
        assert!(matches!(map.get("Ports"), Some(SettingsValue::List(_))));
    }

    #[test]
    fn json_root_must_be_an_object() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("list.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        assert!(load_json(&path).unwrap().is_empty());
    }
}
