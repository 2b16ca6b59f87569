//! Precedence merge of explicit settings over subsystem defaults

use webapp_fs::RawSettingsMap;

/// Merge a subsystem's built-in `defaults` into `explicit` settings.
///
/// For every key `k` in `defaults`, the default value is inserted under
/// `key_prefix + k` only when the explicit entry there is absent, empty, or
/// whitespace-only. Every other explicit entry is left untouched, so an
/// operator's deliberate (even unusual) choice is never overridden, while
/// every subsystem setting still resolves to a usable value.
pub fn merge_defaults(
    explicit: &RawSettingsMap,
    defaults: &RawSettingsMap,
    key_prefix: &str,
) -> RawSettingsMap {
    let mut merged = explicit.clone();
    for (key, default) in defaults.iter() {
        let prefixed = format!("{key_prefix}{key}");
        if merged.is_blank(&prefixed) {
            merged.insert(prefixed, default.clone());
        }
    }
    merged
}
