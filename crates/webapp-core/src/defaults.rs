//! Built-in default settings per cache subsystem
//!
//! The internal-use database merge consults these defaults so every
//! subsystem setting resolves to a usable value even when the operator's
//! file omits it.

use webapp_fs::RawSettingsMap;

/// Built-in defaults for the cache backend `subsystem`.
///
/// Unknown subsystems yield an empty map; the merge then changes nothing.
pub fn subsystem_defaults(subsystem: &str) -> RawSettingsMap {
    let mut map = RawSettingsMap::new();
    match subsystem {
        "singlefiledb" => {
            map.insert("DriverType", "sqlite");
            map.insert("DatabaseName", "tmp/cachedb");
            map.insert("PostOpenStatements", "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;");
            map.insert("ConnectionCount", 1i64);
        }
        "memory" => {
            map.insert("MemoryMax", 268435456i64);
        }
        _ => {}
    }
    map
}
