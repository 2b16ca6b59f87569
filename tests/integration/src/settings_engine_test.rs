//! End-to-end test for the configuration engine
//!
//! Exercises the complete flow: startup arguments -> web root resolution ->
//! settings loading -> registry lookups, against a fixture web root on disk.

use std::fs;
use tempfile::TempDir;
use webapp_core::{ExecutionModel, SettingsRegistry};
use webapp_fs::{SettingsValue, StartupArgs};

/// Set up a web root with a full config directory.
fn setup_web_root() -> TempDir {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config");
    fs::create_dir(&config).unwrap();

    fs::write(
        config.join("application.ini"),
        "InternalEncoding=UTF-8\n\
         DatabaseSettingsFiles=database.ini\n\
         Cache.SettingsFile=cache.ini\n\
         MultiProcessingModule=thread\n\
         MPM.thread.MaxAppServers=4\n\
         MPM.thread.MaxThreadsPerAppServer=16\n\
         SystemLog.FilePath=log/system.log\n",
    )
    .unwrap();

    fs::write(
        config.join("database.ini"),
        "[product]\n\
         DriverType=postgres\n\
         HostName=db.internal\n\
         [dev]\n\
         DriverType=sqlite\n\
         DatabaseName=tmp/devdb\n",
    )
    .unwrap();

    fs::write(
        config.join("cache.ini"),
        "[singlefiledb]\n\
         DatabaseName=tmp/cache_store\n",
    )
    .unwrap();

    // Named config present in both supported formats
    fs::write(config.join("widgets.json"), r#"{"Color": "green", "Count": 3}"#).unwrap();
    fs::write(config.join("widgets.ini"), "Color=green\nCount=3\n").unwrap();

    temp
}

fn bootstrap(temp: &TempDir, environment: &str) -> SettingsRegistry {
    let root = temp.path().to_string_lossy().to_string();
    SettingsRegistry::load(StartupArgs::parse([
        "-e",
        environment,
        "-i",
        "7",
        root.as_str(),
    ]))
}

#[test]
fn startup_arguments_flow_into_the_registry() {
    let temp = setup_web_root();
    let registry = bootstrap(&temp, "dev");

    assert_eq!(registry.environment(), "dev");
    assert_eq!(registry.server_id(), 7);
    assert!(registry.web_root().exists());
    assert!(registry.app_settings_file_exists());
}

#[test]
fn environment_selects_database_profiles() {
    let temp = setup_web_root();

    let product = bootstrap(&temp, "product");
    let profile = product.database_settings(0).unwrap();
    assert_eq!(profile.str_value("DriverType").unwrap(), Some("postgres"));
    assert_eq!(profile.str_value("HostName").unwrap(), Some("db.internal"));

    let dev = bootstrap(&temp, "dev");
    let profile = dev.database_settings(0).unwrap();
    assert_eq!(profile.str_value("DriverType").unwrap(), Some("sqlite"));
}

#[test]
fn internal_use_entry_is_appended_and_merged() {
    let temp = setup_web_root();
    let registry = bootstrap(&temp, "product");

    // One user database plus the synthesized internal entry
    assert_eq!(registry.database_count(), 2);
    assert_eq!(registry.internal_use_id(), 1);

    let internal = registry.database_settings(1).unwrap();
    // Operator's explicit value
    assert_eq!(
        internal.str_value("singlefiledb/DatabaseName").unwrap(),
        Some("tmp/cache_store")
    );
    // Filled from built-in defaults
    assert_eq!(
        internal.str_value("singlefiledb/DriverType").unwrap(),
        Some("sqlite")
    );
}

#[test]
fn topology_is_derived_from_directives() {
    let temp = setup_web_root();
    let registry = bootstrap(&temp, "product");

    let topology = registry.topology();
    assert_eq!(topology.model, ExecutionModel::SingleProcessThreaded);
    assert_eq!(topology.max_servers, 4);
    assert_eq!(topology.max_threads_per_server, 16);
}

#[test]
fn named_config_uses_exactly_one_candidate() {
    let temp = setup_web_root();
    let registry = bootstrap(&temp, "product");

    // widgets.json and widgets.ini both match; exactly one is loaded and
    // both parse to the same flattened entries here
    let widgets = registry.named_config("widgets");
    assert_eq!(widgets.len(), 2);
    assert_eq!(
        registry.named_config_value("widgets", "Color"),
        Some(SettingsValue::from(serde_json::json!("green")))
    );
    assert_eq!(
        registry.named_config_value("widgets", "count"),
        Some(SettingsValue::Integer(3))
    );

    // Second lookup is served from the cache
    registry.named_config("Widgets");
    assert_eq!(registry.loader().scan_count(), 1);
}

#[test]
fn absent_named_config_is_cached_as_empty() {
    let temp = setup_web_root();
    let registry = bootstrap(&temp, "product");

    assert!(registry.named_config("nonexistent").is_empty());
    assert!(registry.named_config("nonexistent").is_empty());
    assert_eq!(registry.loader().scan_count(), 1);
}

#[test]
fn system_log_path_is_root_relative() {
    let temp = setup_web_root();
    let registry = bootstrap(&temp, "product");

    let expected = registry.web_root().to_native().join("log/system.log");
    assert_eq!(registry.system_log_path(), expected);
    assert_eq!(registry.access_log_path(), None);
}

#[test]
fn missing_web_root_still_produces_a_usable_registry() {
    // No positional directory argument at all: root defaults to the current
    // directory and every lookup still answers
    let registry = SettingsRegistry::load(StartupArgs::parse(["-e", "product"]));

    assert_eq!(registry.database_count(), 0);
    assert_eq!(registry.internal_use_id(), 0);
    assert!(registry.topology().max_servers >= 1);
}
