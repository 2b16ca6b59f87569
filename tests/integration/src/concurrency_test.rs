//! Concurrent first-access stress tests
//!
//! Many worker threads call into the registry after startup; the first
//! access to any memoized value must trigger exactly one computation, with
//! every thread observing the identical result.

use std::fs;
use std::sync::{Arc, Barrier};
use tempfile::TempDir;
use webapp_core::{SettingsRegistry, Topology};
use webapp_fs::{StartupArgs, WebRoot};

const THREADS: usize = 50;

fn setup_registry() -> (TempDir, Arc<SettingsRegistry>) {
    let temp = TempDir::new().unwrap();
    let config = temp.path().join("config");
    fs::create_dir(&config).unwrap();

    fs::write(
        config.join("application.ini"),
        "DatabaseSettingsFiles=database.ini\n\
         MultiProcessingModule=thread\n\
         MPM.thread.MaxAppServers=4\n\
         MPM.thread.MaxThreadsPerAppServer=16\n",
    )
    .unwrap();
    fs::write(config.join("database.ini"), "[product]\nDriverType=postgres\n").unwrap();
    fs::write(config.join("limits.json"), r#"{"MaxUpload": 1024}"#).unwrap();

    let registry = SettingsRegistry::load(StartupArgs {
        web_root: WebRoot::new(temp.path()),
        environment: "product".to_string(),
        server_id: 0,
    });
    (temp, Arc::new(registry))
}

/// Run `f` on N threads released together and collect every result.
fn stress<T: Send>(registry: &Arc<SettingsRegistry>, f: impl Fn(&SettingsRegistry) -> T + Send + Sync) -> Vec<T> {
    let barrier = Barrier::new(THREADS);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let registry = Arc::clone(registry);
                let barrier = &barrier;
                let f = &f;
                scope.spawn(move || {
                    barrier.wait();
                    f(&registry)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

#[test]
fn concurrent_topology_first_access_is_consistent() {
    let (_temp, registry) = setup_registry();

    let results: Vec<Topology> = stress(&registry, |r| r.topology());

    let first = results[0];
    assert!(results.iter().all(|t| *t == first));
    assert_eq!(first.max_servers, 4);
    assert_eq!(first.max_threads_per_server, 16);
}

#[test]
fn concurrent_named_config_lookup_scans_once() {
    let (_temp, registry) = setup_registry();

    let results = stress(&registry, |r| r.named_config("limits"));

    // Exactly one filesystem scan across all threads
    assert_eq!(registry.loader().scan_count(), 1);
    let first = &results[0];
    assert!(results.iter().all(|map| map == first));
    assert_eq!(first.int_value("MaxUpload").unwrap(), Some(1024));
}

#[test]
fn concurrent_absent_named_config_scans_once() {
    let (_temp, registry) = setup_registry();

    let results = stress(&registry, |r| r.named_config("ghost"));

    assert_eq!(registry.loader().scan_count(), 1);
    assert!(results.iter().all(|map| map.is_empty()));
}

#[test]
fn concurrent_internal_database_merge_is_identical() {
    let (_temp, registry) = setup_registry();

    let id = registry.internal_use_id();
    let results = stress(&registry, |r| r.database_settings(id).unwrap().clone());

    let first = &results[0];
    assert!(results.iter().all(|map| map == first));
    // Merge produced the built-in defaults for the default backend
    assert_eq!(
        first.str_value("singlefiledb/DriverType").unwrap(),
        Some("sqlite")
    );
}

#[test]
fn distinct_named_configs_do_not_share_a_computation() {
    let (_temp, registry) = setup_registry();

    // Interleave two names across the thread pool
    let results = stress(&registry, |r| {
        (r.named_config("limits"), r.named_config("ghost"))
    });

    // One scan per logical name, not per call
    assert_eq!(registry.loader().scan_count(), 2);
    assert!(results.iter().all(|(limits, ghost)| !limits.is_empty() && ghost.is_empty()));
}
