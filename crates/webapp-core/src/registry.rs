//! Settings registry: raw settings maps and memoized derived values
//!
//! The [`SettingsRegistry`] is built once at startup, owned by the process
//! entry point, and passed by reference to every collaborator; there is no
//! ambient global. After construction it is read-only — applying
//! configuration changes requires a full restart. Each derived value sits in
//! its own [`Memo`] cell, so concurrent first accesses compute exactly once
//! and unrelated lookups never serialize against each other.

use crate::defaults::subsystem_defaults;
use crate::memo::Memo;
use crate::merge::merge_defaults;
use crate::topology::{self, ExecutionModel, Topology};
use crate::{Error, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use webapp_fs::{IniEncoding, RawSettingsMap, SettingsValue, SourceLoader, StartupArgs, WebRoot};

/// Cache backend applied when `Cache.Backend` is not set.
const DEFAULT_CACHE_BACKEND: &str = "singlefiledb";

/// Fallback system log location, relative to the web root.
const DEFAULT_SYSTEM_LOG: &str = "log/system.log";

/// Auxiliary subsystems with an optional settings file: subsystem name and
/// the application setting naming its file. At most one file per subsystem;
/// an unset key or absent file stays silent.
const AUXILIARY_SUBSYSTEMS: &[(&str, &str)] = &[
    ("cache", "Cache.SettingsFile"),
    ("mongodb", "MongoDb.SettingsFile"),
    ("redis", "Redis.SettingsFile"),
];

/// Owns all raw settings maps for the process lifetime.
pub struct SettingsRegistry {
    web_root: WebRoot,
    environment: String,
    server_id: i32,
    loader: SourceLoader,
    /// application.ini, flattened
    app: RawSettingsMap,
    /// One profile per configured user database, in file-list order
    databases: Vec<RawSettingsMap>,
    /// Per-subsystem auxiliary settings; a subsystem is present only when
    /// its settings file was configured
    auxiliary: HashMap<String, RawSettingsMap>,
    /// lowercase logical name → compute-once cell
    named: Mutex<HashMap<String, Arc<Memo<Arc<RawSettingsMap>>>>>,
    internal_db: Memo<RawSettingsMap>,
    database_count: Memo<usize>,
    internal_use_id: Memo<usize>,
    cache_backend: Memo<String>,
    model: Memo<ExecutionModel>,
    max_servers: Memo<i32>,
    max_threads: Memo<i32>,
}

impl SettingsRegistry {
    /// Parse program arguments and load all eagerly-read settings sources.
    pub fn bootstrap<I>(args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::load(StartupArgs::parse(args))
    }

    /// Load all eagerly-read settings sources under the resolved web root.
    ///
    /// Nothing here is fatal: an unreadable or absent file becomes an empty
    /// map with a warning, and the registry always comes up usable.
    pub fn load(args: StartupArgs) -> Self {
        let StartupArgs {
            web_root,
            environment,
            server_id,
        } = args;
        let config_dir = PathBuf::from(web_root.config_path());

        // application.ini is read before the encoding it configures
        let app = read_or_empty(
            webapp_fs::load_ini(config_dir.join("application.ini"), IniEncoding::Utf8),
            "application.ini",
        );
        let encoding = internal_encoding(&app);
        let loader = SourceLoader::new(encoding);

        let mut databases = Vec::new();
        if let Some(files) = lenient_str(&app, "DatabaseSettingsFiles") {
            for file in files.split_whitespace() {
                let map = read_or_empty(loader.load_ini(config_dir.join(file)), file);
                databases.push(environment_profile(&map, &environment));
            }
        }

        // Purely optional; an unset key or absent file stays silent
        let mut auxiliary = HashMap::new();
        for &(subsystem, key) in AUXILIARY_SUBSYSTEMS {
            let Some(file) = lenient_str(&app, key)
                .map(str::trim)
                .filter(|file| !file.is_empty())
            else {
                continue;
            };
            auxiliary.insert(
                subsystem.to_string(),
                read_or_empty(loader.load_ini(config_dir.join(file)), file),
            );
        }

        Self {
            web_root,
            environment,
            server_id,
            loader,
            app,
            databases,
            auxiliary,
            named: Mutex::new(HashMap::new()),
            internal_db: Memo::new(),
            database_count: Memo::new(),
            internal_use_id: Memo::new(),
            cache_backend: Memo::new(),
            model: Memo::new(),
            max_servers: Memo::new(),
            max_threads: Memo::new(),
        }
    }

    pub fn web_root(&self) -> &WebRoot {
        &self.web_root
    }

    /// Database environment selected with `-e`.
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Server instance id given with `-i`; stored, not interpreted.
    pub fn server_id(&self) -> i32 {
        self.server_id
    }

    /// The application settings map (application.ini).
    pub fn app_settings(&self) -> &RawSettingsMap {
        &self.app
    }

    pub fn app_settings_file_exists(&self) -> bool {
        !self.app.is_empty()
    }

    /// The source loader, exposed for format registration and scan metrics.
    pub fn loader(&self) -> &SourceLoader {
        &self.loader
    }

    // --- database profiles ---------------------------------------------

    /// Number of database settings entries, counting the synthesized
    /// internal-use entry when any user database is configured.
    pub fn database_count(&self) -> usize {
        *self.database_count.get_or_compute(|| {
            let user = self.databases.len();
            if user > 0 { user + 1 } else { user }
        })
    }

    pub fn database_available(&self) -> bool {
        self.database_count() > 0
    }

    /// Id of the synthesized internal-use entry: last, after all user
    /// profiles.
    pub fn internal_use_id(&self) -> usize {
        *self.internal_use_id.get_or_compute(|| {
            let count = self.database_count();
            if count > 0 { count - 1 } else { 0 }
        })
    }

    /// Settings for database `id`.
    ///
    /// The internal-use id resolves to the auxiliary subsystem settings
    /// merged over the cache backend's built-in defaults; any other id is a
    /// user profile in configuration order.
    pub fn database_settings(&self, id: usize) -> Result<&RawSettingsMap> {
        if id == self.internal_use_id() {
            return Ok(self.internal_db.get_or_compute(|| {
                let explicit = self.auxiliary_settings("cache").cloned().unwrap_or_default();
                let backend = self.cache_backend();
                merge_defaults(
                    &explicit,
                    &subsystem_defaults(backend),
                    &format!("{backend}/"),
                )
            }));
        }
        self.databases.get(id).ok_or(Error::DatabaseIdOutOfRange {
            id,
            count: self.database_count(),
        })
    }

    /// The configured cache backend, lowercased.
    pub fn cache_backend(&self) -> &str {
        self.cache_backend.get_or_compute(|| {
            lenient_str(&self.app, "Cache.Backend")
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_CACHE_BACKEND.to_string())
        })
    }

    // --- auxiliary subsystems ------------------------------------------

    /// Settings of the auxiliary subsystem `subsystem`, if its settings
    /// file was configured. The map is empty when the configured file was
    /// absent or unreadable.
    pub fn auxiliary_settings(&self, subsystem: &str) -> Option<&RawSettingsMap> {
        self.auxiliary.get(&subsystem.to_lowercase())
    }

    /// Whether `subsystem` has any auxiliary settings.
    pub fn auxiliary_available(&self, subsystem: &str) -> bool {
        self.auxiliary_settings(subsystem)
            .is_some_and(|map| !map.is_empty())
    }

    /// MongoDB settings, when `MongoDb.SettingsFile` is configured.
    pub fn mongodb_settings(&self) -> Option<&RawSettingsMap> {
        self.auxiliary_settings("mongodb")
    }

    pub fn mongodb_available(&self) -> bool {
        self.auxiliary_available("mongodb")
    }

    /// Redis settings, when `Redis.SettingsFile` is configured.
    pub fn redis_settings(&self) -> Option<&RawSettingsMap> {
        self.auxiliary_settings("redis")
    }

    pub fn redis_available(&self) -> bool {
        self.auxiliary_available("redis")
    }

    // --- named configs -------------------------------------------------

    /// Settings of the named config `name`, discovered under the config
    /// directory on first lookup and cached terminally — even when absent.
    ///
    /// A cache miss blocks on a filesystem scan; every later call for the
    /// same name (case-insensitive) is O(1) and does no I/O.
    pub fn named_config(&self, name: &str) -> Arc<RawSettingsMap> {
        let cell = {
            let mut cache = self
                .named
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            Arc::clone(cache.entry(name.to_lowercase()).or_default())
        };

        Arc::clone(cell.get_or_compute(|| {
            match self.loader.discover_and_load(self.config_dir(), name) {
                Some(map) => Arc::new(map),
                None => {
                    tracing::warn!(config = name, "no such named config");
                    Arc::new(RawSettingsMap::new())
                }
            }
        }))
    }

    /// One value out of a named config.
    pub fn named_config_value(&self, name: &str, key: &str) -> Option<SettingsValue> {
        self.named_config(name).get(key).cloned()
    }

    // --- topology ------------------------------------------------------

    /// The resolved execution model; computed once per process.
    pub fn execution_model(&self) -> ExecutionModel {
        *self.model.get_or_compute(|| {
            let directive = lenient_str(&self.app, "MultiProcessingModule").unwrap_or_default();
            topology::resolve_model(directive.trim())
        })
    }

    /// Maximum number of application servers; computed once per process.
    pub fn max_servers(&self) -> i32 {
        *self.max_servers.get_or_compute(|| {
            topology::resolve_max_servers(self.mpm_directive("MaxAppServers"))
        })
    }

    /// Per-server thread (or worker) limit; computed once per process.
    pub fn max_threads_per_server(&self) -> i32 {
        *self.max_threads.get_or_compute(|| {
            topology::resolve_max_threads_per_server(self.execution_model(), |leaf| {
                self.mpm_directive(leaf)
            })
        })
    }

    /// The full runtime topology.
    pub fn topology(&self) -> Topology {
        Topology {
            model: self.execution_model(),
            max_servers: self.max_servers(),
            max_threads_per_server: self.max_threads_per_server(),
        }
    }

    /// Directive under `MPM.<configured model>.<leaf>`, read leniently: a
    /// mistyped value warns and reads as absent.
    fn mpm_directive(&self, leaf: &str) -> Option<i64> {
        let model = lenient_str(&self.app, "MultiProcessingModule")
            .unwrap_or_default()
            .trim()
            .to_lowercase();
        lenient_int(&self.app, &format!("MPM.{model}.{leaf}"))
    }

    // --- log paths -----------------------------------------------------

    /// Absolute system log path; root-relative unless configured absolute.
    pub fn system_log_path(&self) -> PathBuf {
        let configured = lenient_str(&self.app, "SystemLog.FilePath")
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SYSTEM_LOG);
        self.web_root.resolve(configured)
    }

    /// Absolute access log path, or `None` when access logging is not
    /// configured.
    pub fn access_log_path(&self) -> Option<PathBuf> {
        self.optional_log_path("AccessLog.FilePath")
    }

    /// Absolute query log path, or `None` when query logging is not
    /// configured.
    pub fn query_log_path(&self) -> Option<PathBuf> {
        self.optional_log_path("QueryLog.FilePath")
    }

    fn optional_log_path(&self, key: &str) -> Option<PathBuf> {
        lenient_str(&self.app, key)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|path| self.web_root.resolve(path))
    }

    fn config_dir(&self) -> PathBuf {
        PathBuf::from(self.web_root.config_path())
    }
}

/// Read a string setting, warning and treating it as absent on a type
/// mismatch; no setting problem is ever escalated.
fn lenient_str<'a>(map: &'a RawSettingsMap, key: &str) -> Option<&'a str> {
    match map.str_value(key) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring mistyped setting");
            None
        }
    }
}

fn lenient_int(map: &RawSettingsMap, key: &str) -> Option<i64> {
    match map.int_value(key) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(error = %err, "ignoring mistyped setting");
            None
        }
    }
}

fn read_or_empty(result: webapp_fs::Result<RawSettingsMap>, file: &str) -> RawSettingsMap {
    result.unwrap_or_else(|err| {
        tracing::warn!(file, error = %err, "failed to read settings file; treating as empty");
        RawSettingsMap::new()
    })
}

fn internal_encoding(app: &RawSettingsMap) -> IniEncoding {
    match lenient_str(app, "InternalEncoding").map(str::trim) {
        Some(name) if name.eq_ignore_ascii_case("latin1") || name.eq_ignore_ascii_case("iso-8859-1") => {
            IniEncoding::Latin1
        }
        _ => IniEncoding::Utf8,
    }
}

/// Extract the profile for `environment` out of a database settings file:
/// the entries under the `<environment>/` section, prefix stripped.
fn environment_profile(map: &RawSettingsMap, environment: &str) -> RawSettingsMap {
    let prefix = format!("{}/", environment.to_lowercase());
    map.iter()
        .filter_map(|(name, value)| {
            let head = name.get(..prefix.len())?;
            let rest = name.get(prefix.len()..)?;
            (head.eq_ignore_ascii_case(&prefix) && !rest.is_empty())
                .then(|| (rest.to_string(), value.clone()))
        })
        .collect()
}
