//! Web root resolution and logical directory paths

use std::path::{Path, PathBuf};

/// Fixed logical directories under the web root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppDir {
    /// Static assets served as-is
    Public,
    /// Settings files (application, databases, named configs)
    Config,
    /// Application libraries
    Lib,
    /// Log files
    Log,
    /// Loadable plugins
    Plugin,
    /// Scratch space (uploads, embedded stores)
    Tmp,
}

impl AppDir {
    /// Get the directory segment for this logical directory.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Config => "config",
            Self::Lib => "lib",
            Self::Log => "log",
            Self::Plugin => "plugin",
            Self::Tmp => "tmp",
        }
    }
}

impl AsRef<Path> for AppDir {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl std::fmt::Display for AppDir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The web root directory, normalized to forward slashes with a trailing
/// separator.
///
/// All logical paths are derived from this root; deriving them never touches
/// the filesystem and never fails. The existence check is advisory only — the
/// engine proceeds with a best-effort root even when the directory is
/// missing, and refusing to start is the caller's decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WebRoot {
    /// Internal representation always uses forward slashes and ends with one
    inner: String,
}

impl WebRoot {
    /// Create a new WebRoot from any path-like input.
    ///
    /// The path is made absolute when possible and stored with a trailing
    /// separator.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let mut normalized = absolute.to_string_lossy().replace('\\', "/");
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        Self { inner: normalized }
    }

    /// The current working directory as a web root.
    pub fn current_dir() -> Self {
        Self::new(".")
    }

    /// Get the internal normalized string representation (trailing separator
    /// included).
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Check if the web root directory exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().is_dir()
    }

    /// The application name, taken from the root directory name.
    pub fn app_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Absolute path of a logical directory, trailing separator included.
    pub fn dir(&self, dir: AppDir) -> String {
        format!("{}{}/", self.inner, dir.as_str())
    }

    /// Absolute path of the public directory.
    pub fn public_path(&self) -> String {
        self.dir(AppDir::Public)
    }

    /// Absolute path of the config directory.
    pub fn config_path(&self) -> String {
        self.dir(AppDir::Config)
    }

    /// Absolute path of the library directory.
    pub fn lib_path(&self) -> String {
        self.dir(AppDir::Lib)
    }

    /// Absolute path of the log directory.
    pub fn log_path(&self) -> String {
        self.dir(AppDir::Log)
    }

    /// Absolute path of the plugin directory.
    pub fn plugin_path(&self) -> String {
        self.dir(AppDir::Plugin)
    }

    /// Absolute path of the tmp directory.
    pub fn tmp_path(&self) -> String {
        self.dir(AppDir::Tmp)
    }

    /// Resolve a configured path against the web root.
    ///
    /// Absolute paths are returned unchanged; relative paths are joined onto
    /// the root.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.to_native().join(path)
        }
    }
}

impl std::fmt::Display for WebRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl AsRef<Path> for WebRoot {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

/// Startup arguments consumed by the configuration engine.
///
/// Only three inputs are interpreted here: `-e <environment>` selects the
/// database profile environment, `-i <id>` is stored as the server instance
/// id, and the first remaining positional argument naming an existing
/// directory becomes the web root. Everything else is left for the process
/// bootstrap to handle.
#[derive(Debug, Clone)]
pub struct StartupArgs {
    pub web_root: WebRoot,
    pub environment: String,
    pub server_id: i32,
}

/// Database environment applied when `-e` is not given.
pub const DEFAULT_ENVIRONMENT: &str = "product";

impl StartupArgs {
    /// Scan program arguments (without the executable name).
    ///
    /// Absent any positional argument naming an existing directory, the web
    /// root defaults to the current directory.
    pub fn parse<I>(args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let mut environment = DEFAULT_ENVIRONMENT.to_string();
        let mut server_id = 0;
        let mut web_root = None;

        let mut iter = args.into_iter().map(Into::into);
        while let Some(arg) = iter.next() {
            if arg.starts_with('-') {
                match arg.as_str() {
                    "-e" => {
                        if let Some(env) = iter.next() {
                            environment = env;
                        }
                    }
                    "-i" => {
                        if let Some(id) = iter.next() {
                            server_id = id.parse().unwrap_or_default();
                        }
                    }
                    _ => {}
                }
            } else if web_root.is_none() && Path::new(&arg).is_dir() {
                web_root = Some(WebRoot::new(&arg));
            }
        }

        Self {
            web_root: web_root.unwrap_or_else(WebRoot::current_dir),
            environment,
            server_id,
        }
    }
}
