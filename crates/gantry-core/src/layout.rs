//! Installation layout for a runtime home.
//!
//! Every pipeline operation receives a [`RuntimeLayout`] instead of looking
//! paths up from ambient state, so builds and deployments can be pointed at
//! arbitrary roots (temporary directories in tests, staging trees, real
//! installations).

use std::path::{Path, PathBuf};

/// Environment variable overriding the discovered runtime home.
pub const HOME_ENV: &str = "GANTRY_HOME";

/// File name of the runtime configuration inside the home directory.
pub const CONFIG_FILE: &str = "runtime.toml";

/// File names of the rendered launch scripts inside the bin directory.
pub const START_SCRIPT: &str = "start.sh";
pub const STOP_SCRIPT: &str = "stop.sh";

/// Extension of deployed application descriptors.
pub const DESCRIPTOR_EXTENSION: &str = "ham";

/// Directory roots of one runtime installation.
///
/// `bin` doubles as the platform library directory: libraries shipped with
/// the installation live there and are excluded from per-application copies
/// at deploy time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeLayout {
    home: PathBuf,
    bin: PathBuf,
    apps: PathBuf,
    log: PathBuf,
    temp: PathBuf,
}

impl RuntimeLayout {
    /// Layout with the standard subdirectories under `home`.
    pub fn rooted_at(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            bin: home.join("bin"),
            apps: home.join("apps"),
            log: home.join("log"),
            temp: home.join("temp"),
            home,
        }
    }

    /// Discover the installation home.
    ///
    /// Resolution order:
    /// 1. [`HOME_ENV`] environment variable
    /// 2. `~/.gantry` under the user home directory
    /// 3. `.gantry` relative to the working directory, for stripped-down
    ///    environments without a resolvable user home
    pub fn discover() -> Self {
        if let Ok(home) = std::env::var(HOME_ENV) {
            return Self::rooted_at(home);
        }
        let home = dirs::home_dir()
            .map(|h| h.join(".gantry"))
            .unwrap_or_else(|| PathBuf::from(".gantry"));
        Self::rooted_at(home)
    }

    pub fn home_dir(&self) -> &Path {
        &self.home
    }

    /// Platform library directory; also holds daemon binaries and scripts.
    pub fn bin_dir(&self) -> &Path {
        &self.bin
    }

    /// Root under which applications are deployed, one subdirectory each.
    pub fn apps_dir(&self) -> &Path {
        &self.apps
    }

    pub fn log_dir(&self) -> &Path {
        &self.log
    }

    /// Root for scratch directories; build and deploy stage work here.
    pub fn temp_dir(&self) -> &Path {
        &self.temp
    }

    /// Runtime daemon configuration file.
    pub fn config_file(&self) -> PathBuf {
        self.home.join(CONFIG_FILE)
    }

    /// Directory an application of this name deploys into. Case-sensitive.
    pub fn app_dir(&self, application_name: &str) -> PathBuf {
        self.apps.join(application_name)
    }

    /// Per-application library directory.
    pub fn app_lib_dir(&self, application_name: &str) -> PathBuf {
        self.app_dir(application_name).join("lib")
    }

    /// Per-application shared resources directory.
    pub fn app_resources_dir(&self, application_name: &str) -> PathBuf {
        self.app_dir(application_name).join("resources")
    }

    /// Deployed descriptor path: `apps/<name>/<name>.ham`.
    pub fn app_descriptor_path(&self, application_name: &str) -> PathBuf {
        self.app_dir(application_name)
            .join(format!("{application_name}.{DESCRIPTOR_EXTENSION}"))
    }

    pub fn start_script_path(&self) -> PathBuf {
        self.bin.join(START_SCRIPT)
    }

    pub fn stop_script_path(&self) -> PathBuf {
        self.bin.join(STOP_SCRIPT)
    }
}
