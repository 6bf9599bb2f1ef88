//! Launch support: runtime classpath and daemon control scripts.
//!
//! Scripts are rendered as plain text; making them executable and running
//! them belongs to the process-execution collaborator. Platform specifics
//! enter only through [`LaunchConfig`], never through OS detection at
//! render time.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::fs;
use crate::layout::RuntimeLayout;
use crate::library::LIBRARY_EXTENSION;

/// Separator between classpath entries.
pub const CLASSPATH_SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Which control script to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    Start,
    Stop,
}

/// Daemon settings read from the installation's runtime config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Daemon executable invoked by the control scripts.
    #[serde(default = "default_daemon")]
    pub daemon: String,

    /// Exported as JAVA_HOME at the top of each script when set.
    #[serde(default)]
    pub java_home: Option<PathBuf>,

    /// Entry point class handed to the daemon.
    #[serde(default = "default_launcher_class")]
    pub launcher_class: String,

    /// Initial heap size (-Xms).
    #[serde(default = "default_heap_min")]
    pub heap_min: String,

    /// Maximum heap size (-Xmx).
    #[serde(default = "default_heap_max")]
    pub heap_max: String,

    /// Value passed as -Dfile.encoding.
    #[serde(default = "default_file_encoding")]
    pub file_encoding: String,

    /// Seconds the daemon waits on start and stop (-wait).
    #[serde(default = "default_shutdown_wait")]
    pub shutdown_wait_secs: u32,
}

fn default_daemon() -> String {
    "jsvc".to_string()
}

fn default_launcher_class() -> String {
    "gantry.Launcher".to_string()
}

fn default_heap_min() -> String {
    "64m".to_string()
}

fn default_heap_max() -> String {
    "512m".to_string()
}

fn default_file_encoding() -> String {
    "UTF-8".to_string()
}

fn default_shutdown_wait() -> u32 {
    10
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            daemon: default_daemon(),
            java_home: None,
            launcher_class: default_launcher_class(),
            heap_min: default_heap_min(),
            heap_max: default_heap_max(),
            file_encoding: default_file_encoding(),
            shutdown_wait_secs: default_shutdown_wait(),
        }
    }
}

impl LaunchConfig {
    /// Read the config file, falling back to defaults when it does not
    /// exist yet. A bare installation is runnable without one.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Runtime classpath over the whole installation.
///
/// Library archives are collected recursively under the platform directory
/// first, then under the apps root, each root's entries sorted. Platform
/// entries always precede application entries.
pub fn build_classpath(platform_lib_dir: &Path, apps_root: &Path) -> anyhow::Result<String> {
    let mut entries = fs::collect_by_extension(platform_lib_dir, LIBRARY_EXTENSION)?;
    entries.extend(fs::collect_by_extension(apps_root, LIBRARY_EXTENSION)?);
    let rendered: Vec<String> = entries.iter().map(|p| p.display().to_string()).collect();
    Ok(rendered.join(&CLASSPATH_SEPARATOR.to_string()))
}

/// Render one control script. Pure: no filesystem access, no OS probing.
pub fn render_script(
    kind: ScriptKind,
    classpath: &str,
    config: &LaunchConfig,
    layout: &RuntimeLayout,
) -> String {
    let export = match &config.java_home {
        Some(java_home) => format!("export JAVA_HOME={}\n", java_home.display()),
        None => String::new(),
    };
    let stop_flag = match kind {
        ScriptKind::Start => "",
        ScriptKind::Stop => " -stop",
    };
    let log_dir = layout.log_dir();
    format!(
        "#!/bin/sh\n{export}\n{daemon} -outfile {out} -errfile {err} -pidfile {pid} \
         -jvm server -Xms{heap_min} -Xmx{heap_max} -Dfile.encoding={encoding}{stop_flag} \
         -wait {wait} -cp {classpath} {launcher} {config_file}\n",
        export = export,
        daemon = config.daemon,
        out = log_dir.join("gantry.out").display(),
        err = log_dir.join("gantry.err").display(),
        pid = log_dir.join("gantry.pid").display(),
        heap_min = config.heap_min,
        heap_max = config.heap_max,
        encoding = config.file_encoding,
        stop_flag = stop_flag,
        wait = config.shutdown_wait_secs,
        classpath = classpath,
        launcher = config.launcher_class,
        config_file = layout.config_file().display(),
    )
}

/// Render both control scripts over the current tree and write them into
/// the bin directory. Setting the executable bit is the caller's duty.
pub fn export_scripts(
    layout: &RuntimeLayout,
    config: &LaunchConfig,
) -> anyhow::Result<(PathBuf, PathBuf)> {
    let classpath = build_classpath(layout.bin_dir(), layout.apps_dir())?;
    std::fs::create_dir_all(layout.bin_dir())
        .with_context(|| format!("Failed to create directory: {}", layout.bin_dir().display()))?;

    let start_path = layout.start_script_path();
    std::fs::write(
        &start_path,
        render_script(ScriptKind::Start, &classpath, config, layout),
    )
    .with_context(|| format!("Failed to write script: {}", start_path.display()))?;

    let stop_path = layout.stop_script_path();
    std::fs::write(
        &stop_path,
        render_script(ScriptKind::Stop, &classpath, config, layout),
    )
    .with_context(|| format!("Failed to write script: {}", stop_path.display()))?;

    info!(
        start = %start_path.display(),
        stop = %stop_path.display(),
        "exported control scripts"
    );
    Ok((start_path, stop_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_describe_a_bare_installation() {
        let config = LaunchConfig::default();
        assert_eq!(config.daemon, "jsvc");
        assert!(config.java_home.is_none());
        assert_eq!(config.heap_min, "64m");
        assert_eq!(config.heap_max, "512m");
        assert_eq!(config.file_encoding, "UTF-8");
        assert_eq!(config.shutdown_wait_secs, 10);
    }

    #[test]
    fn load_falls_back_to_defaults_when_missing() {
        let dir = TempDir::new().expect("tempdir");
        let config = LaunchConfig::load(&dir.path().join("runtime.toml")).expect("load");
        assert_eq!(config, LaunchConfig::default());
    }

    #[test]
    fn load_overrides_only_present_keys() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("runtime.toml");
        std::fs::write(&path, "heap_max = \"2g\"\njava_home = \"/opt/jdk\"\n")
            .expect("write config");

        let config = LaunchConfig::load(&path).expect("load");
        assert_eq!(config.heap_max, "2g");
        assert_eq!(config.java_home.as_deref(), Some(Path::new("/opt/jdk")));
        assert_eq!(config.heap_min, "64m");
        assert_eq!(config.daemon, "jsvc");
    }

    #[test]
    fn classpath_puts_platform_entries_first() {
        let dir = TempDir::new().expect("tempdir");
        let bin = dir.path().join("bin");
        let apps = dir.path().join("apps/Orders/lib");
        std::fs::create_dir_all(&bin).expect("create bin");
        std::fs::create_dir_all(&apps).expect("create apps");
        std::fs::write(bin.join("zeta.jar"), b"z").expect("write jar");
        std::fs::write(bin.join("alpha.jar"), b"a").expect("write jar");
        std::fs::write(apps.join("app.jar"), b"x").expect("write jar");
        std::fs::write(apps.join("notes.txt"), b"n").expect("write file");

        let classpath =
            build_classpath(&bin, &dir.path().join("apps")).expect("classpath");
        let expected = [
            bin.join("alpha.jar"),
            bin.join("zeta.jar"),
            apps.join("app.jar"),
        ]
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(&CLASSPATH_SEPARATOR.to_string());
        assert_eq!(classpath, expected);
    }

    #[test]
    fn classpath_over_missing_roots_is_empty() {
        let dir = TempDir::new().expect("tempdir");
        let classpath = build_classpath(&dir.path().join("bin"), &dir.path().join("apps"))
            .expect("classpath");
        assert!(classpath.is_empty());
    }

    #[test]
    fn stop_script_differs_from_start_only_by_stop_flag() {
        let dir = TempDir::new().expect("tempdir");
        let layout = RuntimeLayout::rooted_at(dir.path());
        let config = LaunchConfig::default();

        let start = render_script(ScriptKind::Start, "a.jar", &config, &layout);
        let stop = render_script(ScriptKind::Stop, "a.jar", &config, &layout);

        assert!(start.starts_with("#!/bin/sh\n"));
        assert!(!start.contains(" -stop"));
        assert!(stop.contains(" -stop -wait 10"));
        assert_eq!(start.replace(" -wait", " -stop -wait"), stop);
    }

    #[test]
    fn java_home_is_exported_only_when_configured() {
        let dir = TempDir::new().expect("tempdir");
        let layout = RuntimeLayout::rooted_at(dir.path());

        let mut config = LaunchConfig::default();
        let without = render_script(ScriptKind::Start, "", &config, &layout);
        assert!(!without.contains("JAVA_HOME"));

        config.java_home = Some(PathBuf::from("/opt/jdk"));
        let with = render_script(ScriptKind::Start, "", &config, &layout);
        assert!(with.contains("export JAVA_HOME=/opt/jdk\n"));
    }

    #[test]
    fn export_scripts_writes_both_into_bin() {
        let dir = TempDir::new().expect("tempdir");
        let layout = RuntimeLayout::rooted_at(dir.path());
        std::fs::create_dir_all(layout.bin_dir()).expect("create bin");
        std::fs::write(layout.bin_dir().join("platform.jar"), b"p").expect("write jar");

        let (start_path, stop_path) =
            export_scripts(&layout, &LaunchConfig::default()).expect("export");
        assert_eq!(start_path, layout.bin_dir().join("start.sh"));
        assert_eq!(stop_path, layout.bin_dir().join("stop.sh"));

        let start = std::fs::read_to_string(&start_path).expect("read start");
        assert!(start.contains("platform.jar"));
        let stop = std::fs::read_to_string(&stop_path).expect("read stop");
        assert!(stop.contains(" -stop"));
    }
}
