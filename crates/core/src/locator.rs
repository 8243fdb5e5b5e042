//! Discovery of the Android and Java tools on the host.
//!
//! Each platform describes where its tools live through a [`ToolLayout`];
//! [`ToolLocator`] turns that description into a path with one generic
//! search.

use crate::config::RebuildConfig;
use apkrebuild_common::{Error, OsType, Result};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// External tools the rebuild depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Apktool,
    Zipalign,
    Apksigner,
    Keytool,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::Apktool => "apktool",
            Tool::Zipalign => "zipalign",
            Tool::Apksigner => "apksigner",
            Tool::Keytool => "keytool",
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How to find one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchStrategy {
    /// Walk `roots` in order and take the first file called `file_name`.
    Walk {
        roots: Vec<PathBuf>,
        file_name: String,
    },
    /// Resolve `name` through the `PATH` environment variable.
    OnPath { name: String },
}

/// Trait for per-platform tool locations.
pub trait ToolLayout: Send + Sync {
    /// Where `tool` should be looked for.
    fn strategy(&self, tool: Tool) -> SearchStrategy;
}

/// Program Files variables searched for a Java install, in order.
const PROGRAM_FILES_ENVS: [&str; 2] = ["ProgramFiles(x86)", "ProgramFiles"];

/// Windows: SDK under `%LocalAppData%\Android`, Java under Program Files.
pub struct WindowsLayout {
    sdk_roots: Vec<PathBuf>,
    java_roots: Vec<PathBuf>,
}

impl WindowsLayout {
    pub fn new(sdk_roots: Vec<PathBuf>, java_roots: Vec<PathBuf>) -> Self {
        Self {
            sdk_roots,
            java_roots,
        }
    }

    /// Layout for this machine, with configured SDK roots searched first.
    pub fn detect(config: &RebuildConfig) -> Self {
        Self::from_lookup(config, dirs::data_local_dir(), |key| std::env::var_os(key))
    }

    /// Layout from an explicit local app data directory and variable lookup.
    ///
    /// SDK roots: configured roots, then `<local>\Android`. Java roots:
    /// `%ProgramFiles(x86)%\Java`, then `%ProgramFiles%\Java`.
    pub fn from_lookup<F>(
        config: &RebuildConfig,
        local_data: Option<PathBuf>,
        lookup: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut sdk_roots = config.sdk_roots.clone();
        if let Some(local) = local_data {
            sdk_roots.push(local.join("Android"));
        }

        let java_roots = PROGRAM_FILES_ENVS
            .iter()
            .filter_map(|key| lookup(key))
            .filter(|dir| !dir.is_empty())
            .map(|dir| PathBuf::from(dir).join("Java"))
            .collect();

        Self::new(sdk_roots, java_roots)
    }
}

impl ToolLayout for WindowsLayout {
    fn strategy(&self, tool: Tool) -> SearchStrategy {
        match tool {
            Tool::Apktool => SearchStrategy::OnPath {
                name: "apktool".to_string(),
            },
            Tool::Zipalign => SearchStrategy::Walk {
                roots: self.sdk_roots.clone(),
                file_name: "zipalign.exe".to_string(),
            },
            Tool::Apksigner => SearchStrategy::Walk {
                roots: self.sdk_roots.clone(),
                file_name: "apksigner.bat".to_string(),
            },
            Tool::Keytool => SearchStrategy::Walk {
                roots: self.java_roots.clone(),
                file_name: "keytool.exe".to_string(),
            },
        }
    }
}

/// macOS: build tools under `~/Library/Android/sdk/build-tools`, Java on `PATH`.
pub struct MacOsLayout {
    build_tools_roots: Vec<PathBuf>,
}

impl MacOsLayout {
    pub fn new(build_tools_roots: Vec<PathBuf>) -> Self {
        Self { build_tools_roots }
    }

    /// Layout for this machine, with configured SDK roots searched first.
    pub fn detect(config: &RebuildConfig) -> Self {
        let mut roots: Vec<PathBuf> = config
            .sdk_roots
            .iter()
            .map(|root| root.join("build-tools"))
            .collect();
        if let Some(home) = dirs::home_dir() {
            roots.push(home.join("Library/Android/sdk/build-tools"));
        }

        Self::new(roots)
    }
}

impl ToolLayout for MacOsLayout {
    fn strategy(&self, tool: Tool) -> SearchStrategy {
        match tool {
            Tool::Apktool | Tool::Keytool => SearchStrategy::OnPath {
                name: tool.name().to_string(),
            },
            Tool::Zipalign | Tool::Apksigner => SearchStrategy::Walk {
                roots: self.build_tools_roots.clone(),
                file_name: tool.name().to_string(),
            },
        }
    }
}

/// Resolves tools to paths using a platform layout.
pub struct ToolLocator {
    layout: Box<dyn ToolLayout>,
}

impl ToolLocator {
    pub fn new(layout: Box<dyn ToolLayout>) -> Self {
        Self { layout }
    }

    /// Locator for the given host platform.
    pub fn for_os(os: OsType, config: &RebuildConfig) -> Self {
        match os {
            OsType::Windows => Self::new(Box::new(WindowsLayout::detect(config))),
            OsType::MacOs => Self::new(Box::new(MacOsLayout::detect(config))),
        }
    }

    /// First matching path for `tool`, if any.
    ///
    /// The result is not checked for being executable.
    pub fn locate(&self, tool: Tool) -> Option<PathBuf> {
        let found = match self.layout.strategy(tool) {
            SearchStrategy::Walk { roots, file_name } => find_in_roots(&roots, &file_name),
            SearchStrategy::OnPath { name } => which::which(&name).ok(),
        };

        match &found {
            Some(path) => debug!("Located {} at {:?}", tool, path),
            None => warn!("Could not locate {}", tool),
        }
        found
    }

    /// Like [`ToolLocator::locate`], but a miss is an error.
    pub fn require(&self, tool: Tool) -> Result<PathBuf> {
        self.locate(tool)
            .ok_or_else(|| Error::ToolNotFound(tool.name().to_string()))
    }
}

/// Walk each root in order, visiting entries sorted by file name, and return
/// the first regular file named `file_name`.
pub fn find_in_roots(roots: &[PathBuf], file_name: &str) -> Option<PathBuf> {
    let wanted = OsString::from(file_name);
    roots
        .iter()
        .filter(|root| root.is_dir())
        .find_map(|root| find_in_root(root, &wanted))
}

fn find_in_root(root: &Path, wanted: &OsString) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| entry.file_type().is_file() && entry.file_name() == wanted.as_os_str())
        .map(|entry| entry.into_path())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    #[test]
    fn test_first_match_in_name_order() {
        let dir = tempdir().unwrap();
        let tools = dir.path().join("build-tools");
        touch(&tools.join("34.0.0").join("zipalign"));
        touch(&tools.join("30.0.3").join("zipalign"));

        let found = find_in_roots(&[tools.clone()], "zipalign").unwrap();
        assert_eq!(found, tools.join("30.0.3").join("zipalign"));
    }

    #[test]
    fn test_roots_searched_in_order() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        touch(&second.join("apksigner"));
        touch(&first.join("nested").join("apksigner"));

        let found = find_in_roots(&[first.clone(), second], "apksigner").unwrap();
        assert_eq!(found, first.join("nested").join("apksigner"));
    }

    #[test]
    fn test_directories_and_missing_roots_ignored() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("zipalign")).unwrap();

        assert!(find_in_roots(&[dir.path().to_path_buf()], "zipalign").is_none());
        assert!(find_in_roots(&[dir.path().join("absent")], "zipalign").is_none());
        assert!(find_in_roots(&[], "zipalign").is_none());
    }

    #[test]
    fn test_windows_layout() {
        let dir = tempdir().unwrap();
        let sdk = dir.path().join("Android");
        let java = dir.path().join("Java");
        touch(&sdk.join("Sdk/build-tools/33.0.1/zipalign.exe"));
        touch(&sdk.join("Sdk/build-tools/33.0.1/apksigner.bat"));
        touch(&java.join("jdk-17/bin/keytool.exe"));

        let locator = ToolLocator::new(Box::new(WindowsLayout::new(
            vec![sdk.clone()],
            vec![java.clone()],
        )));

        assert_eq!(
            locator.locate(Tool::Zipalign),
            Some(sdk.join("Sdk/build-tools/33.0.1/zipalign.exe"))
        );
        assert_eq!(
            locator.locate(Tool::Apksigner),
            Some(sdk.join("Sdk/build-tools/33.0.1/apksigner.bat"))
        );
        assert_eq!(
            locator.locate(Tool::Keytool),
            Some(java.join("jdk-17/bin/keytool.exe"))
        );
    }

    #[test]
    fn test_windows_roots_order() {
        let config = RebuildConfig {
            sdk_roots: vec![PathBuf::from(r"D:\sdk")],
            ..Default::default()
        };
        let layout = WindowsLayout::from_lookup(
            &config,
            Some(PathBuf::from(r"C:\Users\dev\AppData\Local")),
            |key| match key {
                "ProgramFiles" => Some(OsString::from(r"C:\Program Files")),
                "ProgramFiles(x86)" => Some(OsString::from(r"C:\Program Files (x86)")),
                _ => None,
            },
        );

        assert_eq!(
            layout.strategy(Tool::Zipalign),
            SearchStrategy::Walk {
                roots: vec![
                    PathBuf::from(r"D:\sdk"),
                    PathBuf::from(r"C:\Users\dev\AppData\Local").join("Android"),
                ],
                file_name: "zipalign.exe".to_string(),
            }
        );
        assert_eq!(
            layout.strategy(Tool::Keytool),
            SearchStrategy::Walk {
                roots: vec![
                    PathBuf::from(r"C:\Program Files (x86)").join("Java"),
                    PathBuf::from(r"C:\Program Files").join("Java"),
                ],
                file_name: "keytool.exe".to_string(),
            }
        );
    }

    #[test]
    fn test_windows_roots_skip_unset_variables() {
        let layout = WindowsLayout::from_lookup(&RebuildConfig::default(), None, |key| {
            (key == "ProgramFiles").then(|| OsString::from(r"C:\Program Files"))
        });

        assert_eq!(
            layout.strategy(Tool::Apksigner),
            SearchStrategy::Walk {
                roots: Vec::new(),
                file_name: "apksigner.bat".to_string(),
            }
        );
        assert_eq!(
            layout.strategy(Tool::Keytool),
            SearchStrategy::Walk {
                roots: vec![PathBuf::from(r"C:\Program Files").join("Java")],
                file_name: "keytool.exe".to_string(),
            }
        );
    }

    #[test]
    fn test_macos_layout_strategies() {
        let layout = MacOsLayout::new(vec![PathBuf::from("/sdk/build-tools")]);

        assert_eq!(
            layout.strategy(Tool::Zipalign),
            SearchStrategy::Walk {
                roots: vec![PathBuf::from("/sdk/build-tools")],
                file_name: "zipalign".to_string(),
            }
        );
        assert_eq!(
            layout.strategy(Tool::Keytool),
            SearchStrategy::OnPath {
                name: "keytool".to_string()
            }
        );
    }

    #[test]
    fn test_macos_detect_prefers_configured_sdk() {
        let config = RebuildConfig {
            sdk_roots: vec![PathBuf::from("/opt/android")],
            ..Default::default()
        };
        let layout = MacOsLayout::detect(&config);

        match layout.strategy(Tool::Apksigner) {
            SearchStrategy::Walk { roots, .. } => {
                assert_eq!(roots[0], PathBuf::from("/opt/android/build-tools"));
            }
            other => panic!("unexpected strategy: {:?}", other),
        }
    }

    #[test]
    fn test_require_reports_missing_tool() {
        let dir = tempdir().unwrap();
        let locator = ToolLocator::new(Box::new(MacOsLayout::new(vec![dir.path().to_path_buf()])));

        let err = locator.require(Tool::Zipalign).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(ref name) if name == "zipalign"));
    }
}
