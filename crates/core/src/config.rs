//! Rebuild configuration.

use apkrebuild_common::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the signing keystore path.
pub const KEYSTORE_ENV: &str = "APKREBUILD_KEYSTORE";

/// Environment variables naming extra Android SDK roots, in search order.
pub const SDK_ROOT_ENVS: [&str; 2] = ["ANDROID_HOME", "ANDROID_SDK_ROOT"];

pub const DEFAULT_KEYSTORE: &str = "my.keystore";

/// Network security config trusting both system and user certificate stores.
pub const NETWORK_SECURITY_CONFIG: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<network-security-config>
    <base-config>
        <trust-anchors>
            <certificates src="system" />
            <certificates src="user" />
        </trust-anchors>
    </base-config>
    <debug-overrides>
        <trust-anchors>
            <certificates src="system" />
            <certificates src="user" />
        </trust-anchors>
    </debug-overrides>
</network-security-config>
"#;

/// Settings for a rebuild run.
#[derive(Debug, Clone)]
pub struct RebuildConfig {
    /// Keystore used for signing, created on first use.
    pub keystore: PathBuf,
    /// Zip alignment boundary in bytes.
    pub alignment: u32,
    /// SDK roots searched before the platform default.
    pub sdk_roots: Vec<PathBuf>,
    pub unpacked_suffix: String,
    pub aligned_suffix: String,
    pub security_config: String,
}

impl Default for RebuildConfig {
    fn default() -> Self {
        Self {
            keystore: PathBuf::from(DEFAULT_KEYSTORE),
            alignment: 4,
            sdk_roots: Vec::new(),
            unpacked_suffix: "_unpacked".to_string(),
            aligned_suffix: "_aligned".to_string(),
            security_config: NETWORK_SECURITY_CONFIG.to_string(),
        }
    }
}

impl RebuildConfig {
    /// Defaults with overrides from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var_os(key))
    }

    /// Defaults with overrides from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<OsString>,
    {
        let mut config = Self::default();

        if let Some(keystore) = lookup(KEYSTORE_ENV) {
            if keystore.is_empty() {
                return Err(Error::Config(format!("{} is set but empty", KEYSTORE_ENV)));
            }
            config.keystore = PathBuf::from(keystore);
        }

        for key in SDK_ROOT_ENVS {
            if let Some(root) = lookup(key).filter(|value| !value.is_empty()) {
                let root = PathBuf::from(root);
                if !config.sdk_roots.contains(&root) {
                    config.sdk_roots.push(root);
                }
            }
        }

        Ok(config)
    }

    /// Working directory the package is unpacked into.
    pub fn unpacked_dir(&self, input: &Path) -> PathBuf {
        with_suffix(input, &self.unpacked_suffix)
    }

    /// Intermediate path the aligner writes to.
    pub fn aligned_path(&self, output: &Path) -> PathBuf {
        with_suffix(output, &self.aligned_suffix)
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
