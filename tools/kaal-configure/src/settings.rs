//! Tool settings (`kaal-config.toml`)
//!
//! ```toml
//! [paths]
//! manifest = "config/containers.yaml"
//! kconfig = "build/kconfig.h"
//! header = "include/l4/config.h"
//! cinfo = "build/cinfo.c"
//! snapshot = "build/configdata.toml"
//! ```
//!
//! Every key is optional. Command-line flags override these values.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Settings file looked up in the working directory
pub const DEFAULT_SETTINGS: &str = "kaal-config.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub paths: Paths,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Paths {
    pub manifest: Option<PathBuf>,
    pub kconfig: Option<PathBuf>,
    pub header: Option<PathBuf>,
    pub cinfo: Option<PathBuf>,
    pub snapshot: Option<PathBuf>,
}

impl Settings {
    /// Load `explicit` if given (it must exist), else `kaal-config.toml` if
    /// present, else built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None if Path::new(DEFAULT_SETTINGS).exists() => PathBuf::from(DEFAULT_SETTINGS),
            None => return Ok(Self::default()),
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read settings {}", path.display()))?;
        let settings: Settings = toml::from_str(&text)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        log::debug!("settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Manifest path: flag, then settings; there is no built-in default
    pub fn manifest(&self, flag: Option<PathBuf>) -> Result<PathBuf> {
        flag.or_else(|| self.paths.manifest.clone()).context(
            "No manifest given (pass a path or set paths.manifest in kaal-config.toml)",
        )
    }

    pub fn kconfig(&self, flag: Option<PathBuf>) -> PathBuf {
        pick(flag, &self.paths.kconfig, "build/kconfig.h")
    }

    pub fn header(&self, flag: Option<PathBuf>) -> PathBuf {
        pick(flag, &self.paths.header, "include/l4/config.h")
    }

    pub fn cinfo(&self, flag: Option<PathBuf>) -> PathBuf {
        pick(flag, &self.paths.cinfo, "build/cinfo.c")
    }

    pub fn snapshot(&self, flag: Option<PathBuf>) -> PathBuf {
        pick(flag, &self.paths.snapshot, "build/configdata.toml")
    }
}

fn pick(flag: Option<PathBuf>, configured: &Option<PathBuf>, default: &str) -> PathBuf {
    flag.or_else(|| configured.clone()).unwrap_or_else(|| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_settings() {
        let settings: Settings = toml::from_str("[paths]\nheader = \"out/config.h\"\n").unwrap();

        assert_eq!(settings.header(None), PathBuf::from("out/config.h"));
        assert_eq!(settings.header(Some("x.h".into())), PathBuf::from("x.h"));
        assert_eq!(settings.kconfig(None), PathBuf::from("build/kconfig.h"));
        assert_eq!(settings.snapshot(None), PathBuf::from("build/configdata.toml"));
        assert!(settings.manifest(None).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<Settings>("[paths]\nheadr = \"x\"\n").is_err());
    }

    #[test]
    fn empty_settings() {
        let settings: Settings = toml::from_str("").unwrap();
        assert!(settings.paths.manifest.is_none());
        assert_eq!(settings.cinfo(None), PathBuf::from("build/cinfo.c"));
    }
}
