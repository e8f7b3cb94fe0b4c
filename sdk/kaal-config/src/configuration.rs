//! Pipeline result
//!
//! [`Configuration`] is the single value the pipeline produces: platform
//! identification, validated containers, synthesized capability lists and the
//! merged symbol table. Downstream steps receive it by reference.
//!
//! A [`Snapshot`] caches the platform, containers and symbols as TOML for
//! later build steps. It is never authoritative: capability lists are
//! re-synthesized from the manifest on every run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::caps::{self, CapabilityLists};
use crate::cinfo;
use crate::document;
use crate::error::{Error, Result};
use crate::header;
use crate::manifest::{ContainerRecord, Manifest};
use crate::symbols::{self, SymbolTable, SymbolValue};
use crate::validate;

/// CPU name to gcc `-march` value
const GCC_ARCH_FLAGS: [(&str, &str); 5] = [
    ("ARM926", "armv5te"),
    ("ARM1136", "armv6"),
    ("ARM11MPCORE", "armv6k"),
    ("CORTEXA8", "armv7-a"),
    ("CORTEXA9", "armv7-a"),
];

const UNKNOWN: &str = "unknown";

/// Target platform, derived from feature symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub arch: String,
    pub subarch: String,
    pub platform: String,
    pub cpu: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gcc_arch_flag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchain_kernel: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toolchain_userspace: Option<String>,

    pub smp: bool,
    pub ncpu: u32,
}

impl Platform {
    /// Read the first enabled `CONFIG_ARCH_*`, `CONFIG_SUBARCH_*`,
    /// `CONFIG_PLATFORM_*` and `CONFIG_CPU_*` symbols
    pub fn from_symbols(table: &SymbolTable) -> Self {
        let cpu = selected(table, "CONFIG_CPU_");
        let gcc_arch_flag = cpu.as_deref().and_then(|cpu| {
            GCC_ARCH_FLAGS
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(cpu))
                .map(|(_, flag)| flag.to_string())
        });

        let text = |name: &str| table.get(name).and_then(SymbolValue::as_str).map(str::to_string);

        Self {
            arch: selected(table, "CONFIG_ARCH_").unwrap_or_else(|| UNKNOWN.into()),
            subarch: selected(table, "CONFIG_SUBARCH_").unwrap_or_else(|| UNKNOWN.into()),
            platform: selected(table, "CONFIG_PLATFORM_").unwrap_or_else(|| UNKNOWN.into()),
            cpu: cpu.unwrap_or_else(|| UNKNOWN.into()),
            gcc_arch_flag,
            toolchain_kernel: text("CONFIG_TOOLCHAIN_KERNEL"),
            toolchain_userspace: text("CONFIG_TOOLCHAIN_USERSPACE"),
            smp: table.is_enabled("CONFIG_SMP"),
            ncpu: table
                .get("CONFIG_NCPU")
                .and_then(SymbolValue::as_int)
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(1),
        }
    }
}

/// Lower-cased suffix of the first enabled symbol under `prefix`
fn selected(table: &SymbolTable, prefix: &str) -> Option<String> {
    table
        .iter()
        .filter(|(_, value)| value.is_enabled())
        .find_map(|(name, _)| name.strip_prefix(prefix))
        .filter(|suffix| !suffix.is_empty())
        .map(str::to_ascii_lowercase)
}

/// Everything one pipeline run produces
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub platform: Platform,
    pub manifest: Manifest,

    /// `capabilities[i]` belongs to `manifest.containers[i]`
    pub capabilities: Vec<CapabilityLists>,
    pub symbols: SymbolTable,
}

impl Configuration {
    /// Run the pipeline over manifest text and a feature symbol set
    pub fn build(features: &SymbolTable, manifest_text: &str) -> Result<Self> {
        let tree = document::parse(manifest_text)?;
        let manifest = validate::validate(&tree)?;

        let capabilities: Vec<CapabilityLists> =
            manifest.containers.iter().map(caps::synthesize).collect();
        let symbols = symbols::merge(features, &manifest.containers, &capabilities);
        let platform = Platform::from_symbols(&symbols);

        log::debug!(
            "configuration: {} container(s), {} symbols, platform {}/{}",
            manifest.containers.len(),
            symbols.len(),
            platform.arch,
            platform.cpu
        );

        Ok(Self {
            platform,
            manifest,
            capabilities,
            symbols,
        })
    }

    /// Read the feature header and manifest from disk, then [`build`](Self::build)
    pub fn load(feature_header: &Path, manifest: &Path) -> Result<Self> {
        let features = header::read_header(feature_header)?;
        let text = fs::read_to_string(manifest).map_err(|source| Error::Io {
            path: manifest.to_path_buf(),
            source,
        })?;
        Self::build(&features, &text)
    }

    pub fn containers(&self) -> &[ContainerRecord] {
        &self.manifest.containers
    }

    /// Configuration header text
    pub fn header(&self) -> String {
        header::serialize(&self.symbols)
    }

    /// Capability list C source
    pub fn cinfo(&self) -> String {
        cinfo::render(self.containers().iter().zip(&self.capabilities))
    }

    pub fn write_header(&self, path: &Path) -> Result<()> {
        header::write_header(path, &self.symbols)
    }

    pub fn write_cinfo(&self, path: &Path) -> Result<()> {
        header::write_file(path, &self.cinfo())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            platform: self.platform.clone(),
            containers: self.manifest.containers.clone(),
            symbols: self.symbols.clone(),
        }
    }
}

/// Cached result of the last run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub platform: Platform,
    pub containers: Vec<ContainerRecord>,
    pub symbols: SymbolTable,
}

impl Snapshot {
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        header::write_file(path, &self.to_toml()?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }
}
