//! Symbol Table Merger
//!
//! Builds the flat `CONFIG_*` namespace from two sources:
//! - kernel feature symbols supplied by the feature-selection system
//! - symbols derived from validated containers and their descriptors
//!
//! Container-derived symbols win on collision. The table is ordered by name
//! so every traversal is reproducible.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::caps::{CapabilityKind, CapabilityLists, CapabilityOwner, TargetMode};
use crate::manifest::{ContainerRecord, ContainerType};

/// Prefix shared by every configuration symbol
pub const SYMBOL_PREFIX: &str = "CONFIG_";

/// Number of declared containers
pub const CONTAINERS_SYMBOL: &str = "CONFIG_CONTAINERS";

/// Device flags every container carries
pub const DEVICE_FLAGS: [&str; 4] = ["UART1", "UART2", "UART3", "TIMER1"];

/// Reserved custom capability slots, always disabled
pub const CUSTOM_CAPABILITY_SLOTS: usize = 4;

/// A typed symbol value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SymbolValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl SymbolValue {
    /// Integer view; booleans count as 1/0
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SymbolValue::Bool(b) => Some(i64::from(*b)),
            SymbolValue::Int(v) => Some(*v),
            SymbolValue::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SymbolValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Set in the kconfig sense: true, or a non-zero integer
    pub fn is_enabled(&self) -> bool {
        self.as_int().is_some_and(|v| v != 0)
    }
}

impl From<bool> for SymbolValue {
    fn from(value: bool) -> Self {
        SymbolValue::Bool(value)
    }
}

impl From<i64> for SymbolValue {
    fn from(value: i64) -> Self {
        SymbolValue::Int(value)
    }
}

impl From<u64> for SymbolValue {
    fn from(value: u64) -> Self {
        SymbolValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<u32> for SymbolValue {
    fn from(value: u32) -> Self {
        SymbolValue::Int(i64::from(value))
    }
}

impl From<usize> for SymbolValue {
    fn from(value: usize) -> Self {
        SymbolValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<&str> for SymbolValue {
    fn from(value: &str) -> Self {
        SymbolValue::Str(value.to_string())
    }
}

impl From<String> for SymbolValue {
    fn from(value: String) -> Self {
        SymbolValue::Str(value)
    }
}

impl fmt::Display for SymbolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymbolValue::Bool(b) => write!(f, "{}", b),
            SymbolValue::Int(v) => write!(f, "{}", v),
            SymbolValue::Str(s) => write!(f, "\"{}\"", s),
        }
    }
}

/// Name-ordered symbol table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolTable {
    symbols: BTreeMap<String, SymbolValue>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace; returns the previous value
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<SymbolValue>,
    ) -> Option<SymbolValue> {
        self.symbols.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&SymbolValue> {
        self.symbols.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    /// Whether `name` is present and set
    pub fn is_enabled(&self, name: &str) -> bool {
        self.get(name).is_some_and(SymbolValue::is_enabled)
    }

    /// Symbols in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SymbolValue)> {
        self.symbols.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Overlay `other`; its values win
    pub fn extend(&mut self, other: SymbolTable) {
        self.symbols.extend(other.symbols);
    }
}

impl FromIterator<(String, SymbolValue)> for SymbolTable {
    fn from_iter<I: IntoIterator<Item = (String, SymbolValue)>>(iter: I) -> Self {
        Self {
            symbols: iter.into_iter().collect(),
        }
    }
}

/// Container index of a `CONFIG_CONT<n>_*` symbol
pub fn container_index(name: &str) -> Option<u32> {
    let rest = name.strip_prefix("CONFIG_CONT")?;
    let digits = rest.find(|c: char| !c.is_ascii_digit())?;
    if digits == 0 || !rest[digits..].starts_with('_') {
        return None;
    }
    rest[..digits].parse().ok()
}

/// Symbols derived from one container and its capability lists
pub fn container_symbols(container: &ContainerRecord, lists: &CapabilityLists) -> SymbolTable {
    let prefix = format!("CONFIG_CONT{}_", container.id);
    let mut table = SymbolTable::new();
    let mut put = |suffix: &str, value: SymbolValue| {
        table.insert(format!("{}{}", prefix, suffix), value);
    };

    for ty in ContainerType::ALL {
        let flag = i64::from(ty == container.container_type);
        put(&format!("TYPE_{}", ty.name().to_ascii_uppercase()), flag.into());
    }
    put("OPT_NAME", container.name.as_str().into());
    if let Some(project) = container.project {
        put(&format!("BAREMETAL_PROJ_{}", project.name().to_ascii_uppercase()), 1i64.into());
    }

    put("PAGER_LMA", container.pager.lma.into());
    put("PAGER_VMA", container.pager.vma.into());
    put("PAGER_LOAD_ADDR", container.pager.lma.into());
    put("PAGER_VIRT_ADDR", container.pager.vma.into());
    put("START_PC_ADDR", container.pager.vma.into());

    // A baremetal pager is the container: regions belong to the pager only
    let container_level = !container.is_baremetal();
    for (label, regions) in [("PHYS", &container.physical), ("VIRT", &container.virtual_regions)] {
        let count = if container_level { regions.len() } else { 0 };
        let count_name = if label == "PHYS" { "PHYSMEM_REGIONS" } else { "VIRTMEM_REGIONS" };
        put(count_name, count.into());

        for (i, region) in regions.iter().enumerate() {
            if container_level {
                put(&format!("{}{}_START", label, i), region.start.into());
                put(&format!("{}{}_END", label, i), region.end.into());
            }
            put(&format!("PAGER_{}{}_START", label, i), region.start.into());
            put(&format!("PAGER_{}{}_END", label, i), region.end.into());
        }
    }

    if let Some(regions) = &container.pager_regions {
        let spans = [
            ("SHM", regions.shm),
            ("TASK", regions.task),
            ("UTCB", regions.utcb),
        ];
        for (label, span) in spans {
            put(&format!("PAGER_{}_START", label), span.start.into());
            put(&format!("PAGER_{}_END", label), span.end.into());
        }
    }

    for owner in CapabilityOwner::ALL {
        for kind in CapabilityKind::ALL {
            let stem = format!("{}{}", owner.symbol_prefix(), kind.symbol_stem());
            let Some(descriptor) = lists.find(owner, kind) else {
                put(&format!("{}_USE", stem), 0i64.into());
                continue;
            };

            put(&format!("{}_USE", stem), 1i64.into());
            put(&format!("{}_TARGET", stem), descriptor.target.into());
            if let Some(size) = descriptor.size() {
                put(&format!("{}_SIZE", stem), size.into());
            }
            if let Some(selected) = descriptor.target_mode {
                for mode in TargetMode::ALL {
                    let flag = i64::from(mode == selected);
                    let name = format!("{}_TARGET_{}", stem, mode.name().to_ascii_uppercase());
                    put(&name, flag.into());
                }
            }
        }
    }

    for slot in 0..CUSTOM_CAPABILITY_SLOTS {
        put(&format!("PAGER_CAP_CUSTOM{}_USE", slot), 0i64.into());
    }

    for device in DEVICE_FLAGS {
        let used = container.devices.iter().any(|d| d.eq_ignore_ascii_case(device));
        put(&format!("PAGER_CAP_DEVICE_{}_USE", device), i64::from(used).into());
    }

    table
}

/// Merge feature symbols with every container's derived symbols
///
/// `capabilities[i]` belongs to `containers[i]`.
pub fn merge(
    features: &SymbolTable,
    containers: &[ContainerRecord],
    capabilities: &[CapabilityLists],
) -> SymbolTable {
    let mut table = features.clone();

    let mut derived = SymbolTable::new();
    derived.insert(CONTAINERS_SYMBOL, containers.len());
    for (container, lists) in containers.iter().zip(capabilities) {
        derived.extend(container_symbols(container, lists));
    }

    for (name, value) in derived.iter() {
        if let Some(previous) = features.get(name) {
            if previous != value {
                log::debug!("merge: {} = {} overrides feature value {}", name, value, previous);
            }
        }
    }

    table.extend(derived);
    log::debug!(
        "merge: {} feature + container symbols -> {} total",
        features.len(),
        table.len()
    );
    table
}
