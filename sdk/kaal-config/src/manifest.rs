//! Validated manifest records
//!
//! These are produced once by [`crate::validate::validate`] and only read
//! afterwards. Capability requests keep their raw kind and target names: the
//! synthesizer, not the validator, decides what is a kernel capability.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Schema version accepted by the validator
pub const SUPPORTED_SCHEMA_VERSION: i64 = 1;

/// Maximum number of containers in one manifest
pub const MAX_CONTAINERS: usize = 4;

/// Maximum physical regions per container
pub const MAX_PHYS_REGIONS: usize = 4;

/// Maximum virtual regions per container
pub const MAX_VIRT_REGIONS: usize = 6;

/// Default region alignment (one page)
pub const PAGE_SIZE: u64 = 0x1000;

/// Physical regions must start at or above this address (kernel area below)
pub const MIN_PHYS_START: u64 = 0x40000;

/// Validated manifest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub schema_version: i64,
    pub containers: Vec<ContainerRecord>,
}

/// Container type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    Baremetal,
    Posix,
}

impl ContainerType {
    pub const ALL: [ContainerType; 2] = [ContainerType::Baremetal, ContainerType::Posix];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            ContainerType::Baremetal => "baremetal",
            ContainerType::Posix => "posix",
        }
    }
}

impl fmt::Display for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Baremetal projects that ship with the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BaremetalProject {
    Empty,
    HelloWorld,
    ThreadsDemo,
    TestSuite,
    UartService,
    TimerService,
    KmiService,
    MutexDemo,
    IpcDemo,
}

impl BaremetalProject {
    pub const ALL: [BaremetalProject; 9] = [
        BaremetalProject::Empty,
        BaremetalProject::HelloWorld,
        BaremetalProject::ThreadsDemo,
        BaremetalProject::TestSuite,
        BaremetalProject::UartService,
        BaremetalProject::TimerService,
        BaremetalProject::KmiService,
        BaremetalProject::MutexDemo,
        BaremetalProject::IpcDemo,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            BaremetalProject::Empty => "empty",
            BaremetalProject::HelloWorld => "hello_world",
            BaremetalProject::ThreadsDemo => "threads_demo",
            BaremetalProject::TestSuite => "test_suite",
            BaremetalProject::UartService => "uart_service",
            BaremetalProject::TimerService => "timer_service",
            BaremetalProject::KmiService => "kmi_service",
            BaremetalProject::MutexDemo => "mutex_demo",
            BaremetalProject::IpcDemo => "ipc_demo",
        }
    }

    /// Comma-separated list for diagnostics
    pub fn valid_names() -> String {
        Self::ALL.map(|p| p.name()).join(", ")
    }
}

/// Physical or virtual
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Physical,
    Virtual,
}

impl RegionKind {
    pub fn name(self) -> &'static str {
        match self {
            RegionKind::Physical => "physical",
            RegionKind::Virtual => "virtual",
        }
    }

    pub fn max_regions(self) -> usize {
        match self {
            RegionKind::Physical => MAX_PHYS_REGIONS,
            RegionKind::Virtual => MAX_VIRT_REGIONS,
        }
    }
}

/// Half-open memory range `[start, end)`
///
/// Invariants (enforced by the validator): `end > start`,
/// `start % align == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRegion {
    pub start: u64,
    pub end: u64,
    pub align: u64,
}

impl MemoryRegion {
    pub fn contains(&self, addr: u64) -> bool {
        self.start <= addr && addr < self.end
    }

    pub fn overlaps(&self, other: &MemoryRegion) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn size(&self) -> u64 {
        self.end - self.start
    }
}

/// Pager load and virtual address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pager {
    pub lma: u64,
    pub vma: u64,
}

/// Named pager sub-regions of a posix container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagerRegions {
    pub shm: Span,
    pub task: Span,
    pub utcb: Span,
}

/// Plain `[start, end)` range with no alignment constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: u64,
    pub end: u64,
}

/// Kernel resource pools
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Thread,
    Space,
    Mutex,
    Map,
    Cap,
}

impl PoolKind {
    pub const ALL: [PoolKind; 5] = [
        PoolKind::Thread,
        PoolKind::Space,
        PoolKind::Mutex,
        PoolKind::Map,
        PoolKind::Cap,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Manifest key under `capabilities.pools`
    pub fn name(self) -> &'static str {
        match self {
            PoolKind::Thread => "thread",
            PoolKind::Space => "space",
            PoolKind::Mutex => "mutex",
            PoolKind::Map => "map",
            PoolKind::Cap => "cap",
        }
    }
}

/// Target of a capability request, as written in the manifest
///
/// `mode` stays a raw string: unknown modes are dropped by the synthesizer,
/// never rejected here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

impl TargetRequest {
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.id.is_none()
    }
}

/// One entry of `capabilities.pools`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRequest {
    pub kind: PoolKind,
    pub enabled: bool,

    /// Always present when `enabled`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "TargetRequest::is_empty")]
    pub target: TargetRequest,
}

/// A named capability block (`ipc`, `tctrl`, ...), kind not yet resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRequest {
    pub name: String,
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "TargetRequest::is_empty")]
    pub target: TargetRequest,
}

/// Capability requests of one container, split by owning role
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityRequests {
    /// All five pools, in [`PoolKind::ALL`] order
    pub pools: Vec<PoolRequest>,

    /// Named blocks directly under `capabilities`
    #[serde(default)]
    pub pager: Vec<CapabilityRequest>,

    /// Blocks under `capabilities.container`
    #[serde(default)]
    pub container: Vec<CapabilityRequest>,
}

impl CapabilityRequests {
    pub fn pool(&self, kind: PoolKind) -> Option<&PoolRequest> {
        self.pools.iter().find(|p| p.kind == kind)
    }
}

/// One validated container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerRecord {
    /// Equals the container's index in `containers`
    pub id: u32,
    pub name: String,

    #[serde(rename = "type")]
    pub container_type: ContainerType,

    /// Baremetal only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<BaremetalProject>,

    /// Declaration order
    pub physical: Vec<MemoryRegion>,

    /// Declaration order
    pub virtual_regions: Vec<MemoryRegion>,

    pub pager: Pager,

    /// Posix only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pager_regions: Option<PagerRegions>,

    pub capabilities: CapabilityRequests,

    /// Device names from `devices`, lower-case
    #[serde(default)]
    pub devices: Vec<String>,
}

impl ContainerRecord {
    pub fn regions(&self, kind: RegionKind) -> &[MemoryRegion] {
        match kind {
            RegionKind::Physical => &self.physical,
            RegionKind::Virtual => &self.virtual_regions,
        }
    }

    pub fn is_baremetal(&self) -> bool {
        self.container_type == ContainerType::Baremetal
    }
}
