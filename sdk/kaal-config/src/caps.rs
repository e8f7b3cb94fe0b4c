//! Capability Descriptor Synthesizer
//!
//! Expands a validated container's capability requests into fully resolved
//! [`Descriptor`] records, one list per owning role (pager, container).
//!
//! ## Design
//!
//! - Descriptors are typed records; C text is produced separately by
//!   [`crate::cinfo`]
//! - Output follows [`CapabilityKind::ALL`] order, never manifest order, so
//!   repeated runs are byte-identical
//! - The pager list always carries `tctrl` and `exregs`
//! - Unknown capability kinds and unknown target modes are dropped, logged at
//!   `debug` only

use core::fmt;

use bitflags::bitflags;

use crate::manifest::{CapabilityRequest, ContainerRecord, PoolKind, TargetRequest};

/// Kernel capability kinds, in slot order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityKind {
    Ipc,
    Tctrl,
    Exregs,
    Irqctrl,
    Capctrl,
    Umutex,
    Pool(PoolKind),
}

impl CapabilityKind {
    /// Catalogue order; slot indices follow it
    pub const ALL: [CapabilityKind; 11] = [
        CapabilityKind::Ipc,
        CapabilityKind::Tctrl,
        CapabilityKind::Exregs,
        CapabilityKind::Irqctrl,
        CapabilityKind::Capctrl,
        CapabilityKind::Umutex,
        CapabilityKind::Pool(PoolKind::Thread),
        CapabilityKind::Pool(PoolKind::Space),
        CapabilityKind::Pool(PoolKind::Mutex),
        CapabilityKind::Pool(PoolKind::Map),
        CapabilityKind::Pool(PoolKind::Cap),
    ];

    /// Look up a manifest block name; `None` for anything outside the catalogue
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Manifest name (`ipc`, `thread`, ...)
    pub fn name(self) -> &'static str {
        match self {
            CapabilityKind::Ipc => "ipc",
            CapabilityKind::Tctrl => "tctrl",
            CapabilityKind::Exregs => "exregs",
            CapabilityKind::Irqctrl => "irqctrl",
            CapabilityKind::Capctrl => "capctrl",
            CapabilityKind::Umutex => "umutex",
            CapabilityKind::Pool(pool) => pool.name(),
        }
    }

    /// Upper-case stem used in symbol names (`IPC`, `THREADPOOL`, ...)
    pub fn symbol_stem(self) -> String {
        match self {
            CapabilityKind::Pool(pool) => format!("{}POOL", pool.name().to_ascii_uppercase()),
            other => other.name().to_ascii_uppercase(),
        }
    }

    pub fn is_pool(self) -> bool {
        matches!(self, CapabilityKind::Pool(_))
    }

    /// Resource type used when no explicit target mode applies
    pub fn default_resource(self) -> ResourceType {
        match self {
            CapabilityKind::Pool(pool) => ResourceType::for_pool(pool),
            _ => ResourceType::Container,
        }
    }

    fn cap_type(self) -> CapType {
        match self {
            CapabilityKind::Ipc => CapType::IPC,
            CapabilityKind::Tctrl => CapType::TCTRL,
            CapabilityKind::Exregs => CapType::EXREGS,
            CapabilityKind::Irqctrl => CapType::IRQCTRL,
            CapabilityKind::Capctrl => CapType::CAP,
            CapabilityKind::Umutex => CapType::UMUTEX,
            CapabilityKind::Pool(_) => CapType::QUANTITY,
        }
    }

    fn access(self) -> Access {
        let generic =
            GenericRights::CHANGEABLE | GenericRights::REPLICABLE | GenericRights::TRANSFERABLE;
        let rights = match self {
            CapabilityKind::Ipc => Rights::Ipc(IpcRights::DEFAULT),
            CapabilityKind::Tctrl => Rights::Tctrl(TctrlRights::all()),
            CapabilityKind::Exregs => Rights::Exregs(ExregsRights::all()),
            CapabilityKind::Irqctrl => Rights::Irqctrl(IrqctrlRights::all()),
            CapabilityKind::Capctrl => Rights::CapCtrl(CapCtrlRights::all()),
            CapabilityKind::Umutex => Rights::Umutex(UmutexRights::all()),
            CapabilityKind::Pool(_) => {
                return Access {
                    rights: Rights::Quantity,
                    generic: GenericRights::CHANGEABLE | GenericRights::TRANSFERABLE,
                }
            }
        };
        Access { rights, generic }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a capability's target is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetMode {
    CurrentContainer,
    CurrentPagerSpace,
    OtherContainer,
    OtherPager,
}

impl TargetMode {
    pub const ALL: [TargetMode; 4] = [
        TargetMode::CurrentContainer,
        TargetMode::CurrentPagerSpace,
        TargetMode::OtherContainer,
        TargetMode::OtherPager,
    ];

    /// Case-insensitive lookup; `None` for unrecognized modes
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            TargetMode::CurrentContainer => "current_container",
            TargetMode::CurrentPagerSpace => "current_pager_space",
            TargetMode::OtherContainer => "other_container",
            TargetMode::OtherPager => "other_pager",
        }
    }

    /// Resource type tag the mode resolves to
    pub fn resource(self) -> ResourceType {
        match self {
            TargetMode::CurrentContainer | TargetMode::OtherContainer => ResourceType::Container,
            TargetMode::CurrentPagerSpace => ResourceType::Space,
            TargetMode::OtherPager => ResourceType::Thread,
        }
    }

    /// Whether the owning container's id is substituted (otherwise the
    /// manifest must supply one)
    pub fn uses_own_id(self) -> bool {
        matches!(self, TargetMode::CurrentContainer | TargetMode::CurrentPagerSpace)
    }
}

/// Kernel resource type tags
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    Thread = 1 << 16,
    Space = 1 << 18,
    Container = 1 << 19,
    ThreadPool = 1 << 24,
    SpacePool = 1 << 25,
    MutexPool = 1 << 26,
    MapPool = 1 << 27,
    CapPool = 1 << 28,
}

impl ResourceType {
    pub fn for_pool(pool: PoolKind) -> Self {
        match pool {
            PoolKind::Thread => ResourceType::ThreadPool,
            PoolKind::Space => ResourceType::SpacePool,
            PoolKind::Mutex => ResourceType::MutexPool,
            PoolKind::Map => ResourceType::MapPool,
            PoolKind::Cap => ResourceType::CapPool,
        }
    }

    pub fn bits(self) -> u32 {
        self as u32
    }

    /// C macro name
    pub fn c_name(self) -> &'static str {
        match self {
            ResourceType::Thread => "CAP_RTYPE_THREAD",
            ResourceType::Space => "CAP_RTYPE_SPACE",
            ResourceType::Container => "CAP_RTYPE_CONTAINER",
            ResourceType::ThreadPool => "CAP_RTYPE_THREADPOOL",
            ResourceType::SpacePool => "CAP_RTYPE_SPACEPOOL",
            ResourceType::MutexPool => "CAP_RTYPE_MUTEXPOOL",
            ResourceType::MapPool => "CAP_RTYPE_MAPPOOL",
            ResourceType::CapPool => "CAP_RTYPE_CAPPOOL",
        }
    }
}

bitflags! {
    /// Capability type bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapType: u32 {
        const TCTRL    = 1 << 0;
        const EXREGS   = 1 << 1;
        const MAP      = 1 << 2;
        const IPC      = 1 << 3;
        const SCHED    = 1 << 4;
        const UMUTEX   = 1 << 5;
        const QUANTITY = 1 << 6;
        const CAP      = 1 << 7;
        const IRQCTRL  = 1 << 8;
    }
}

bitflags! {
    /// Thread control rights
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TctrlRights: u32 {
        const CREATE  = 1 << 0;
        const DESTROY = 1 << 1;
        const SUSPEND = 1 << 2;
        const RUN     = 1 << 3;
        const RECYCLE = 1 << 4;
        const WAIT    = 1 << 5;
    }
}

bitflags! {
    /// Exchange-registers rights
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExregsRights: u32 {
        const RW_PAGER = 1 << 0;
        const RW_UTCB  = 1 << 1;
        const RW_SP    = 1 << 2;
        const RW_PC    = 1 << 3;
        const RW_REGS  = 1 << 4;
    }
}

bitflags! {
    /// IPC rights
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IpcRights: u32 {
        const SEND     = 1 << 0;
        const RECV     = 1 << 1;
        const SHORT    = 1 << 2;
        const FULL     = 1 << 3;
        const EXTENDED = 1 << 4;
        const ASYNC    = 1 << 5;

        /// Everything but ASYNC
        const DEFAULT  = Self::SEND.bits()
                       | Self::RECV.bits()
                       | Self::SHORT.bits()
                       | Self::FULL.bits()
                       | Self::EXTENDED.bits();
    }
}

bitflags! {
    /// IRQ control rights
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IrqctrlRights: u32 {
        const REGISTER = 1 << 0;
        const WAIT     = 1 << 1;
    }
}

bitflags! {
    /// Capability control rights
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CapCtrlRights: u32 {
        const MODIFY = 1 << 0;
        const GRANT  = 1 << 1;
        const READ   = 1 << 2;
        const SHARE  = 1 << 3;
    }
}

bitflags! {
    /// Userspace mutex rights
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UmutexRights: u32 {
        const LOCK   = 1 << 0;
        const UNLOCK = 1 << 1;
    }
}

bitflags! {
    /// Rights shared by every capability family
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct GenericRights: u32 {
        const CHANGEABLE   = 1 << 28;
        const REPLICABLE   = 1 << 29;
        const TRANSFERABLE = 1 << 30;
    }
}

/// Family-specific rights of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rights {
    Tctrl(TctrlRights),
    Exregs(ExregsRights),
    Ipc(IpcRights),
    Irqctrl(IrqctrlRights),
    CapCtrl(CapCtrlRights),
    Umutex(UmutexRights),
    /// Quantity capabilities carry no family rights
    Quantity,
}

/// Complete access mask of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Access {
    pub rights: Rights,
    pub generic: GenericRights,
}

impl Access {
    pub fn bits(&self) -> u32 {
        let family = match self.rights {
            Rights::Tctrl(r) => r.bits(),
            Rights::Exregs(r) => r.bits(),
            Rights::Ipc(r) => r.bits(),
            Rights::Irqctrl(r) => r.bits(),
            Rights::CapCtrl(r) => r.bits(),
            Rights::Umutex(r) => r.bits(),
            Rights::Quantity => 0,
        };
        family | self.generic.bits()
    }

    /// C macro names, family rights first, in declaration order
    pub fn c_names(&self) -> Vec<String> {
        let (prefix, family): (&str, Vec<&'static str>) = match self.rights {
            Rights::Tctrl(r) => ("CAP_TCTRL", r.iter_names().map(|(n, _)| n).collect()),
            Rights::Exregs(r) => ("CAP_EXREGS", r.iter_names().map(|(n, _)| n).collect()),
            Rights::Ipc(r) => ("CAP_IPC", r.iter_names().map(|(n, _)| n).collect()),
            Rights::Irqctrl(r) => ("CAP_IRQCTRL", r.iter_names().map(|(n, _)| n).collect()),
            Rights::CapCtrl(r) => ("CAP_CAP", r.iter_names().map(|(n, _)| n).collect()),
            Rights::Umutex(r) => ("CAP_UMUTEX", r.iter_names().map(|(n, _)| n).collect()),
            Rights::Quantity => ("", Vec::new()),
        };

        let mut names: Vec<String> = family
            .into_iter()
            .map(|n| format!("{}_{}", prefix, n))
            .collect();
        names.extend(self.generic.iter_names().map(|(n, _)| format!("CAP_{}", n)));
        names
    }
}

/// Numeric range or size of a descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extent {
    None,
    /// Quantity capabilities
    Size(u64),
    /// Symbolic platform IRQ range
    IrqRange,
}

/// Which role owns a capability list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityOwner {
    Pager,
    Container,
}

impl CapabilityOwner {
    pub const ALL: [CapabilityOwner; 2] = [CapabilityOwner::Pager, CapabilityOwner::Container];

    /// Symbol-name prefix after the container prefix
    pub fn symbol_prefix(self) -> &'static str {
        match self {
            CapabilityOwner::Pager => "PAGER_CAP_",
            CapabilityOwner::Container => "CAP_",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CapabilityOwner::Pager => "pager",
            CapabilityOwner::Container => "container",
        }
    }
}

/// A fully resolved capability
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
    /// Index within the owning list
    pub slot: usize,
    pub kind: CapabilityKind,
    pub cap_type: CapType,
    pub resource: ResourceType,
    pub target: u32,

    /// Target selector; pools carry one only when they name a mode
    pub target_mode: Option<TargetMode>,
    pub access: Access,
    pub extent: Extent,
}

impl Descriptor {
    pub fn size(&self) -> Option<u64> {
        match self.extent {
            Extent::Size(size) => Some(size),
            _ => None,
        }
    }
}

/// Capability lists of one container
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CapabilityLists {
    pub pager: Vec<Descriptor>,
    pub container: Vec<Descriptor>,
}

impl CapabilityLists {
    pub fn list(&self, owner: CapabilityOwner) -> &[Descriptor] {
        match owner {
            CapabilityOwner::Pager => &self.pager,
            CapabilityOwner::Container => &self.container,
        }
    }

    pub fn find(&self, owner: CapabilityOwner, kind: CapabilityKind) -> Option<&Descriptor> {
        self.list(owner).iter().find(|d| d.kind == kind)
    }
}

/// Synthesize both capability lists of a validated container
pub fn synthesize(container: &ContainerRecord) -> CapabilityLists {
    let requests = &container.capabilities;

    for request in requests.pager.iter().chain(&requests.container) {
        if CapabilityKind::from_name(&request.name).is_none() {
            log::debug!(
                "container {}: ignoring '{}', not a kernel capability",
                container.id,
                request.name
            );
        }
    }

    let mut pager = Vec::new();
    for kind in CapabilityKind::ALL {
        let resolved = match kind {
            CapabilityKind::Tctrl | CapabilityKind::Exregs => {
                Some(default_descriptor(kind, container.id))
            }
            CapabilityKind::Pool(pool) => requests
                .pool(pool)
                .filter(|p| p.enabled)
                .and_then(|p| resolve(kind, &p.target, p.size, container.id)),
            _ => enabled_request(&requests.pager, kind)
                .and_then(|r| resolve(kind, &r.target, r.size, container.id)),
        };
        push(&mut pager, resolved);
    }

    let mut own = Vec::new();
    for kind in CapabilityKind::ALL {
        let resolved = enabled_request(&requests.container, kind)
            .and_then(|r| resolve(kind, &r.target, r.size, container.id));
        push(&mut own, resolved);
    }

    log::debug!(
        "container {}: {} pager capabilities, {} container capabilities",
        container.id,
        pager.len(),
        own.len()
    );

    CapabilityLists {
        pager,
        container: own,
    }
}

fn push(list: &mut Vec<Descriptor>, descriptor: Option<Descriptor>) {
    if let Some(mut descriptor) = descriptor {
        descriptor.slot = list.len();
        list.push(descriptor);
    }
}

fn enabled_request(
    requests: &[CapabilityRequest],
    kind: CapabilityKind,
) -> Option<&CapabilityRequest> {
    requests
        .iter()
        .find(|r| r.enabled && CapabilityKind::from_name(&r.name) == Some(kind))
}

fn default_descriptor(kind: CapabilityKind, container_id: u32) -> Descriptor {
    Descriptor {
        slot: 0,
        kind,
        cap_type: kind.cap_type(),
        resource: ResourceType::Container,
        target: container_id,
        target_mode: Some(TargetMode::CurrentContainer),
        access: kind.access(),
        extent: Extent::None,
    }
}

/// Resolve target and extent; `None` means the capability is dropped
///
/// A non-pool capability without a mode targets the current container.
fn resolve(
    kind: CapabilityKind,
    target: &TargetRequest,
    size: Option<u64>,
    container_id: u32,
) -> Option<Descriptor> {
    let (resource, id, target_mode) = match &target.mode {
        Some(name) => {
            let Some(mode) = TargetMode::from_name(name) else {
                log::debug!(
                    "container {}: {} has unknown target mode '{}', skipped",
                    container_id,
                    kind,
                    name
                );
                return None;
            };
            let id = if mode.uses_own_id() {
                container_id
            } else if let Some(id) = target.id {
                id
            } else {
                log::debug!(
                    "container {}: {} targets {} without an id, skipped",
                    container_id,
                    kind,
                    mode.name()
                );
                return None;
            };
            // Quantity capabilities keep their pool tag whatever the mode
            let resource = if kind.is_pool() {
                kind.default_resource()
            } else {
                mode.resource()
            };
            (resource, id, Some(mode))
        }
        None => {
            let mode = (!kind.is_pool()).then_some(TargetMode::CurrentContainer);
            (kind.default_resource(), target.id.unwrap_or(container_id), mode)
        }
    };

    let extent = match kind {
        CapabilityKind::Pool(_) => Extent::Size(size.unwrap_or(0)),
        CapabilityKind::Irqctrl => Extent::IrqRange,
        _ => Extent::None,
    };

    Some(Descriptor {
        slot: 0,
        kind,
        cap_type: kind.cap_type(),
        resource,
        target: id,
        target_mode,
        access: kind.access(),
        extent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::{
        BaremetalProject, CapabilityRequests, ContainerType, MemoryRegion, Pager, PoolRequest,
        PAGE_SIZE,
    };

    fn container(id: u32, pools_enabled: bool) -> ContainerRecord {
        ContainerRecord {
            id,
            name: format!("c{}", id),
            container_type: ContainerType::Baremetal,
            project: Some(BaremetalProject::Empty),
            physical: vec![MemoryRegion {
                start: 0x100000,
                end: 0xe00000,
                align: PAGE_SIZE,
            }],
            virtual_regions: vec![MemoryRegion {
                start: 0xa0000000,
                end: 0xb0000000,
                align: PAGE_SIZE,
            }],
            pager: Pager {
                lma: 0x100000,
                vma: 0xa0000000,
            },
            pager_regions: None,
            capabilities: CapabilityRequests {
                pools: PoolKind::ALL
                    .into_iter()
                    .map(|kind| PoolRequest {
                        kind,
                        enabled: pools_enabled,
                        size: pools_enabled.then_some(32),
                        target: TargetRequest::default(),
                    })
                    .collect(),
                pager: Vec::new(),
                container: Vec::new(),
            },
            devices: Vec::new(),
        }
    }

    fn request(name: &str, mode: Option<&str>, id: Option<u32>) -> CapabilityRequest {
        CapabilityRequest {
            name: name.to_string(),
            enabled: true,
            size: None,
            target: TargetRequest {
                mode: mode.map(str::to_string),
                id,
            },
        }
    }

    fn kinds(list: &[Descriptor]) -> Vec<&'static str> {
        list.iter().map(|d| d.kind.name()).collect()
    }

    #[test]
    fn defaults_always_present() {
        let lists = synthesize(&container(2, false));
        assert_eq!(kinds(&lists.pager), ["tctrl", "exregs"]);
        assert!(lists.container.is_empty());

        let tctrl = &lists.pager[0];
        assert_eq!(tctrl.target, 2);
        assert_eq!(tctrl.resource, ResourceType::Container);
        assert_eq!(tctrl.slot, 0);
        assert_eq!(lists.pager[1].slot, 1);
    }

    #[test]
    fn pools_resolve_to_own_container() {
        let lists = synthesize(&container(1, true));
        assert_eq!(
            kinds(&lists.pager),
            ["tctrl", "exregs", "thread", "space", "mutex", "map", "cap"]
        );

        let map = lists
            .find(CapabilityOwner::Pager, CapabilityKind::Pool(PoolKind::Map))
            .unwrap();
        assert_eq!(map.target, 1);
        assert_eq!(map.resource, ResourceType::MapPool);
        assert_eq!(map.cap_type, CapType::QUANTITY);
        assert_eq!(map.size(), Some(32));
        assert_eq!(map.access.rights, Rights::Quantity);
        assert_eq!(map.target_mode, None);
    }

    #[test]
    fn missing_mode_targets_current_container() {
        let mut record = container(2, false);
        record.capabilities.pager = vec![request("ipc", None, None)];
        let lists = synthesize(&record);

        let ipc = lists.find(CapabilityOwner::Pager, CapabilityKind::Ipc).unwrap();
        assert_eq!(ipc.target_mode, Some(TargetMode::CurrentContainer));
        assert_eq!(ipc.resource, ResourceType::Container);
        assert_eq!(ipc.target, 2);
        assert_eq!(lists.pager[1].target_mode, Some(TargetMode::CurrentContainer));
    }

    #[test]
    fn catalogue_order_not_manifest_order() {
        let mut record = container(0, false);
        record.capabilities.pager = vec![
            request("umutex", None, None),
            request("ipc", Some("current_container"), None),
            request("capctrl", None, None),
        ];
        let lists = synthesize(&record);
        assert_eq!(kinds(&lists.pager), ["ipc", "tctrl", "exregs", "capctrl", "umutex"]);
        let slots: Vec<_> = lists.pager.iter().map(|d| d.slot).collect();
        assert_eq!(slots, [0, 1, 2, 3, 4]);
    }

    #[test]
    fn target_modes() {
        let cases = [
            ("current_container", None, ResourceType::Container, 3),
            ("current_pager_space", None, ResourceType::Space, 3),
            ("other_container", Some(1), ResourceType::Container, 1),
            ("OTHER_PAGER", Some(0), ResourceType::Thread, 0),
        ];
        for (mode, id, resource, target) in cases {
            let mut record = container(3, false);
            record.capabilities.pager = vec![request("ipc", Some(mode), id)];
            let lists = synthesize(&record);
            let ipc = lists.find(CapabilityOwner::Pager, CapabilityKind::Ipc).unwrap();
            assert_eq!(ipc.resource, resource, "{}", mode);
            assert_eq!(ipc.target, target, "{}", mode);
            assert!(ipc.target_mode.is_some());
        }
    }

    #[test]
    fn unknown_names_are_skipped() {
        let mut record = container(0, false);
        record.capabilities.pager = vec![
            request("ipc", Some("neighbour"), None),
            request("uart1", None, None),
            request("irqctrl", Some("other_pager"), None),
        ];
        let lists = synthesize(&record);
        assert_eq!(kinds(&lists.pager), ["tctrl", "exregs"]);
    }

    #[test]
    fn disabled_requests_are_skipped() {
        let mut record = container(0, false);
        let mut ipc = request("ipc", None, None);
        ipc.enabled = false;
        record.capabilities.pager = vec![ipc];
        assert_eq!(synthesize(&record).pager.len(), 2);
    }

    #[test]
    fn irqctrl_carries_irq_range() {
        let mut record = container(0, false);
        record.capabilities.pager = vec![request("irqctrl", None, None)];
        let lists = synthesize(&record);
        let irq = lists.find(CapabilityOwner::Pager, CapabilityKind::Irqctrl).unwrap();
        assert_eq!(irq.extent, Extent::IrqRange);
        assert_eq!(irq.target, 0);
    }

    #[test]
    fn pool_target_keeps_pool_tag() {
        let mut record = container(0, true);
        record.capabilities.pools[0].target = TargetRequest {
            mode: Some("other_container".into()),
            id: Some(2),
        };
        let lists = synthesize(&record);
        let thread = lists
            .find(CapabilityOwner::Pager, CapabilityKind::Pool(PoolKind::Thread))
            .unwrap();
        assert_eq!(thread.resource, ResourceType::ThreadPool);
        assert_eq!(thread.target, 2);
    }

    #[test]
    fn container_role_list() {
        let mut record = container(1, false);
        let mut mutex = request("mutex", None, None);
        mutex.size = Some(8);
        record.capabilities.container = vec![mutex, request("umutex", None, None)];
        let lists = synthesize(&record);
        assert_eq!(kinds(&lists.container), ["umutex", "mutex"]);
        assert_eq!(lists.container[1].size(), Some(8));
        assert_eq!(lists.container[1].slot, 1);
    }

    #[test]
    fn synthesis_is_deterministic() {
        let mut record = container(0, true);
        record.capabilities.pager = vec![request("ipc", Some("other_container"), Some(1))];
        assert_eq!(synthesize(&record), synthesize(&record));
    }

    #[test]
    fn access_names_and_bits() {
        let access = CapabilityKind::Ipc.access();
        assert_eq!(
            access.c_names(),
            [
                "CAP_IPC_SEND",
                "CAP_IPC_RECV",
                "CAP_IPC_SHORT",
                "CAP_IPC_FULL",
                "CAP_IPC_EXTENDED",
                "CAP_CHANGEABLE",
                "CAP_REPLICABLE",
                "CAP_TRANSFERABLE",
            ]
        );
        assert_eq!(access.bits() & 0x3f, 0x1f);

        let pool = CapabilityKind::Pool(PoolKind::Space).access();
        assert_eq!(pool.c_names(), ["CAP_CHANGEABLE", "CAP_TRANSFERABLE"]);
        assert_eq!(pool.bits(), (1 << 28) | (1 << 30));
    }

    #[test]
    fn kind_names() {
        assert_eq!(CapabilityKind::from_name("exregs"), Some(CapabilityKind::Exregs));
        assert_eq!(CapabilityKind::from_name("cap"), Some(CapabilityKind::Pool(PoolKind::Cap)));
        assert_eq!(CapabilityKind::from_name("devices"), None);
        assert_eq!(CapabilityKind::Pool(PoolKind::Thread).symbol_stem(), "THREADPOOL");
        assert_eq!(CapabilityKind::Capctrl.symbol_stem(), "CAPCTRL");
    }
}
