//! Schema Validator
//!
//! Walks the generic document tree and builds the validated [`Manifest`].
//!
//! Validation is fail-fast: the first violated constraint is returned as a
//! [`ConfigError`] carrying the document path. Order:
//! 1. schema version
//! 2. `containers` shape, count, and id == index ordering
//! 3. per container: id, name, type, then `project` (baremetal) or
//!    `pager_regions` (posix)
//! 4. physical and virtual regions: count, `end > start`, alignment, kernel
//!    boundary (physical), no overlap within a kind
//! 5. pager LMA/VMA inside a declared region
//! 6. capability pools and named capability blocks
//!
//! Once every container passes, regions of distinct containers are checked
//! against each other.

use crate::document::{Mapping, Node};
use crate::error::ConfigError;
use crate::manifest::{
    BaremetalProject, CapabilityRequest, CapabilityRequests, ContainerRecord, ContainerType,
    Manifest, MemoryRegion, Pager, PagerRegions, PoolKind, PoolRequest, RegionKind, Span,
    TargetRequest, MAX_CONTAINERS, MIN_PHYS_START, PAGE_SIZE, SUPPORTED_SCHEMA_VERSION,
};
use crate::scalar::{self, Scalar};

type Result<T> = core::result::Result<T, ConfigError>;

/// Validate a parsed manifest
pub fn validate(root: &Node) -> Result<Manifest> {
    let root = root.as_mapping().ok_or_else(|| {
        ConfigError::new("root", "Manifest must be a mapping").with_value(describe(root))
    })?;

    let schema_version = validate_schema_version(root)?;
    let entries = validate_container_list(root)?;

    let containers = entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| validate_container(entry, idx))
        .collect::<Result<Vec<_>>>()?;

    check_cross_container_overlap(&containers)?;

    log::debug!("validate: {} container(s) accepted", containers.len());
    Ok(Manifest {
        schema_version,
        containers,
    })
}

/// Regions of distinct containers must not overlap
///
/// Physical and virtual regions are checked separately. The error points at
/// the later container's region list.
pub fn check_cross_container_overlap(containers: &[ContainerRecord]) -> Result<()> {
    for kind in [RegionKind::Physical, RegionKind::Virtual] {
        for (j, later) in containers.iter().enumerate() {
            for earlier in &containers[..j] {
                for a in earlier.regions(kind) {
                    for b in later.regions(kind) {
                        if a.overlaps(b) {
                            let message = format!(
                                "{} memory regions overlap with another container",
                                capitalized(kind)
                            );
                            return Err(ConfigError::new(
                                format!("containers[{}].memory.{}", j, kind.name()),
                                message,
                            )
                            .with_value(format!(
                                "container {}: 0x{:x}-0x{:x} and 0x{:x}-0x{:x}",
                                earlier.id, a.start, a.end, b.start, b.end
                            )));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn validate_schema_version(root: &Mapping) -> Result<i64> {
    let node = root
        .get("schemaVersion")
        .ok_or_else(|| ConfigError::new("root", "Missing required field 'schemaVersion'"))?;

    match node.as_scalar().and_then(Scalar::as_int) {
        Some(SUPPORTED_SCHEMA_VERSION) => Ok(SUPPORTED_SCHEMA_VERSION),
        _ => Err(ConfigError::new(
            "schemaVersion",
            format!("Unsupported schema version (supported: {})", SUPPORTED_SCHEMA_VERSION),
        )
        .with_value(describe(node))),
    }
}

fn validate_container_list(root: &Mapping) -> Result<&[Node]> {
    let node = root
        .get("containers")
        .ok_or_else(|| ConfigError::new("containers", "Missing required field 'containers'"))?;

    let entries = node.as_sequence().ok_or_else(|| {
        ConfigError::new("containers", "'containers' must be a sequence").with_value(describe(node))
    })?;

    if entries.is_empty() {
        return Err(ConfigError::new("containers", "At least one container required"));
    }
    if entries.len() > MAX_CONTAINERS {
        return Err(
            ConfigError::new("containers", format!("Maximum {} containers allowed", MAX_CONTAINERS))
                .with_value(entries.len()),
        );
    }

    // Ordering is identity: check every declared id before looking inside any container
    for (idx, entry) in entries.iter().enumerate() {
        if let Some(id_node) = entry.get("id") {
            let path = format!("containers[{}].id", idx);
            let id = number(id_node, &path)?;
            if id != idx as u64 {
                return Err(ConfigError::new(path, "Containers must be sorted by id")
                    .with_value(format!("expected {}, got {}", idx, id)));
            }
        }
    }

    Ok(entries)
}

fn validate_container(node: &Node, idx: usize) -> Result<ContainerRecord> {
    let path = format!("containers[{}]", idx);
    let map = node.as_mapping().ok_or_else(|| {
        ConfigError::new(&path, "Container entry must be a mapping").with_value(describe(node))
    })?;

    let id_path = format!("{}.id", path);
    let id = number(require(map, "id", &path)?, &id_path)?;
    if id != idx as u64 {
        let message = format!("Container id must match array index (expected {})", idx);
        return Err(ConfigError::new(id_path, message).with_value(id));
    }
    let id = idx as u32;

    let name = text(require(map, "name", &path)?, &format!("{}.name", path))?;
    let container_type = validate_container_type(map, &path)?;

    let mut project = None;
    let mut pager_regions = None;
    match container_type {
        ContainerType::Baremetal => project = Some(validate_baremetal_project(map, &path)?),
        ContainerType::Posix => pager_regions = Some(validate_pager_regions(map, &path)?),
    }

    let memory_path = format!("{}.memory", path);
    let memory = mapping(require(map, "memory", &path)?, &memory_path)?;
    let physical = validate_regions(memory, RegionKind::Physical, &memory_path)?;
    let virtual_regions = validate_regions(memory, RegionKind::Virtual, &memory_path)?;

    let pager = validate_pager(map, &path, &physical, &virtual_regions)?;
    let capabilities = validate_capabilities(map, &path)?;
    let devices = collect_devices(map);

    Ok(ContainerRecord {
        id,
        name,
        container_type,
        project,
        physical,
        virtual_regions,
        pager,
        pager_regions,
        capabilities,
        devices,
    })
}

fn validate_container_type(map: &Mapping, path: &str) -> Result<ContainerType> {
    let type_path = format!("{}.type", path);
    let node = map
        .get("type")
        .ok_or_else(|| ConfigError::new(&type_path, "Missing required field 'type'"))?;

    node.as_scalar()
        .and_then(Scalar::as_str)
        .and_then(ContainerType::from_name)
        .ok_or_else(|| {
            ConfigError::new(type_path, "Invalid container type (valid: baremetal, posix)")
                .with_value(describe(node))
        })
}

fn validate_baremetal_project(map: &Mapping, path: &str) -> Result<BaremetalProject> {
    let project_path = format!("{}.project", path);
    let node = map.get("project").ok_or_else(|| {
        ConfigError::new(&project_path, "Missing required field 'project' for baremetal container")
    })?;

    node.as_scalar()
        .and_then(Scalar::as_str)
        .and_then(BaremetalProject::from_name)
        .ok_or_else(|| {
            ConfigError::new(
                project_path,
                format!("Invalid baremetal project (valid: {})", BaremetalProject::valid_names()),
            )
            .with_value(describe(node))
        })
}

fn validate_pager_regions(map: &Mapping, path: &str) -> Result<PagerRegions> {
    let regions_path = format!("{}.pager_regions", path);
    let node = map.get("pager_regions").ok_or_else(|| {
        ConfigError::new(
            &regions_path,
            "Missing required field 'pager_regions' for POSIX container",
        )
    })?;
    let regions = mapping(node, &regions_path)?;

    let span = |name: &str| -> Result<Span> {
        let span_path = format!("{}.{}", regions_path, name);
        let node = regions.get(name).ok_or_else(|| {
            ConfigError::new(&span_path, format!("Missing required pager region '{}'", name))
        })?;
        let region = mapping(node, &span_path)?;
        let (start, end) = start_end(region, &span_path)?;
        Ok(Span { start, end })
    };

    Ok(PagerRegions {
        shm: span("shm")?,
        task: span("task")?,
        utcb: span("utcb")?,
    })
}

fn validate_regions(
    memory: &Mapping,
    kind: RegionKind,
    memory_path: &str,
) -> Result<Vec<MemoryRegion>> {
    let path = format!("{}.{}", memory_path, kind.name());
    let node = memory.get(kind.name()).ok_or_else(|| {
        ConfigError::new(&path, format!("Missing required field '{}'", kind.name()))
    })?;

    let entries = match node.as_sequence() {
        Some(entries) if !entries.is_empty() => entries,
        _ => {
            return Err(ConfigError::new(
                &path,
                format!("At least one {} region required", kind.name()),
            ))
        }
    };
    if entries.len() > kind.max_regions() {
        return Err(ConfigError::new(
            &path,
            format!("Maximum {} {} regions allowed", kind.max_regions(), kind.name()),
        )
        .with_value(entries.len()));
    }

    let regions = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| validate_region(entry, kind, &format!("{}[{}]", path, i)))
        .collect::<Result<Vec<_>>>()?;

    // Sort by start, then every region must begin at or after its predecessor's end
    let mut order: Vec<usize> = (0..regions.len()).collect();
    order.sort_by_key(|&i| regions[i].start);
    for pair in order.windows(2) {
        let (prev, cur) = (&regions[pair[0]], &regions[pair[1]]);
        if cur.start < prev.end {
            return Err(ConfigError::new(
                &path,
                format!("{} memory regions must not overlap", capitalized(kind)),
            )
            .with_value(format!("regions {} and {} overlap", pair[0], pair[1])));
        }
    }

    Ok(regions)
}

fn validate_region(node: &Node, kind: RegionKind, path: &str) -> Result<MemoryRegion> {
    let region = mapping(node, path)?;
    let (start, end) = start_end(region, path)?;

    let align_path = format!("{}.align", path);
    let align = match region.get("align") {
        Some(node) => number(node, &align_path)?,
        None => PAGE_SIZE,
    };
    if align == 0 {
        return Err(
            ConfigError::new(align_path, "Alignment must be a positive integer").with_value(align),
        );
    }

    if start % align != 0 {
        return Err(ConfigError::new(
            format!("{}.start", path),
            format!("Start address must be aligned to 0x{:x}", align),
        )
        .with_value(format!("0x{:x}", start)));
    }

    if kind == RegionKind::Physical && start < MIN_PHYS_START {
        return Err(ConfigError::new(
            format!("{}.start", path),
            format!("Physical regions must start after 0x{:x} (kernel area)", MIN_PHYS_START),
        )
        .with_value(format!("0x{:x}", start)));
    }

    Ok(MemoryRegion { start, end, align })
}

fn validate_pager(
    map: &Mapping,
    path: &str,
    physical: &[MemoryRegion],
    virtual_regions: &[MemoryRegion],
) -> Result<Pager> {
    let pager_path = format!("{}.pager", path);
    let pager = mapping(require(map, "pager", path)?, &pager_path)?;

    let lma_path = format!("{}.lma", pager_path);
    let lma = pager
        .get("lma")
        .ok_or_else(|| {
            ConfigError::new(&lma_path, "Missing required field 'lma' (load memory address)")
        })
        .and_then(|node| number(node, &lma_path))?;

    let vma_path = format!("{}.vma", pager_path);
    let vma = pager
        .get("vma")
        .ok_or_else(|| {
            ConfigError::new(&vma_path, "Missing required field 'vma' (virtual memory address)")
        })
        .and_then(|node| number(node, &vma_path))?;

    if !physical.is_empty() && !physical.iter().any(|r| r.contains(lma)) {
        return Err(ConfigError::new(lma_path, "Pager LMA must be within a physical memory region")
            .with_value(format!("0x{:x}", lma)));
    }
    if !virtual_regions.is_empty() && !virtual_regions.iter().any(|r| r.contains(vma)) {
        return Err(ConfigError::new(vma_path, "Pager VMA must be within a virtual memory region")
            .with_value(format!("0x{:x}", vma)));
    }

    Ok(Pager { lma, vma })
}

fn validate_capabilities(map: &Mapping, path: &str) -> Result<CapabilityRequests> {
    let caps_path = format!("{}.capabilities", path);
    let caps = mapping(require(map, "capabilities", path)?, &caps_path)?;

    let pools_path = format!("{}.pools", caps_path);
    let pools_map = mapping(require(caps, "pools", &caps_path)?, &pools_path)?;

    let pools = PoolKind::ALL
        .into_iter()
        .map(|kind| {
            let pool_path = format!("{}.{}", pools_path, kind.name());
            let node = pools_map.get(kind.name()).ok_or_else(|| {
                ConfigError::new(&pool_path, format!("Missing required pool '{}'", kind.name()))
            })?;
            validate_pool(kind, node, &pool_path)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut pager = Vec::new();
    for (name, node) in caps.iter() {
        if name == "pools" || name == "container" {
            continue;
        }
        // Only mapping blocks can be capability requests
        if let Some(block) = node.as_mapping() {
            let request_path = format!("{}.{}", caps_path, name);
            pager.push(validate_capability(name, block, &request_path)?);
        }
    }

    let mut container = Vec::new();
    if let Some(node) = caps.get("container") {
        let container_path = format!("{}.container", caps_path);
        for (name, node) in mapping(node, &container_path)?.iter() {
            if let Some(block) = node.as_mapping() {
                let request_path = format!("{}.{}", container_path, name);
                container.push(validate_capability(name, block, &request_path)?);
            }
        }
    }

    Ok(CapabilityRequests {
        pools,
        pager,
        container,
    })
}

fn validate_pool(kind: PoolKind, node: &Node, path: &str) -> Result<PoolRequest> {
    let pool = mapping(node, path)?;

    let enabled_path = format!("{}.enabled", path);
    let enabled = pool
        .get("enabled")
        .ok_or_else(|| ConfigError::new(&enabled_path, "Missing required field 'enabled'"))
        .and_then(|node| boolean(node, &enabled_path))?;

    let size_path = format!("{}.size", path);
    let size = match (enabled, pool.get("size")) {
        (true, None) => return Err(ConfigError::new(size_path, "Pool size required when enabled")),
        (true, Some(node)) => match node.as_scalar().and_then(Scalar::as_int) {
            Some(size) if size > 0 => Some(size as u64),
            _ => {
                return Err(ConfigError::new(size_path, "Pool size must be a positive integer")
                    .with_value(describe(node)))
            }
        },
        (false, node) => node
            .and_then(Node::as_scalar)
            .and_then(Scalar::as_int)
            .map(|s| s.max(0) as u64),
    };

    Ok(PoolRequest {
        kind,
        enabled,
        size,
        target: validate_target(pool, path)?,
    })
}

fn validate_capability(name: &str, block: &Mapping, path: &str) -> Result<CapabilityRequest> {
    let enabled = match block.get("enabled") {
        Some(node) => boolean(node, &format!("{}.enabled", path))?,
        None => false,
    };

    let size = match block.get("size") {
        Some(node) => Some(number(node, &format!("{}.size", path))?),
        None => None,
    };

    Ok(CapabilityRequest {
        name: name.to_string(),
        enabled,
        size,
        target: validate_target(block, path)?,
    })
}

/// `target: <mode>` or `target: <id>`, plus an optional `target_id`
fn validate_target(block: &Mapping, path: &str) -> Result<TargetRequest> {
    let mut target = TargetRequest::default();

    if let Some(node) = block.get("target") {
        match node.as_scalar() {
            Some(Scalar::Str(mode)) if scalar::parse_int(mode).is_none() => {
                target.mode = Some(mode.clone())
            }
            Some(Scalar::Null) => {}
            _ => target.id = Some(container_id(node, &format!("{}.target", path))?),
        }
    }

    if let Some(node) = block.get("target_id") {
        target.id = Some(container_id(node, &format!("{}.target_id", path))?);
    }

    Ok(target)
}

/// Device names from `devices: [- name: uart1, ...]`, lower-cased
fn collect_devices(map: &Mapping) -> Vec<String> {
    map.get("devices")
        .and_then(Node::as_sequence)
        .unwrap_or_default()
        .iter()
        .filter_map(|device| match device {
            Node::Mapping(fields) => fields
                .get("name")
                .and_then(Node::as_scalar)
                .and_then(Scalar::as_str),
            Node::Scalar(Scalar::Str(name)) => Some(name.as_str()),
            _ => None,
        })
        .map(str::to_ascii_lowercase)
        .collect()
}

fn start_end(region: &Mapping, path: &str) -> Result<(u64, u64)> {
    let start_path = format!("{}.start", path);
    let end_path = format!("{}.end", path);

    let start = region
        .get("start")
        .ok_or_else(|| ConfigError::new(&start_path, "Missing required field 'start'"))
        .and_then(|node| number(node, &start_path))?;
    let end = region
        .get("end")
        .ok_or_else(|| ConfigError::new(&end_path, "Missing required field 'end'"))
        .and_then(|node| number(node, &end_path))?;

    if end <= start {
        return Err(ConfigError::new(path, "Region end must exceed start")
            .with_value(format!("start=0x{:x}, end=0x{:x}", start, end)));
    }

    Ok((start, end))
}

fn require<'a>(map: &'a Mapping, key: &str, parent: &str) -> Result<&'a Node> {
    map.get(key).ok_or_else(|| {
        ConfigError::new(
            format!("{}.{}", parent, key),
            format!("Missing required field '{}'", key),
        )
    })
}

fn mapping<'a>(node: &'a Node, path: &str) -> Result<&'a Mapping> {
    node.as_mapping()
        .ok_or_else(|| ConfigError::new(path, "Expected a mapping").with_value(describe(node)))
}

/// Non-negative integer, literal or quoted, decimal or hex
fn number(node: &Node, path: &str) -> Result<u64> {
    match node.as_scalar() {
        Some(Scalar::Int(value)) => u64::try_from(*value).map_err(|_| {
            ConfigError::new(path, "Expected a non-negative integer").with_value(value)
        }),
        Some(Scalar::Str(text)) => match scalar::parse_int(text) {
            Some(value) if value >= 0 => Ok(value as u64),
            Some(value) => {
                Err(ConfigError::new(path, "Expected a non-negative integer").with_value(value))
            }
            None => Err(ConfigError::new(path, "Invalid numeric value").with_value(text)),
        },
        _ => Err(
            ConfigError::new(path, "Expected integer or hex string").with_value(describe(node)),
        ),
    }
}

fn container_id(node: &Node, path: &str) -> Result<u32> {
    let value = number(node, path)?;
    u32::try_from(value)
        .map_err(|_| ConfigError::new(path, "Target id out of range").with_value(value))
}

fn boolean(node: &Node, path: &str) -> Result<bool> {
    node.as_scalar()
        .and_then(Scalar::as_bool)
        .ok_or_else(|| ConfigError::new(path, "Expected a boolean").with_value(describe(node)))
}

fn text(node: &Node, path: &str) -> Result<String> {
    match node.as_scalar() {
        Some(Scalar::Null) | None => {
            Err(ConfigError::new(path, "Expected a string").with_value(describe(node)))
        }
        Some(value) => Ok(value.to_string()),
    }
}

fn describe(node: &Node) -> String {
    match node.as_scalar() {
        Some(value) => value.to_string(),
        None => node.kind_name().to_string(),
    }
}

fn capitalized(kind: RegionKind) -> &'static str {
    match kind {
        RegionKind::Physical => "Physical",
        RegionKind::Virtual => "Virtual",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse;

    fn container(body: &str) -> String {
        format!("schemaVersion: 1\ncontainers:\n{}", body)
    }

    fn pools(enabled: bool) -> String {
        let mut out = String::from("      pools:\n");
        for name in ["thread", "space", "mutex", "map", "cap"] {
            out.push_str(&format!(
                "        {}:\n          enabled: {}\n          size: 64\n",
                name, enabled
            ));
        }
        out
    }

    fn baremetal_with(memory: &str, pager: &str) -> String {
        container(&format!(
            concat!(
                "  - id: 0\n",
                "    name: c0\n",
                "    type: baremetal\n",
                "    project: empty\n",
                "    pager:\n{}",
                "    memory:\n{}",
                "    capabilities:\n{}",
            ),
            pager,
            memory,
            pools(true)
        ))
    }

    /// Container 1 with one physical and one virtual region, pager at their starts
    fn second_container(physical: (u64, u64), virt: (u64, u64)) -> String {
        format!(
            concat!(
                "  - id: 1\n",
                "    name: c1\n",
                "    type: baremetal\n",
                "    project: empty\n",
                "    pager:\n",
                "      lma: 0x{:x}\n",
                "      vma: 0x{:x}\n",
                "    memory:\n",
                "      physical:\n",
                "        - start: 0x{:x}\n",
                "          end: 0x{:x}\n",
                "      virtual:\n",
                "        - start: 0x{:x}\n",
                "          end: 0x{:x}\n",
                "    capabilities:\n{}",
            ),
            physical.0,
            virt.0,
            physical.0,
            physical.1,
            virt.0,
            virt.1,
            pools(true)
        )
    }

    fn check(text: &str) -> Result<Manifest> {
        validate(&parse(text).unwrap())
    }

    fn err_path(text: &str) -> String {
        check(text).unwrap_err().path
    }

    const MEMORY: &str = concat!(
        "      physical:\n",
        "        - start: 0x100000\n",
        "          end: 0xe00000\n",
        "      virtual:\n",
        "        - start: 0xa0000000\n",
        "          end: 0xb0000000\n",
    );
    const PAGER: &str = "      lma: 0x100000\n      vma: 0xa0000000\n";

    #[test]
    fn accepts_minimal_baremetal() {
        let manifest = check(&baremetal_with(MEMORY, PAGER)).unwrap();
        let cont = &manifest.containers[0];
        assert_eq!(cont.id, 0);
        assert_eq!(cont.project, Some(BaremetalProject::Empty));
        assert_eq!(cont.physical[0].align, PAGE_SIZE);
        assert_eq!(cont.capabilities.pools.len(), 5);
        assert_eq!(cont.capabilities.pool(PoolKind::Map).unwrap().size, Some(64));
    }

    #[test]
    fn rejects_wrong_schema_version() {
        let err = check("schemaVersion: 2\ncontainers: []\n").unwrap_err();
        assert_eq!(err.path, "schemaVersion");
        assert_eq!(err.value.as_deref(), Some("2"));
        assert_eq!(err_path("containers: []\n"), "root");
    }

    #[test]
    fn schema_version_checked_before_containers() {
        // Broken container list must not be inspected when the version is wrong
        assert_eq!(err_path("schemaVersion: 3\ncontainers: 7\n"), "schemaVersion");
    }

    #[test]
    fn rejects_bad_container_lists() {
        assert_eq!(err_path("schemaVersion: 1\n"), "containers");
        assert_eq!(err_path("schemaVersion: 1\ncontainers: 4\n"), "containers");
        assert_eq!(err_path("schemaVersion: 1\ncontainers: []\n"), "containers");

        let five = "  - id: 0\n  - id: 1\n  - id: 2\n  - id: 3\n  - id: 4\n";
        let err = check(&container(five)).unwrap_err();
        assert_eq!(err.path, "containers");
        assert_eq!(err.value.as_deref(), Some("5"));
    }

    #[test]
    fn id_must_equal_index() {
        let text = baremetal_with(MEMORY, PAGER).replace("id: 0", "id: 1");
        let err = check(&text).unwrap_err();
        assert_eq!(err.path, "containers[0].id");
        assert_eq!(err.value.as_deref(), Some("expected 0, got 1"));
    }

    #[test]
    fn missing_fields_are_reported_by_path() {
        let text = baremetal_with(MEMORY, PAGER).replace("    name: c0\n", "");
        assert_eq!(err_path(&text), "containers[0].name");

        let text = baremetal_with(MEMORY, PAGER).replace("    project: empty\n", "");
        assert_eq!(err_path(&text), "containers[0].project");

        let text = baremetal_with(MEMORY, PAGER).replace("type: baremetal", "type: linux");
        assert_eq!(err_path(&text), "containers[0].type");

        let text = baremetal_with(MEMORY, PAGER).replace("project: empty", "project: doom");
        assert_eq!(err_path(&text), "containers[0].project");
    }

    #[test]
    fn posix_requires_pager_regions() {
        let text = baremetal_with(MEMORY, PAGER)
            .replace("type: baremetal", "type: posix")
            .replace("    project: empty\n", "");
        assert_eq!(err_path(&text), "containers[0].pager_regions");

        let regions = concat!(
            "    pager_regions:\n",
            "      shm:\n",
            "        start: 0xa1000000\n",
            "        end: 0xa2000000\n",
            "      task:\n",
            "        start: 0xa2000000\n",
            "        end: 0xa3000000\n",
            "      utcb:\n",
            "        start: 0xa3000000\n",
            "        end: 0xa3000000\n",
        );
        let text = baremetal_with(MEMORY, PAGER)
            .replace("type: baremetal", "type: posix")
            .replace("    project: empty\n", regions);
        let err = check(&text).unwrap_err();
        assert_eq!(err.path, "containers[0].pager_regions.utcb");
        assert_eq!(err.message, "Region end must exceed start");
    }

    #[test]
    fn alignment_boundary() {
        let aligned = concat!(
            "      physical:\n",
            "        - start: 0x100000\n",
            "          end: 0xe00000\n",
            "      virtual:\n",
            "        - start: 0x1000\n",
            "          end: 0x2000\n",
            "          align: 0x1000\n",
            "        - start: 0xa0000000\n",
            "          end: 0xb0000000\n",
        );
        assert!(check(&baremetal_with(aligned, PAGER)).is_ok());

        let misaligned = aligned.replace("start: 0x1000\n", "start: 0x1001\n");
        let err = check(&baremetal_with(&misaligned, PAGER)).unwrap_err();
        assert_eq!(err.path, "containers[0].memory.virtual[0].start");
        assert_eq!(err.value.as_deref(), Some("0x1001"));
    }

    #[test]
    fn physical_regions_stay_above_kernel() {
        let low = MEMORY.replace("start: 0x100000\n", "start: 0x1000\n");
        let pager = "      lma: 0x1000\n      vma: 0xa0000000\n";
        let err = check(&baremetal_with(&low, pager)).unwrap_err();
        assert_eq!(err.path, "containers[0].memory.physical[0].start");
    }

    #[test]
    fn region_end_must_exceed_start() {
        let inverted = MEMORY.replace("end: 0xe00000", "end: 0x100000");
        let err = check(&baremetal_with(&inverted, PAGER)).unwrap_err();
        assert_eq!(err.path, "containers[0].memory.physical[0]");
    }

    #[test]
    fn overlapping_regions_are_rejected() {
        let overlap = concat!(
            "      physical:\n",
            "        - start: 0x180000\n",
            "          end: 0x300000\n",
            "        - start: 0x100000\n",
            "          end: 0x200000\n",
            "      virtual:\n",
            "        - start: 0xa0000000\n",
            "          end: 0xb0000000\n",
        );
        let err = check(&baremetal_with(overlap, PAGER)).unwrap_err();
        assert_eq!(err.path, "containers[0].memory.physical");
        assert_eq!(err.value.as_deref(), Some("regions 1 and 0 overlap"));

        let virt = concat!(
            "      physical:\n",
            "        - start: 0x100000\n",
            "          end: 0xe00000\n",
            "      virtual:\n",
            "        - start: 0xa0000000\n",
            "          end: 0xb0000000\n",
            "        - start: 0xaf000000\n",
            "          end: 0xc0000000\n",
        );
        assert_eq!(err_path(&baremetal_with(virt, PAGER)), "containers[0].memory.virtual");
    }

    #[test]
    fn adjacent_regions_do_not_overlap() {
        let adjacent = concat!(
            "      physical:\n",
            "        - start: 0x100000\n",
            "          end: 0x200000\n",
            "        - start: 0x200000\n",
            "          end: 0x300000\n",
            "      virtual:\n",
            "        - start: 0xa0000000\n",
            "          end: 0xb0000000\n",
        );
        assert!(check(&baremetal_with(adjacent, PAGER)).is_ok());
    }

    #[test]
    fn too_many_regions() {
        let mut physical = String::from("      physical:\n");
        for i in 0..5u64 {
            let start = 0x100000 + i * 0x100000;
            physical.push_str(&format!(
                "        - start: 0x{:x}\n          end: 0x{:x}\n",
                start,
                start + 0x1000
            ));
        }
        physical.push_str("      virtual:\n");
        physical.push_str("        - start: 0xa0000000\n          end: 0xb0000000\n");
        let err = check(&baremetal_with(&physical, PAGER)).unwrap_err();
        assert_eq!(err.path, "containers[0].memory.physical");
        assert_eq!(err.value.as_deref(), Some("5"));
    }

    #[test]
    fn pager_addresses_must_be_inside_regions() {
        let pager = "      lma: 0x50000\n      vma: 0xa0000000\n";
        let err = check(&baremetal_with(MEMORY, pager)).unwrap_err();
        assert_eq!(err.path, "containers[0].pager.lma");
        assert_eq!(err.value.as_deref(), Some("0x50000"));

        let pager = "      lma: 0x100000\n      vma: 0xb0000000\n";
        let err = check(&baremetal_with(MEMORY, pager)).unwrap_err();
        assert_eq!(err.path, "containers[0].pager.vma");
    }

    #[test]
    fn quoted_numbers_are_accepted() {
        let quoted = MEMORY.replace("start: 0x100000", "start: \"0x100000\"");
        let pager = "      lma: \"1048576\"\n      vma: 0xa0000000\n";
        let manifest = check(&baremetal_with(&quoted, pager)).unwrap();
        assert_eq!(manifest.containers[0].pager.lma, 0x100000);
    }

    #[test]
    fn pools_are_all_required() {
        let text = baremetal_with(MEMORY, PAGER).replace("        mutex:\n", "        mutexes:\n");
        let err = check(&text).unwrap_err();
        assert_eq!(err.path, "containers[0].capabilities.pools.mutex");
    }

    #[test]
    fn enabled_pool_needs_positive_size() {
        let text = baremetal_with(MEMORY, PAGER).replacen("size: 64", "size: 0", 1);
        let err = check(&text).unwrap_err();
        assert_eq!(err.path, "containers[0].capabilities.pools.thread.size");

        let text = baremetal_with(MEMORY, PAGER).replacen("          size: 64\n", "", 1);
        assert_eq!(err_path(&text), "containers[0].capabilities.pools.thread.size");
    }

    #[test]
    fn disabled_pool_needs_no_size() {
        let text = baremetal_with(MEMORY, PAGER)
            .replacen("enabled: true\n          size: 64\n", "enabled: false\n", 1);
        let manifest = check(&text).unwrap();
        let thread = manifest.containers[0].capabilities.pool(PoolKind::Thread).unwrap();
        assert!(!thread.enabled);
        assert_eq!(thread.size, None);
    }

    #[test]
    fn unknown_capability_blocks_are_kept_raw() {
        let extra = concat!(
            "      ipc:\n",
            "        enabled: true\n",
            "        target: other_container\n",
            "        target_id: 1\n",
            "      frobnicate:\n",
            "        enabled: true\n",
            "      devices: []\n",
            "      container:\n",
            "        umutex:\n",
            "          enabled: true\n",
        );
        let caps = format!("{}{}", pools(true), extra);
        let text = baremetal_with(MEMORY, PAGER).replace(&pools(true), &caps);
        let manifest = check(&text).unwrap();
        let requests = &manifest.containers[0].capabilities;

        let names: Vec<_> = requests.pager.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["ipc", "frobnicate"]);
        assert_eq!(requests.pager[0].target.mode.as_deref(), Some("other_container"));
        assert_eq!(requests.pager[0].target.id, Some(1));
        assert_eq!(requests.container[0].name, "umutex");
    }

    #[test]
    fn devices_are_collected() {
        let text = format!(
            "{}    devices:\n      - name: UART1\n      - name: timer1\n",
            baremetal_with(MEMORY, PAGER)
        );
        let manifest = check(&text).unwrap();
        assert_eq!(manifest.containers[0].devices, ["uart1", "timer1"]);
    }

    #[test]
    fn containers_must_not_share_physical_memory() {
        let first = baremetal_with(MEMORY, PAGER);
        let second = second_container((0x800000, 0x900000), (0xc0000000, 0xd0000000));
        let err = check(&format!("{}{}", first, second)).unwrap_err();
        assert_eq!(err.path, "containers[1].memory.physical");

        let disjoint = second_container((0xe00000, 0xf00000), (0xc0000000, 0xd0000000));
        let manifest = check(&format!("{}{}", first, disjoint)).unwrap();
        assert_eq!(manifest.containers.len(), 2);
        assert_eq!(manifest.containers[1].id, 1);
    }

    #[test]
    fn containers_must_not_share_virtual_memory() {
        let first = baremetal_with(MEMORY, PAGER);
        let second = second_container((0xe00000, 0xf00000), (0xa8000000, 0xc0000000));
        let err = check(&format!("{}{}", first, second)).unwrap_err();
        assert_eq!(err.path, "containers[1].memory.virtual");
        assert_eq!(err.message, "Virtual memory regions overlap with another container");
        assert_eq!(
            err.value.as_deref(),
            Some("container 0: 0xa0000000-0xb0000000 and 0xa8000000-0xc0000000")
        );
    }

    #[test]
    fn cross_container_check_on_records() {
        let first = check(&baremetal_with(MEMORY, PAGER)).unwrap().containers.remove(0);
        let mut second = first.clone();
        second.id = 1;
        second.physical[0] = MemoryRegion {
            start: 0xe00000,
            end: 0xf00000,
            align: PAGE_SIZE,
        };

        let err = check_cross_container_overlap(&[first, second]).unwrap_err();
        assert_eq!(err.path, "containers[1].memory.virtual");
    }
}
