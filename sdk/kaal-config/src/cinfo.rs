//! Capability list emission
//!
//! Renders synthesized [`CapabilityLists`] as C designated-initializer
//! arrays of `struct cap_info`, one pager and one container array per
//! container. Output depends only on the typed descriptors.

use std::fmt::Write;

use crate::caps::{CapabilityLists, CapabilityOwner, Descriptor, Extent};
use crate::manifest::ContainerRecord;

const BANNER: &str = concat!(
    "/*\n",
    " * Container capability lists.\n",
    " *\n",
    " * Generated by kaal-configure from the container manifest. Do not edit.\n",
    " */\n",
);

/// Render the capability lists of every container
pub fn render<'a>(
    containers: impl IntoIterator<Item = (&'a ContainerRecord, &'a CapabilityLists)>,
) -> String {
    let mut out = String::from(BANNER);
    out.push_str("\n#include <l4/generic/capability.h>\n");

    for (container, lists) in containers {
        let _ = writeln!(out, "\n/* Container {}: {} */", container.id, container.name);
        for owner in CapabilityOwner::ALL {
            render_list(&mut out, container.id, owner, lists.list(owner));
        }
    }

    out
}

fn render_list(out: &mut String, id: u32, owner: CapabilityOwner, descriptors: &[Descriptor]) {
    let array = match owner {
        CapabilityOwner::Pager => format!("cont{}_pager_caps", id),
        CapabilityOwner::Container => format!("cont{}_caps", id),
    };

    let _ = writeln!(out, "#define {}_NCAPS {}", array.to_ascii_uppercase(), descriptors.len());
    if descriptors.is_empty() {
        return;
    }

    let _ = writeln!(out, "static struct cap_info {}[] = {{", array);
    for descriptor in descriptors {
        out.push_str(&render_descriptor(descriptor));
    }
    out.push_str("};\n");
}

/// One `[slot] = { ... },` initializer
pub fn render_descriptor(descriptor: &Descriptor) -> String {
    let cap_type: Vec<String> = descriptor
        .cap_type
        .iter_names()
        .map(|(name, _)| format!("CAP_TYPE_{}", name))
        .collect();

    let size = match descriptor.extent {
        Extent::Size(size) => size.to_string(),
        Extent::None | Extent::IrqRange => "0".to_string(),
    };
    let (start, end) = match descriptor.extent {
        Extent::IrqRange => ("IRQ_RANGE_START", "IRQ_RANGE_END"),
        Extent::None | Extent::Size(_) => ("0", "0"),
    };

    let mut out = String::new();
    let _ = writeln!(out, "\t[{}] = {{", descriptor.slot);
    let _ = writeln!(out, "\t\t.target = {},", descriptor.target);
    let resource = descriptor.resource.c_name();
    let _ = writeln!(out, "\t\t.type = {} | {},", cap_type.join(" | "), resource);
    let access = descriptor.access.c_names().join("\n\t\t          | ");
    let _ = writeln!(out, "\t\t.access = {},", access);
    let _ = writeln!(out, "\t\t.start = {}, .end = {}, .size = {},", start, end, size);
    out.push_str("\t},\n");
    out
}
