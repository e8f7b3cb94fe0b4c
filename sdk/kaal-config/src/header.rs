//! Configuration header text
//!
//! [`serialize`] renders a merged [`SymbolTable`] as a C header;
//! [`parse_header`] reads `#define CONFIG_*` lines back, whether from the
//! kernel feature header or from our own output.

use std::fmt::Write;
use std::fs;
use std::path::Path;

use crate::configuration::Platform;
use crate::error::{Error, Result};
use crate::scalar::{self, Scalar};
use crate::symbols::{container_index, SymbolTable, SymbolValue, CONTAINERS_SYMBOL, SYMBOL_PREFIX};

/// Integers at or above this are written in hex
pub const HEX_THRESHOLD: i64 = 0x10000;

const INCLUDE_GUARD: &str = "__L4_CONFIG_H__";

/// Render the full configuration header
pub fn serialize(table: &SymbolTable) -> String {
    let platform = Platform::from_symbols(table);
    let mut out = String::new();

    out.push_str("/*\n * Kernel and container configuration\n *\n");
    out.push_str(" * Generated by kaal-configure. Do not edit.\n */\n\n");
    let _ = writeln!(out, "#ifndef {}", INCLUDE_GUARD);
    let _ = writeln!(out, "#define {}\n", INCLUDE_GUARD);

    out.push_str("/* Architecture identification macros */\n");
    let _ = writeln!(out, "#define __ARCH__ {}", platform.arch);
    let _ = writeln!(out, "#define __SUBARCH__ {}", platform.subarch);
    let _ = writeln!(out, "#define __PLATFORM__ {}", platform.platform);
    let _ = writeln!(out, "#define __CPU__ {}\n", platform.cpu);

    out.push_str("/* Kernel configuration */\n");
    for (name, value) in table.iter().filter(|(name, _)| !is_container_symbol(name)) {
        define(&mut out, name, value);
    }

    out.push_str("\n/* Container configuration */\n");
    if let Some(count) = table.get(CONTAINERS_SYMBOL) {
        define(&mut out, CONTAINERS_SYMBOL, count);
    }

    let mut current = None;
    for (name, value) in table.iter() {
        let Some(index) = container_index(name) else {
            continue;
        };
        if current != Some(index) {
            let _ = writeln!(out, "\n/* Container {} */", index);
            current = Some(index);
        }
        define(&mut out, name, value);
    }

    let _ = writeln!(out, "\n#endif /* {} */", INCLUDE_GUARD);
    out
}

/// Textual form of one value
pub fn render_value(value: &SymbolValue) -> String {
    match value {
        SymbolValue::Bool(b) => i64::from(*b).to_string(),
        SymbolValue::Int(v) if *v >= HEX_THRESHOLD => format!("0x{:x}", v),
        SymbolValue::Int(v) => v.to_string(),
        SymbolValue::Str(s) => format!("\"{}\"", s),
    }
}

/// Collect `#define CONFIG_* value` lines
///
/// Values are typed with the manifest's scalar coercion. A bare
/// `#define CONFIG_X` reads as `1`. Other lines are ignored.
pub fn parse_header(text: &str) -> SymbolTable {
    let mut table = SymbolTable::new();

    for line in text.lines() {
        let Some(rest) = line.trim().strip_prefix("#define") else {
            continue;
        };
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }

        let rest = rest.trim_start();
        let (name, raw) = match rest.split_once(char::is_whitespace) {
            Some((name, raw)) => (name, raw.trim()),
            None => (rest, ""),
        };
        if !name.starts_with(SYMBOL_PREFIX) {
            continue;
        }

        let value = match scalar::coerce(raw) {
            Scalar::Null => SymbolValue::Int(1),
            Scalar::Bool(b) => SymbolValue::Bool(b),
            Scalar::Int(v) => SymbolValue::Int(v),
            Scalar::Float(_) => SymbolValue::Str(raw.to_string()),
            Scalar::Str(s) => SymbolValue::Str(s),
        };
        table.insert(name, value);
    }

    table
}

/// Read and parse a header file
pub fn read_header(path: &Path) -> Result<SymbolTable> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_header(&text);
    log::debug!("{}: {} symbols", path.display(), table.len());
    Ok(table)
}

/// Serialize `table` to `path`, creating parent directories
pub fn write_header(path: &Path, table: &SymbolTable) -> Result<()> {
    write_file(path, &serialize(table))
}

pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    let io = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io)?;
    }
    fs::write(path, contents).map_err(io)
}

fn is_container_symbol(name: &str) -> bool {
    name == CONTAINERS_SYMBOL || container_index(name).is_some()
}

fn define(out: &mut String, name: &str, value: &SymbolValue) {
    let _ = writeln!(out, "#define {} {}", name, render_value(value));
}
