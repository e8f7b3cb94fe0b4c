//! KaaL Config - Container configuration pipeline
//!
//! # Purpose
//! Turns a declarative container manifest plus the kernel feature symbols
//! into a validated container set, resolved capability descriptors and a
//! single merged `CONFIG_*` symbol table for the configuration header.
//!
//! # Integration Points
//! - Depends on: kernel feature header (`#define CONFIG_*` lines)
//! - Provides to: `kaal-configure`, kernel and container builds
//! - Outputs: configuration header, capability list C source, TOML snapshot
//!
//! # Architecture
//! A strict linear pipeline, each stage a pure function of its input:
//!
//! ```text
//! manifest text ─> document::parse ─> validate::validate ─> caps::synthesize
//!                                                                  │
//! feature symbols ───────────────────────> symbols::merge <────────┘
//!                                                │
//!                                   header::serialize / cinfo::render
//! ```
//!
//! [`Configuration::build`] runs every stage and returns one value that
//! downstream steps take by reference. Parse and validation errors stop the
//! run at the first failure.
//!
//! # Testing Strategy
//! - Unit tests: each stage in isolation
//! - Integration tests: full manifests through [`Configuration::build`]
//! - Benchmarks: `benches/pipeline.rs`

pub mod caps;
pub mod cinfo;
pub mod configuration;
pub mod document;
pub mod error;
pub mod header;
pub mod manifest;
pub mod scalar;
pub mod symbols;
pub mod validate;

pub use caps::{
    synthesize, CapabilityKind, CapabilityLists, CapabilityOwner, Descriptor, TargetMode,
};
pub use configuration::{Configuration, Platform, Snapshot};
pub use document::{parse, Mapping, Node};
pub use error::{ConfigError, Error, ParseError, Result};
pub use header::{parse_header, serialize};
pub use manifest::{ContainerRecord, ContainerType, Manifest, MemoryRegion};
pub use scalar::Scalar;
pub use symbols::{merge, SymbolTable, SymbolValue};
pub use validate::validate;
