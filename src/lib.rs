//! CubePack Core - Azure RTOS Expansion Package Generator
//!
//! # The Five Guarantees (Non-Negotiable)
//! 1. Configuration Is Validated Before Anything Is Generated
//! 2. Family Metadata Is Read-Only
//! 3. Output Is Deterministic
//! 4. Archives Are Immutable Once Finalized
//! 5. Failures Surface As Results, Never As Faults

pub mod archive;
pub mod config;
pub mod families;
pub mod hashing;
pub mod pipeline;
pub mod synthesis;
pub mod templates;
pub mod validation;

pub use archive::{ArchiveBlob, ArchiveBuilder, ArchiveError};
pub use config::{GenerationResult, GeneratorConfig, IpMode};
pub use families::{CortexCore, Family, FamilyCatalog, FamilyDescriptor};
pub use pipeline::{GenerationPhase, GenerationPipeline, GenerationStatus, GeneratorError};
pub use synthesis::Artifact;
pub use templates::TemplateEngine;
pub use validation::{ConfigValidator, PackageMode};

pub const GENERATOR_NAME: &str = env!("CARGO_PKG_NAME");
pub const GENERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Vendor as it appears in generated manifests.
pub const VENDOR: &str = "STMicroelectronics";
/// Vendor prefix used in archive filenames.
pub const VENDOR_PREFIX: &str = "st";
/// Expansion-pack naming prefix shared by manifests and package names.
pub const PACK_PREFIX: &str = "X-CUBE-AZRTOS";
