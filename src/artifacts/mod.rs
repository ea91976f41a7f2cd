// src/artifacts/mod.rs

//! From produced files to typed work-products.
//!
//! - [`scan`] finds what a tool left in its produce directory.
//! - [`classify`] assigns type tags from the tool's mapping file.
//! - [`registry`] persists outputs for the workflow.
//! - [`collate`] builds the final `TaskResult`.

pub mod classify;
pub mod collate;
pub mod registry;
pub mod scan;

pub use classify::{ArtifactClassifier, ArtifactMap, DEFAULT_MAPPING_FILE};
pub use collate::{collate, OutputCollator};
pub use registry::{DirectoryRegistry, OutputRegistry};
pub use scan::{ArtifactScanner, ProducedFile};
