//! Model persistence
//!
//! A fitted pipeline is stored as a single versioned binary artifact
//! (magic tag + format version + bincode payload), written atomically.

mod artifact;

pub use artifact::{ArtifactMetadata, ModelArtifact, ARTIFACT_MAGIC, FORMAT_VERSION};
