//! Publication registry: session-monotonic publish ordinals and the artifact
//! filenames derived from them.
//!
//! Ordinal identity is a local concern. The counter advances once the local
//! export succeeded, whether or not the viewer accepted the object, and is
//! never reused or decremented within a session.

use crate::config::PathsConfig;

/// Counter of successfully exported publishes.
#[derive(Debug, Default)]
pub struct PublishRegistry {
    counter: u64,
}

impl PublishRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of publishes whose local export succeeded.
    pub fn published_count(&self) -> u64 {
        self.counter
    }

    /// Ordinal the next publish will use.
    pub fn next_ordinal(&self) -> u64 {
        self.counter + 1
    }

    /// Advance the counter after a successful local export. Returns the
    /// ordinal that was just consumed.
    pub fn commit(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }

    /// Deterministic artifact basename: `{ordinal}_{name}`.
    pub fn artifact_basename(ordinal: u64, name: &str) -> String {
        format!("{}_{}", ordinal, name)
    }

    /// Mesh artifact filename: `{ordinal}_{name}.stl`.
    pub fn mesh_filename(ordinal: u64, name: &str) -> String {
        format!(
            "{}.{}",
            Self::artifact_basename(ordinal, name),
            PathsConfig::MESH_EXTENSION
        )
    }

    /// Geometry metadata filename: `{ordinal}_{name}_geom.json`.
    pub fn geometry_filename(ordinal: u64, name: &str) -> String {
        format!(
            "{}{}",
            Self::artifact_basename(ordinal, name),
            PathsConfig::GEOMETRY_SUFFIX
        )
    }
}
