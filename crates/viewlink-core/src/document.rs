//! Seam to the host's document model.
//!
//! Serialization formats and meshing are owned by the host application; the
//! bridge only needs the operations below. Implementations are injected into
//! [`crate::ViewerBridge`] at construction.

use crate::error::Result;
use crate::mirror::EntityId;
use std::path::{Path, PathBuf};

/// External document/geometry collaborator.
pub trait DocumentStore {
    /// Handle to an entity in the host document.
    type Entity;

    /// Name of the active working document, without extension.
    fn document_name(&self) -> String;

    /// Rename the active working document.
    fn set_document_name(&mut self, name: &str);

    /// Materialize an entity to its two sibling artifacts under `dir`: a mesh
    /// file `{basename}.stl` and a metadata file `{basename}_geom.json`.
    /// Returns the entity's identifier in the document.
    fn export_entity(
        &mut self,
        entity: &Self::Entity,
        basename: &str,
        dir: &Path,
    ) -> Result<EntityId>;

    /// Serialize the working document under `dir`, returning the written
    /// file path.
    fn save_document(&mut self, dir: &Path) -> Result<PathBuf>;

    /// Close the working document locally. Called after a successful save
    /// when the viewer takes over live editing.
    fn close_document(&mut self);
}
