//! The viewer bridge: sync operations against the local mirror and the
//! remote viewer.
//!
//! Every operation follows the same shape: mutate the local mirror first,
//! then send a best-effort notification through the availability gate. The
//! remote outcome is bookkeeping only. It never decides whether the local
//! mutation happened, and it never surfaces to the caller as an error, so a
//! batch run with no viewer attached behaves exactly like a connected one.

use crate::config::{PathsConfig, WorkspaceConfig};
use crate::document::DocumentStore;
use crate::error::{BridgeError, Result};
use crate::mirror::{Colour, ColourSelection, DocumentMirror, EntityId, PublishedEntity};
use crate::protocol::{Operation, RemoteRequest, RemoteResponse, ResponseStatus};
use crate::registry::PublishRegistry;
use crate::session::ViewerSession;
use crate::transport::{HttpNotifier, NoopNotifier, RemoteNotifier};
use serde_json::Value;
use std::fs;
use tracing::{debug, info, warn};

/// Primary interactor with the viewer.
///
/// Owns the session gate, the local document mirror, the publication
/// registry, the notifier and the document collaborator; all are injected at
/// construction, with [`ViewerBridge::connect`] as the probing convenience
/// path.
pub struct ViewerBridge<D: DocumentStore> {
    session: ViewerSession,
    notifier: Box<dyn RemoteNotifier>,
    store: D,
    mirror: DocumentMirror,
    registry: PublishRegistry,
    workspace: Option<WorkspaceConfig>,
    active_document_name: String,
}

impl<D: DocumentStore> ViewerBridge<D> {
    /// Probe the viewer on `viewer_id` and resolve the default workspace.
    pub fn connect(viewer_id: u16, store: D) -> Self {
        let session = ViewerSession::connect(viewer_id);
        let notifier: Box<dyn RemoteNotifier> =
            match HttpNotifier::new(session.viewer_url(), viewer_id) {
                Ok(notifier) => Box::new(notifier),
                Err(e) => {
                    warn!("Could not build viewer transport, running headless: {}", e);
                    Box::new(NoopNotifier)
                }
            };
        let workspace = WorkspaceConfig::resolve(PathsConfig::DEFAULT_PLUGIN_NAME);
        Self::assemble(session, notifier, store, workspace)
    }

    /// Bridge for batch runs that never talk to a viewer.
    pub fn headless(store: D) -> Self {
        let session = ViewerSession::detached(0);
        let workspace = WorkspaceConfig::resolve(PathsConfig::DEFAULT_PLUGIN_NAME);
        Self::assemble(session, Box::new(NoopNotifier), store, workspace)
    }

    /// Dependency-injection constructor: every collaborator is passed in.
    pub fn new(
        session: ViewerSession,
        notifier: Box<dyn RemoteNotifier>,
        store: D,
        workspace: WorkspaceConfig,
    ) -> Self {
        Self::assemble(session, notifier, store, Ok(workspace))
    }

    pub(crate) fn assemble(
        mut session: ViewerSession,
        notifier: Box<dyn RemoteNotifier>,
        store: D,
        workspace: Result<WorkspaceConfig>,
    ) -> Self {
        let workspace = match workspace {
            Ok(workspace) => Some(workspace),
            Err(e) => {
                if session.is_available() {
                    warn!(
                        "Failed to provision workspace directory with an available viewer attached: {}",
                        e
                    );
                    session.mark_unavailable();
                } else {
                    warn!("Failed to provision workspace directory: {}", e);
                }
                warn!(
                    "No workspace directory is set up; model files will not be exported, and in \
                     batch mode results must be saved manually"
                );
                None
            }
        };

        let active_document_name = store.document_name();
        Self {
            session,
            notifier,
            store,
            mirror: DocumentMirror::new(),
            registry: PublishRegistry::new(),
            workspace,
            active_document_name,
        }
    }

    // ---- session and state access ----

    pub fn session(&self) -> &ViewerSession {
        &self.session
    }

    /// Explicitly re-run the availability and compatibility probes.
    pub fn reprobe(&mut self) -> bool {
        self.session.reprobe()
    }

    /// Authoritative local state, valid whether or not a viewer is attached.
    pub fn mirror(&self) -> &DocumentMirror {
        &self.mirror
    }

    pub fn store(&self) -> &D {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut D {
        &mut self.store
    }

    /// Number of publishes whose local export succeeded this session.
    pub fn published_count(&self) -> u64 {
        self.registry.published_count()
    }

    pub fn workspace(&self) -> Option<&WorkspaceConfig> {
        self.workspace.as_ref()
    }

    pub fn active_document_name(&self) -> &str {
        &self.active_document_name
    }

    /// Re-resolve the workspace directory for a new plugin name.
    pub fn set_plugin_name(&mut self, plugin_name: &str) {
        match WorkspaceConfig::resolve(plugin_name) {
            Ok(workspace) => self.workspace = Some(workspace),
            Err(e) => {
                if self.session.is_available() {
                    warn!(
                        "Failed to re-provision workspace for plugin {} with an available viewer \
                         attached: {}",
                        plugin_name, e
                    );
                    self.session.mark_unavailable();
                } else {
                    warn!(
                        "Failed to re-provision workspace for plugin {}: {}",
                        plugin_name, e
                    );
                }
                self.workspace = None;
            }
        }
    }

    /// Rename the working document. Moves an already-serialized document
    /// file along with it. Do not include an extension.
    pub fn set_model_name(&mut self, model_name: &str) {
        let previous = std::mem::replace(&mut self.active_document_name, model_name.to_string());
        self.store.set_document_name(model_name);

        if let Some(workspace) = self.workspace.as_ref() {
            let old_path = workspace.document_path(&previous);
            if old_path.exists() {
                let new_path = workspace.document_path(model_name);
                if let Err(e) = fs::rename(&old_path, &new_path) {
                    warn!(
                        "Failed to move serialized document {:?} to {:?}: {}",
                        old_path, new_path, e
                    );
                }
            }
        }
    }

    // ---- sync operations ----

    /// Reload all added entities in the viewer's document browser.
    pub fn update_viewer(&self) {
        self.notify(RemoteRequest::new(Operation::UpdateViewer));
    }

    /// Show a single entity.
    pub fn show(&mut self, entity_id: EntityId) {
        self.mirror.set_visibility(entity_id, true);
        self.notify(RemoteRequest::new(Operation::Show).arg("entity_id", entity_id));
    }

    /// Hide a single entity.
    pub fn hide(&mut self, entity_id: EntityId) {
        self.mirror.set_visibility(entity_id, false);
        self.notify(RemoteRequest::new(Operation::Hide).arg("entity_id", entity_id));
    }

    /// Show only the given entity; every other published entity is hidden.
    /// An unregistered ID leaves every entity hidden.
    pub fn show_only(&mut self, entity_id: EntityId) {
        for id in self.mirror.ids() {
            self.mirror.set_visibility(id, id == entity_id);
        }
        self.notify(RemoteRequest::new(Operation::ShowOnly).arg("entity_id", entity_id));
    }

    /// Hide only the given entity; every other published entity is shown.
    pub fn hide_only(&mut self, entity_id: EntityId) {
        for id in self.mirror.ids() {
            self.mirror.set_visibility(id, id != entity_id);
        }
        self.notify(RemoteRequest::new(Operation::HideOnly).arg("entity_id", entity_id));
    }

    /// Hide every published entity.
    pub fn hide_all(&mut self) {
        for id in self.mirror.ids() {
            self.mirror.set_visibility(id, false);
        }
        self.notify(RemoteRequest::new(Operation::HideAll));
    }

    /// Show every published entity.
    pub fn show_all(&mut self) {
        for id in self.mirror.ids() {
            self.mirror.set_visibility(id, true);
        }
        self.notify(RemoteRequest::new(Operation::ShowAll));
    }

    /// Set entity opacity, clamped into `[0.0, 1.0]`.
    pub fn set_transparency(&mut self, entity_id: EntityId, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.mirror.set_opacity(entity_id, opacity);
        self.notify(
            RemoteRequest::new(Operation::SetTransparency)
                .arg("entity_id", entity_id)
                .arg("opacity", opacity),
        );
    }

    /// Colour an entity from the named palette.
    pub fn set_object_colour(&mut self, entity_id: EntityId, selection: ColourSelection) {
        self.apply_colour(entity_id, selection.colour());
    }

    /// Colour an entity with explicit channel values.
    pub fn set_specific_object_colour(
        &mut self,
        entity_id: EntityId,
        red: u8,
        green: u8,
        blue: u8,
    ) {
        self.apply_colour(entity_id, Colour::rgb(red, green, blue));
    }

    fn apply_colour(&mut self, entity_id: EntityId, colour: Colour) {
        self.mirror.set_colour(entity_id, colour);
        self.notify(
            RemoteRequest::new(Operation::SetObjectColour)
                .arg("fname", "colorModel")
                .arg("item_id", entity_id.to_string())
                .arg("red", colour.red)
                .arg("green", colour.green)
                .arg("blue", colour.blue),
        );
    }

    /// Adjust the viewer camera so everything is visible.
    pub fn fit_all(&self) {
        self.notify(RemoteRequest::new(Operation::FitAll));
    }

    /// Serialize the working document, close it locally, and hand the file
    /// over to the viewer for live editing.
    ///
    /// The save must complete before the viewer hears about the file: a
    /// failed serialization sends nothing.
    pub fn commit_to_document(&mut self) {
        let Some(root) = self.workspace.as_ref().map(|w| w.root().to_path_buf()) else {
            warn!("Cannot commit document: no workspace directory");
            return;
        };

        let model_path = match self.store.save_document(&root) {
            Ok(path) => path,
            Err(e) => {
                warn!(
                    "Document serialization failed, the viewer will not be notified: {}",
                    e
                );
                return;
            }
        };
        self.store.close_document();

        self.notify(
            RemoteRequest::new(Operation::CommitToDocument)
                .arg("fname", "commit_to_document")
                .arg("model_path", model_path.to_string_lossy().into_owned()),
        );
    }

    /// Publish an entity: export its mesh and metadata artifacts, then
    /// announce them to the viewer. Returns the entity's document ID.
    ///
    /// The publish ordinal advances once the local export succeeded, whether
    /// or not the viewer accepted the object; on export failure the counter
    /// is untouched and the failure is returned to the caller.
    pub fn add_to_document(&mut self, entity: &D::Entity, name: &str) -> Result<EntityId> {
        let ordinal = self.registry.next_ordinal();
        let basename = PublishRegistry::artifact_basename(ordinal, name);
        let mesh_file = PublishRegistry::mesh_filename(ordinal, name);
        let geometry_file = PublishRegistry::geometry_filename(ordinal, name);

        let (export_dir, plugin_name, mesh_static, geometry_static) = {
            let Some(workspace) = self.workspace.as_ref() else {
                return Err(BridgeError::Config {
                    message: format!(
                        "Cannot publish object {}: no workspace directory is set up",
                        name
                    ),
                });
            };
            (
                workspace.root().to_path_buf(),
                workspace.plugin_name().to_string(),
                workspace.static_path(&mesh_file),
                workspace.static_path(&geometry_file),
            )
        };

        let item_id = match self.store.export_entity(entity, &basename, &export_dir) {
            Ok(item_id) => item_id,
            Err(e) => {
                warn!("Could not publish object named {}: {}", name, e);
                return Err(e);
            }
        };

        let response = self.notify(
            RemoteRequest::new(Operation::AddToDocument)
                .arg("name", name)
                .arg("item_id", item_id.to_string())
                .arg("t2g_file", geometry_file)
                .arg("stl_file", mesh_file)
                .arg("stl_path", plugin_name)
                .arg("stl_path_static", mesh_static)
                .arg("t2g_path_static", geometry_static),
        );
        if !response.is_accepted() {
            debug!(
                "Viewer did not accept published object {} (status {:?})",
                name, response.status
            );
        }

        // Ordinal identity is local: advance regardless of the remote outcome.
        self.registry.commit();
        self.mirror
            .record_published(PublishedEntity::published(ordinal, item_id, name));
        info!("Published {} as {} (entity {})", name, basename, item_id);

        Ok(item_id)
    }

    /// Ask the viewer for all object IDs registered under `name`. Empty when
    /// no viewer is attached or the viewer rejected the query.
    pub fn find_object_by_name(&self, name: &str) -> Vec<EntityId> {
        let response =
            self.notify(RemoteRequest::new(Operation::FindObjectByName).arg("search_name", name));
        if !response.is_accepted() {
            return Vec::new();
        }

        response
            .result
            .as_ref()
            .and_then(|result| result.get("IDs"))
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default()
    }

    /// Gate and deliver one request. Short-circuits with the no-viewer
    /// sentinel, performing zero network I/O, unless the session is
    /// available and compatible.
    fn notify(&self, request: RemoteRequest) -> RemoteResponse {
        if !self.session.is_available() {
            return RemoteResponse::no_viewer();
        }

        let operation = request.operation;
        let response = self.notifier.notify(&request);
        if response.status == ResponseStatus::Rejected {
            warn!("Viewer rejected or failed to process {}", operation);
        }
        response
    }
}
