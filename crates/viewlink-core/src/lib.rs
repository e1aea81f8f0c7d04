//! Viewlink - headless bridge between an engineering document model and the
//! Viewlink 3D viewer.
//!
//! The bridge mirrors document entity state (visibility, colour, opacity)
//! in-process and keeps an optional out-of-process viewer in sync over a
//! loopback HTTP channel. The viewer is optional by design: when none is
//! attached, or the attached one speaks an incompatible protocol, every
//! operation still mutates local state and returns normally.
//!
//! # Example
//!
//! ```rust,ignore
//! use viewlink::{ViewerBridge, ColourSelection};
//!
//! // `store` implements viewlink::DocumentStore for the host document model.
//! let mut bridge = ViewerBridge::connect(8188, store);
//!
//! let bracket = bridge.add_to_document(&entity, "Bracket")?;
//! bridge.set_object_colour(bracket, ColourSelection::SteelBlue);
//! bridge.show_only(bracket);
//! bridge.fit_all();
//! ```

pub mod bridge;
pub mod config;
pub mod dispatch;
pub mod document;
pub mod error;
pub mod mirror;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use bridge::ViewerBridge;
pub use config::{NetworkConfig, PathsConfig, WorkspaceConfig};
pub use dispatch::{dispatch, DispatchOutcome};
pub use document::DocumentStore;
pub use error::{BridgeError, Result};
pub use mirror::{Colour, ColourSelection, DocumentMirror, EntityId, PublishedEntity};
pub use protocol::{
    Operation, RemoteRequest, RemoteResponse, ResponseStatus, PROTOCOL_VERSION,
};
pub use registry::PublishRegistry;
pub use session::{SessionState, ViewerSession};
pub use transport::{HttpNotifier, NoopNotifier, RemoteNotifier};
