//! Centralized configuration for the viewer bridge.
//!
//! Timeouts and well-known names live in const blocks; the per-session
//! workspace directory is resolved once into a [`WorkspaceConfig`] and
//! injected wherever paths are needed.

use crate::error::{BridgeError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    /// Loopback host the viewer listens on.
    pub const LOOPBACK_HOST: &'static str = "127.0.0.1";
    /// Route receiving operation requests.
    pub const FRONTEND_ROUTE: &'static str = "toFrontend";
    /// Route answering the plain-text protocol version query.
    pub const VERSION_ROUTE: &'static str = "version";

    /// TCP connect budget for the availability probe.
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(1);
    /// Budget for the version query at probe time.
    pub const VERSION_QUERY_TIMEOUT: Duration = Duration::from_secs(3);
    /// Budget for a single operation request.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
}

/// Shared directory and file-naming configuration.
pub struct PathsConfig;

impl PathsConfig {
    /// Vendor directory under the platform data root.
    pub const VENDOR_DIR_NAME: &'static str = "Viewlink";
    /// Plugin directory used until the host names its own.
    pub const DEFAULT_PLUGIN_NAME: &'static str = "ViewlinkProject";
    /// Extension of the serialized working document.
    pub const DOCUMENT_EXTENSION: &'static str = "cbf";
    /// Extension of exported mesh artifacts.
    pub const MESH_EXTENSION: &'static str = "stl";
    /// Suffix of exported geometry metadata artifacts.
    pub const GEOMETRY_SUFFIX: &'static str = "_geom.json";
}

/// Resolved per-session workspace directory.
///
/// The viewer reads exported artifacts from this directory out-of-band, and
/// serves them statically under the plugin name. Resolution happens once at
/// session construction; every path the bridge writes derives from here.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    plugin_name: String,
    root: PathBuf,
}

impl WorkspaceConfig {
    /// Resolve the workspace under the platform data root:
    /// `{data_root}/{vendor}/{plugin_name}`.
    ///
    /// Creates the directory if it does not yet exist. Fails when no platform
    /// data root is resolvable or the directory cannot be created; callers
    /// degrade the session rather than abort on that failure.
    pub fn resolve(plugin_name: &str) -> Result<Self> {
        let data_root = dirs::data_dir().ok_or_else(|| BridgeError::Config {
            message: "Could not determine platform data directory".to_string(),
        })?;
        let root = data_root
            .join(PathsConfig::VENDOR_DIR_NAME)
            .join(plugin_name);
        Self::at_root(root, plugin_name)
    }

    /// Use an explicit root directory instead of the platform data root.
    ///
    /// Hosts that manage their own scratch space pin the workspace here.
    pub fn at_root(root: impl Into<PathBuf>, plugin_name: &str) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| BridgeError::io_with_path(e, &root))?;
        Ok(Self {
            plugin_name: plugin_name.to_string(),
            root,
        })
    }

    /// Plugin name this workspace was resolved for.
    pub fn plugin_name(&self) -> &str {
        &self.plugin_name
    }

    /// Directory exported artifacts and the serialized document land in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the serialized working document: `{root}/{name}.cbf`.
    pub fn document_path(&self, document_name: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", document_name, PathsConfig::DOCUMENT_EXTENSION))
    }

    /// Viewer-side static path of an exported artifact: `{plugin}/{file}`.
    ///
    /// Always slash-separated; this is a URL fragment for the viewer's static
    /// file server, not a local filesystem path.
    pub fn static_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.plugin_name, file_name)
    }
}
