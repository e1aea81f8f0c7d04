//! Viewer session state and the availability gate.
//!
//! Availability is computed before any request is attempted, and every
//! operation short-circuits once the session is unavailable. There are no
//! automatic transitions after construction: a session that went unavailable
//! stays that way until [`ViewerSession::reprobe`] is called explicitly.

use crate::config::NetworkConfig;
use crate::protocol::{self, PROTOCOL_VERSION};
use crate::transport;
use std::net::{SocketAddr, TcpStream};
use tracing::{debug, warn};

/// Gate state, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No probe has run yet.
    Unprobed,
    /// No viewer is reachable, or the reachable one is incompatible.
    Unavailable,
    /// The port answered but the version handshake has not run.
    AvailableUnchecked,
    /// A viewer is reachable and speaks a compatible protocol.
    AvailableCompatible,
}

/// One connection attempt to a remote viewer, held for the lifetime of the
/// host-application session.
#[derive(Debug)]
pub struct ViewerSession {
    /// Port the viewer listens on; doubles as the viewer's identifier.
    viewer_id: u16,
    viewer_url: String,
    state: SessionState,
    /// Remote protocol version, once queried.
    protocol_version: Option<String>,
}

impl ViewerSession {
    /// Create a session and run both probes immediately.
    pub fn connect(viewer_id: u16) -> Self {
        let mut session = Self {
            viewer_id,
            viewer_url: NetworkConfig::LOOPBACK_HOST.to_string(),
            state: SessionState::Unprobed,
            protocol_version: None,
        };
        session.probe();
        session
    }

    /// Create a session that never probes and is permanently unavailable
    /// until re-probed. For batch or headless hosts.
    pub fn detached(viewer_id: u16) -> Self {
        Self {
            viewer_id,
            viewer_url: NetworkConfig::LOOPBACK_HOST.to_string(),
            state: SessionState::Unavailable,
            protocol_version: None,
        }
    }

    /// Run the availability and compatibility probes, settling the state
    /// machine into `AvailableCompatible` or `Unavailable`.
    pub fn probe(&mut self) -> bool {
        self.state = if self.probe_availability() {
            SessionState::AvailableUnchecked
        } else {
            SessionState::Unavailable
        };

        if self.state == SessionState::AvailableUnchecked {
            // An incompatible viewer is equivalent to no viewer.
            self.state = if self.probe_compatibility() {
                SessionState::AvailableCompatible
            } else {
                SessionState::Unavailable
            };
        }

        self.is_available()
    }

    /// Explicit recovery path: the only unavailable-to-available transition.
    pub fn reprobe(&mut self) -> bool {
        self.protocol_version = None;
        self.probe()
    }

    /// True iff the state machine settled in `AvailableCompatible`.
    pub fn is_available(&self) -> bool {
        self.state == SessionState::AvailableCompatible
    }

    /// Degrade the session; used when a later failure (such as an
    /// unprovisionable workspace) makes the viewer unusable.
    pub fn mark_unavailable(&mut self) {
        self.state = SessionState::Unavailable;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn viewer_id(&self) -> u16 {
        self.viewer_id
    }

    pub fn viewer_url(&self) -> &str {
        &self.viewer_url
    }

    /// Remote protocol version reported during the handshake, if any.
    pub fn protocol_version(&self) -> Option<&str> {
        self.protocol_version.as_deref()
    }

    /// Short-lived TCP connect to check whether anything listens on the
    /// viewer port. Any failure means "no viewer", never an error.
    fn probe_availability(&self) -> bool {
        let addr: SocketAddr = match format!("{}:{}", self.viewer_url, self.viewer_id).parse() {
            Ok(addr) => addr,
            Err(e) => {
                warn!(
                    "Invalid viewer address {}:{}: {}",
                    self.viewer_url, self.viewer_id, e
                );
                return false;
            }
        };

        match TcpStream::connect_timeout(&addr, NetworkConfig::PROBE_TIMEOUT) {
            Ok(_) => true,
            Err(e) => {
                debug!(
                    "Availability probe to {} failed: {}. Assuming no viewer is connected",
                    addr, e
                );
                false
            }
        }
    }

    /// Version handshake against the reachable viewer. A failed query
    /// degrades to "not compatible" instead of raising.
    fn probe_compatibility(&mut self) -> bool {
        let remote = match transport::fetch_version(&self.viewer_url, self.viewer_id) {
            Ok(version) => version,
            Err(e) => {
                warn!("Viewer version query failed: {}", e);
                return false;
            }
        };

        self.protocol_version = Some(remote.clone());

        if !protocol::is_version_compatible(PROTOCOL_VERSION, &remote) {
            warn!(
                "Viewer protocol version ({}) is not compatible with backend protocol version ({})",
                remote, PROTOCOL_VERSION
            );
            return false;
        }

        true
    }

    /// Construct a session in a given state without probing.
    #[cfg(test)]
    pub(crate) fn with_state(viewer_id: u16, state: SessionState) -> Self {
        Self {
            viewer_id,
            viewer_url: NetworkConfig::LOOPBACK_HOST.to_string(),
            state,
            protocol_version: None,
        }
    }
}
