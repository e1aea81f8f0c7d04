//! HTTP transport to the viewer frontend.
//!
//! Notification is fire-and-forget: one synchronous POST per request, no
//! retries, and no error ever crosses this boundary. A transport failure is
//! logged and normalized to a rejected response; it does not change session
//! availability (a transient network error is not "the viewer went away").

use crate::config::NetworkConfig;
use crate::error::{BridgeError, Result};
use crate::protocol::{RemoteRequest, RemoteResponse};
use tracing::warn;

/// Capability seam for remote notification.
///
/// The bridge talks to the viewer exclusively through this trait, so headless
/// hosts get a no-op implementation and tests substitute a recording fake.
pub trait RemoteNotifier {
    /// Deliver one request, returning the normalized outcome. Must not panic
    /// or return an error; transport failures map to
    /// [`RemoteResponse::rejected`].
    fn notify(&self, request: &RemoteRequest) -> RemoteResponse;
}

/// Notifier that POSTs requests to the viewer's frontend route.
pub struct HttpNotifier {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl HttpNotifier {
    /// Build a notifier for `http://{host}:{port}/toFrontend`.
    pub fn new(host: &str, port: u16) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(NetworkConfig::REQUEST_TIMEOUT)
            .user_agent(concat!("viewlink/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BridgeError::Network {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(e),
            })?;

        Ok(Self {
            client,
            endpoint: format!(
                "http://{}:{}/{}",
                host,
                port,
                NetworkConfig::FRONTEND_ROUTE
            ),
        })
    }

    /// Endpoint requests are POSTed to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl RemoteNotifier for HttpNotifier {
    fn notify(&self, request: &RemoteRequest) -> RemoteResponse {
        let response = match self.client.post(&self.endpoint).json(request).send() {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "POST {} ({}) failed: {}",
                    self.endpoint, request.operation, e
                );
                return RemoteResponse::rejected();
            }
        };

        match response.json::<serde_json::Value>() {
            Ok(body) => RemoteResponse::from_wire(&body),
            Err(e) => {
                warn!(
                    "Malformed response to {} from viewer: {}",
                    request.operation, e
                );
                RemoteResponse::rejected()
            }
        }
    }
}

/// Notifier for headless mode: every request short-circuits to the
/// no-viewer sentinel without any I/O.
pub struct NoopNotifier;

impl RemoteNotifier for NoopNotifier {
    fn notify(&self, _request: &RemoteRequest) -> RemoteResponse {
        RemoteResponse::no_viewer()
    }
}

/// Query the viewer's plain-text protocol version.
pub fn fetch_version(host: &str, port: u16) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(NetworkConfig::VERSION_QUERY_TIMEOUT)
        .build()
        .map_err(|e| BridgeError::Network {
            message: format!("Failed to create HTTP client: {}", e),
            source: Some(e),
        })?;

    let url = format!("http://{}:{}/{}", host, port, NetworkConfig::VERSION_ROUTE);
    let text = client
        .get(&url)
        .send()
        .map_err(|e| BridgeError::VersionQuery {
            message: format!("GET {} failed: {}", url, e),
        })?
        .text()
        .map_err(|e| BridgeError::VersionQuery {
            message: format!("Unreadable version body from {}: {}", url, e),
        })?;

    Ok(text.trim().to_string())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::protocol::ResponseStatus;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Records every request it is asked to deliver; answers with a canned
    /// status. Tests keep a clone of the `requests` handle for inspection.
    pub(crate) struct RecordingNotifier {
        pub requests: Rc<RefCell<Vec<RemoteRequest>>>,
        pub respond_with: ResponseStatus,
        pub result: Option<serde_json::Value>,
    }

    impl RecordingNotifier {
        pub(crate) fn accepting() -> (Self, Rc<RefCell<Vec<RemoteRequest>>>) {
            let requests = Rc::new(RefCell::new(Vec::new()));
            (
                Self {
                    requests: Rc::clone(&requests),
                    respond_with: ResponseStatus::Accepted,
                    result: None,
                },
                requests,
            )
        }

        pub(crate) fn rejecting() -> (Self, Rc<RefCell<Vec<RemoteRequest>>>) {
            let requests = Rc::new(RefCell::new(Vec::new()));
            (
                Self {
                    requests: Rc::clone(&requests),
                    respond_with: ResponseStatus::Rejected,
                    result: None,
                },
                requests,
            )
        }
    }

    impl RemoteNotifier for RecordingNotifier {
        fn notify(&self, request: &RemoteRequest) -> RemoteResponse {
            self.requests.borrow_mut().push(request.clone());
            RemoteResponse {
                status: self.respond_with,
                result: self.result.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{Operation, ResponseStatus};
    use std::io::{Read, Write};
    use std::net::TcpListener;

    /// Serve one canned HTTP response per connection on an OS-assigned port.
    fn spawn_http_server(body: &'static str) -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        std::thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { break };
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        port
    }

    /// A loopback port with nothing listening on it.
    fn dead_port() -> u16 {
        TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port()
    }

    #[test]
    fn test_notify_dead_port_is_rejected_not_panic() {
        let notifier = HttpNotifier::new("127.0.0.1", dead_port()).unwrap();
        let response = notifier.notify(&RemoteRequest::new(Operation::FitAll));
        assert_eq!(response.status, ResponseStatus::Rejected);
    }

    #[test]
    fn test_notify_parses_wire_status() {
        let port = spawn_http_server(r#"{"status": true, "result": {"IDs": [4]}}"#);
        let notifier = HttpNotifier::new("127.0.0.1", port).unwrap();

        let response = notifier.notify(&RemoteRequest::new(Operation::UpdateViewer));
        assert!(response.is_accepted());
        assert_eq!(response.result, Some(serde_json::json!({"IDs": [4]})));
    }

    #[test]
    fn test_notify_malformed_body_is_rejected() {
        let port = spawn_http_server("this is not json");
        let notifier = HttpNotifier::new("127.0.0.1", port).unwrap();

        let response = notifier.notify(&RemoteRequest::new(Operation::UpdateViewer));
        assert_eq!(response.status, ResponseStatus::Rejected);
    }

    #[test]
    fn test_fetch_version_trims_body() {
        let port = spawn_http_server("1.2.3\n");
        let version = fetch_version("127.0.0.1", port).unwrap();
        assert_eq!(version, "1.2.3");
    }

    #[test]
    fn test_fetch_version_dead_port_is_error_not_panic() {
        let result = fetch_version("127.0.0.1", dead_port());
        assert!(matches!(result, Err(BridgeError::VersionQuery { .. })));
    }

    #[test]
    fn test_noop_notifier_returns_no_viewer() {
        let response = NoopNotifier.notify(&RemoteRequest::new(Operation::HideAll));
        assert_eq!(response.status, ResponseStatus::NoViewer);
    }

    #[test]
    fn test_endpoint_shape() {
        let notifier = HttpNotifier::new("127.0.0.1", 8188).unwrap();
        assert_eq!(notifier.endpoint(), "http://127.0.0.1:8188/toFrontend");
    }
}
