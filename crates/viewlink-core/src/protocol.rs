//! Wire protocol types for the viewer channel.
//!
//! A request is a named operation plus a JSON argument mapping, POSTed as
//! `{"operation": <name>, "arguments": {...}}`. The viewer answers with a
//! boolean `status` and an optional `result` payload. Locally the status is
//! widened to three values so "no viewer attached" stays distinguishable from
//! "viewer rejected the operation".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protocol version this backend speaks.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Semantic compatibility rule: same major version.
///
/// Unparseable version strings on either side count as incompatible.
pub fn is_version_compatible(local: &str, remote: &str) -> bool {
    let (Ok(local), Ok(remote)) = (
        semver::Version::parse(local.trim()),
        semver::Version::parse(remote.trim()),
    ) else {
        return false;
    };
    local.major == remote.major
}

/// Operations the viewer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    UpdateViewer,
    CommitToDocument,
    Hide,
    Show,
    HideAll,
    ShowAll,
    ShowOnly,
    HideOnly,
    SetTransparency,
    FitAll,
    AddToDocument,
    SetObjectColour,
    FindObjectByName,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::UpdateViewer => "update_viewer",
            Operation::CommitToDocument => "commit_to_document",
            Operation::Hide => "hide",
            Operation::Show => "show",
            Operation::HideAll => "hide_all",
            Operation::ShowAll => "show_all",
            Operation::ShowOnly => "show_only",
            Operation::HideOnly => "hide_only",
            Operation::SetTransparency => "set_transparency",
            Operation::FitAll => "fit_all",
            Operation::AddToDocument => "add_to_document",
            Operation::SetObjectColour => "set_object_colour",
            Operation::FindObjectByName => "find_object_by_name",
        }
    }

    /// Parse a wire name into an operation. Unknown names are `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "update_viewer" => Some(Operation::UpdateViewer),
            "commit_to_document" => Some(Operation::CommitToDocument),
            "hide" => Some(Operation::Hide),
            "show" => Some(Operation::Show),
            "hide_all" => Some(Operation::HideAll),
            "show_all" => Some(Operation::ShowAll),
            "show_only" => Some(Operation::ShowOnly),
            "hide_only" => Some(Operation::HideOnly),
            "set_transparency" => Some(Operation::SetTransparency),
            "fit_all" => Some(Operation::FitAll),
            "add_to_document" => Some(Operation::AddToDocument),
            "set_object_colour" => Some(Operation::SetObjectColour),
            "find_object_by_name" => Some(Operation::FindObjectByName),
            _ => None,
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Request envelope for one viewer operation.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteRequest {
    pub operation: Operation,
    pub arguments: Map<String, Value>,
}

impl RemoteRequest {
    /// Create a request with an empty argument mapping.
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            arguments: Map::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.arguments.insert(key.to_string(), value.into());
        self
    }
}

/// Normalized outcome of a remote notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseStatus {
    /// Viewer accepted the operation.
    Accepted,
    /// Viewer (or the transport to it) rejected the operation.
    Rejected,
    /// No usable viewer is attached; the request was never sent.
    NoViewer,
}

/// Normalized response for one viewer operation.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteResponse {
    pub status: ResponseStatus,
    pub result: Option<Value>,
}

impl RemoteResponse {
    pub fn accepted(result: Option<Value>) -> Self {
        Self {
            status: ResponseStatus::Accepted,
            result,
        }
    }

    pub fn rejected() -> Self {
        Self {
            status: ResponseStatus::Rejected,
            result: None,
        }
    }

    /// The sentinel returned without any network I/O when no viewer is
    /// attached.
    pub fn no_viewer() -> Self {
        Self {
            status: ResponseStatus::NoViewer,
            result: None,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.status == ResponseStatus::Accepted
    }

    /// Normalize a wire body. The viewer sends `{"status": bool, "result": ...}`;
    /// anything else (missing or non-boolean status) counts as rejected.
    pub fn from_wire(body: &Value) -> Self {
        match body.get("status").and_then(Value::as_bool) {
            Some(true) => Self::accepted(body.get("result").cloned()),
            _ => Self::rejected(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_wire_shape() {
        let request = RemoteRequest::new(Operation::SetTransparency)
            .arg("entity_id", 7)
            .arg("opacity", 0.5);

        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(
            wire,
            json!({
                "operation": "set_transparency",
                "arguments": {"entity_id": 7, "opacity": 0.5}
            })
        );
    }

    #[test]
    fn test_empty_arguments_serialize_as_object() {
        let request = RemoteRequest::new(Operation::UpdateViewer);
        let wire = serde_json::to_value(&request).unwrap();
        assert_eq!(wire, json!({"operation": "update_viewer", "arguments": {}}));
    }

    #[test]
    fn test_operation_name_roundtrip() {
        for op in [
            Operation::UpdateViewer,
            Operation::CommitToDocument,
            Operation::Hide,
            Operation::Show,
            Operation::HideAll,
            Operation::ShowAll,
            Operation::ShowOnly,
            Operation::HideOnly,
            Operation::SetTransparency,
            Operation::FitAll,
            Operation::AddToDocument,
            Operation::SetObjectColour,
            Operation::FindObjectByName,
        ] {
            assert_eq!(Operation::from_name(op.as_str()), Some(op));
        }
        assert_eq!(Operation::from_name("reticulate_splines"), None);
    }

    #[test]
    fn test_from_wire_accepted_keeps_result() {
        let response = RemoteResponse::from_wire(&json!({
            "status": true,
            "result": {"IDs": [1, 2, 3]}
        }));
        assert!(response.is_accepted());
        assert_eq!(response.result, Some(json!({"IDs": [1, 2, 3]})));
    }

    #[test]
    fn test_from_wire_false_or_malformed_is_rejected() {
        assert_eq!(
            RemoteResponse::from_wire(&json!({"status": false})).status,
            ResponseStatus::Rejected
        );
        assert_eq!(
            RemoteResponse::from_wire(&json!({"unexpected": 1})).status,
            ResponseStatus::Rejected
        );
        assert_eq!(
            RemoteResponse::from_wire(&json!({"status": "yes"})).status,
            ResponseStatus::Rejected
        );
    }

    #[test]
    fn test_no_viewer_is_distinct_from_rejected() {
        assert_ne!(RemoteResponse::no_viewer(), RemoteResponse::rejected());
    }

    #[test]
    fn test_version_compatibility_same_major() {
        assert!(is_version_compatible("0.3.0", "0.9.2"));
        assert!(is_version_compatible("1.0.0", "1.4.1"));
        assert!(!is_version_compatible("0.3.0", "1.0.0"));
        assert!(!is_version_compatible("2.0.0", "1.9.9"));
    }

    #[test]
    fn test_version_compatibility_rejects_garbage() {
        assert!(!is_version_compatible("0.3.0", "development"));
        assert!(!is_version_compatible("", "0.3.0"));
        // Trailing whitespace from the plain-text endpoint is tolerated.
        assert!(is_version_compatible("0.3.0", "0.3.1\n"));
    }
}
