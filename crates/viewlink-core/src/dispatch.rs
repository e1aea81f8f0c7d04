//! Command dispatch for host-side plugin callbacks.
//!
//! Inbound command names resolve against the closed [`Operation`] set at
//! parse time; handlers are plain match arms. The outcome keeps "no such
//! command" and "command found but failed" as distinct variants, and neither
//! aborts a batch run.

use crate::bridge::ViewerBridge;
use crate::document::DocumentStore;
use crate::mirror::EntityId;
use crate::protocol::Operation;
use serde_json::Value;
use tracing::warn;

/// Result of dispatching one named command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Command resolved and ran.
    Dispatched,
    /// No command with that name exists.
    NotFound,
    /// Command resolved but could not run.
    Failed(String),
}

/// Resolve `command` by name and run it against the bridge with the given
/// JSON argument mapping.
pub fn dispatch<D: DocumentStore>(
    bridge: &mut ViewerBridge<D>,
    command: &str,
    args: &Value,
) -> DispatchOutcome {
    let Some(operation) = Operation::from_name(command) else {
        warn!("Could not find command {}", command);
        return DispatchOutcome::NotFound;
    };

    match run(bridge, operation, args) {
        Ok(()) => DispatchOutcome::Dispatched,
        Err(reason) => {
            warn!("Command {} failed: {}", command, reason);
            DispatchOutcome::Failed(reason)
        }
    }
}

fn run<D: DocumentStore>(
    bridge: &mut ViewerBridge<D>,
    operation: Operation,
    args: &Value,
) -> std::result::Result<(), String> {
    match operation {
        Operation::UpdateViewer => bridge.update_viewer(),
        Operation::FitAll => bridge.fit_all(),
        Operation::HideAll => bridge.hide_all(),
        Operation::ShowAll => bridge.show_all(),
        Operation::CommitToDocument => bridge.commit_to_document(),
        Operation::Hide => bridge.hide(entity_id(args)?),
        Operation::Show => bridge.show(entity_id(args)?),
        Operation::ShowOnly => bridge.show_only(entity_id(args)?),
        Operation::HideOnly => bridge.hide_only(entity_id(args)?),
        Operation::SetTransparency => {
            bridge.set_transparency(entity_id(args)?, float_arg(args, "opacity")?)
        }
        Operation::SetObjectColour => bridge.set_specific_object_colour(
            item_id(args)?,
            channel_arg(args, "red")?,
            channel_arg(args, "green")?,
            channel_arg(args, "blue")?,
        ),
        Operation::FindObjectByName => {
            let name = string_arg(args, "search_name")?;
            bridge.find_object_by_name(&name);
        }
        Operation::AddToDocument => {
            // Publishing needs an in-process entity handle, which a name/JSON
            // pair cannot carry.
            return Err("add_to_document cannot be dispatched by name".to_string());
        }
    }
    Ok(())
}

fn entity_id(args: &Value) -> std::result::Result<EntityId, String> {
    args.get("entity_id")
        .and_then(Value::as_i64)
        .ok_or_else(|| "missing or invalid entity_id".to_string())
}

/// `item_id` crosses the wire as a string; a bare integer is tolerated.
fn item_id(args: &Value) -> std::result::Result<EntityId, String> {
    let value = args
        .get("item_id")
        .ok_or_else(|| "missing item_id".to_string())?;
    match value {
        Value::String(s) => s
            .parse::<EntityId>()
            .map_err(|_| format!("invalid item_id: {}", s)),
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("invalid item_id: {}", n)),
        other => Err(format!("invalid item_id: {}", other)),
    }
}

fn float_arg(args: &Value, key: &str) -> std::result::Result<f64, String> {
    args.get(key)
        .and_then(Value::as_f64)
        .ok_or_else(|| format!("missing or invalid {}", key))
}

fn channel_arg(args: &Value, key: &str) -> std::result::Result<u8, String> {
    let value = args
        .get(key)
        .and_then(Value::as_u64)
        .ok_or_else(|| format!("missing or invalid {}", key))?;
    u8::try_from(value).map_err(|_| format!("{} out of range: {}", key, value))
}

fn string_arg(args: &Value, key: &str) -> std::result::Result<String, String> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| format!("missing or invalid {}", key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorkspaceConfig;
    use crate::document::testing::FakeStore;
    use crate::session::{SessionState, ViewerSession};
    use crate::transport::testing::RecordingNotifier;
    use serde_json::json;
    use tempfile::TempDir;

    fn bridge(temp_dir: &TempDir) -> ViewerBridge<FakeStore> {
        let (notifier, _requests) = RecordingNotifier::accepting();
        ViewerBridge::new(
            ViewerSession::with_state(8188, SessionState::AvailableCompatible),
            Box::new(notifier),
            FakeStore::new(),
            WorkspaceConfig::at_root(temp_dir.path().join("ws"), "TestPlugin").unwrap(),
        )
    }

    #[test]
    fn test_unknown_command_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let mut bridge = bridge(&temp_dir);

        let outcome = dispatch(&mut bridge, "reticulate_splines", &json!({}));
        assert_eq!(outcome, DispatchOutcome::NotFound);
    }

    #[test]
    fn test_known_command_mutates_the_mirror() {
        let temp_dir = TempDir::new().unwrap();
        let mut bridge = bridge(&temp_dir);
        let a = bridge.add_to_document(&(), "A").unwrap();

        let outcome = dispatch(&mut bridge, "hide", &json!({"entity_id": a}));

        assert_eq!(outcome, DispatchOutcome::Dispatched);
        assert!(!bridge.mirror().get(a).unwrap().visible);
    }

    #[test]
    fn test_missing_argument_is_failed_not_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let mut bridge = bridge(&temp_dir);

        let outcome = dispatch(&mut bridge, "hide", &json!({}));
        match outcome {
            DispatchOutcome::Failed(reason) => assert!(reason.contains("entity_id")),
            other => panic!("Expected Failed, got: {:?}", other),
        }
    }

    #[test]
    fn test_colour_command_accepts_string_item_id() {
        let temp_dir = TempDir::new().unwrap();
        let mut bridge = bridge(&temp_dir);
        let a = bridge.add_to_document(&(), "A").unwrap();

        let outcome = dispatch(
            &mut bridge,
            "set_object_colour",
            &json!({
                "fname": "colorModel",
                "item_id": a.to_string(),
                "red": 10,
                "green": 20,
                "blue": 30
            }),
        );

        assert_eq!(outcome, DispatchOutcome::Dispatched);
        assert_eq!(
            bridge.mirror().get(a).unwrap().colour,
            crate::mirror::Colour::rgb(10, 20, 30)
        );
    }

    #[test]
    fn test_colour_channel_out_of_range_is_failed() {
        let temp_dir = TempDir::new().unwrap();
        let mut bridge = bridge(&temp_dir);

        let outcome = dispatch(
            &mut bridge,
            "set_object_colour",
            &json!({"item_id": 1, "red": 300, "green": 0, "blue": 0}),
        );
        match outcome {
            DispatchOutcome::Failed(reason) => assert!(reason.contains("red")),
            other => panic!("Expected Failed, got: {:?}", other),
        }
    }

    #[test]
    fn test_zero_argument_commands_dispatch() {
        let temp_dir = TempDir::new().unwrap();
        let mut bridge = bridge(&temp_dir);

        for name in ["update_viewer", "fit_all", "hide_all", "show_all"] {
            assert_eq!(
                dispatch(&mut bridge, name, &json!({})),
                DispatchOutcome::Dispatched,
                "command {} should dispatch",
                name
            );
        }
    }

    #[test]
    fn test_add_to_document_cannot_be_name_dispatched() {
        let temp_dir = TempDir::new().unwrap();
        let mut bridge = bridge(&temp_dir);

        let outcome = dispatch(&mut bridge, "add_to_document", &json!({"name": "A"}));
        assert!(matches!(outcome, DispatchOutcome::Failed(_)));
    }
}
