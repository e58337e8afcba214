//! External command handling via stdin.
//!
//! This module lets the controller be driven by stdin JSONL commands. It is
//! the automation surface used for testing and scripting without a UI.
//!
//! # Protocol
//!
//! Commands are sent as JSON objects, one per line (JSONL format):
//!
//! ```json
//! {"type": "attach"}
//! {"type": "toggleFeature", "id": "godmode"}
//! {"type": "toggleGroup", "group": "camera"}
//! {"type": "bindHotkey", "id": "anti-afk"}
//! {"type": "captureKey", "key": "g", "modifiers": ["ctrl", "shift"]}
//! {"type": "mouseHotkey", "chord": "Mouse4"}
//! {"type": "quit"}
//! ```
//!
//! # Example Usage
//!
//! ```bash
//! # Attach and enable a feature
//! printf '%s\n' '{"type": "attach"}' '{"type": "setFeature", "id": "godmode", "enabled": true}' | ./modext
//!
//! # Record a binding
//! printf '%s\n' '{"type": "bindHotkey", "id": "godmode"}' '{"type": "captureKey", "key": "g", "modifiers": ["ctrl"]}' | ./modext
//! ```

use crate::capture::KeyPress;
use crate::chord::{Chord, HeldModifiers, PointerButton};
use crate::controller::ControllerEvent;
use crate::features::FeatureGroup;
use crate::logging;

/// External commands that can be sent to the controller via stdin
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ExternalCommand {
    Attach,
    Detach,
    /// Log a status snapshot
    Status,
    SetFeature {
        id: String,
        enabled: bool,
    },
    ToggleFeature {
        id: String,
    },
    /// group: "player", "movement", "camera" or "settings"
    ToggleGroup {
        group: FeatureGroup,
    },
    /// speed: run speed to write; defaults to the Super Run preset
    SuperRun {
        #[serde(default)]
        speed: Option<f32>,
    },
    ResetSuperRun,
    /// Start a capture session for a feature or action id
    BindHotkey {
        id: String,
    },
    /// Key press delivered to the capture session
    /// key: Key name like "g", "F5", "Escape", "Backspace", " "
    /// modifiers: Optional array of modifiers ["ctrl", "alt", "shift", "meta"]
    CaptureKey {
        key: String,
        #[serde(default)]
        modifiers: Vec<String>,
    },
    /// Pointer button (DOM numbering: 1 middle, 3 back, 4 forward) for the capture session
    CapturePointer {
        button: u8,
    },
    ClearHotkey {
        id: String,
    },
    /// Simulate a live hook reporting `id`
    Hotkey {
        id: String,
    },
    /// Deliver a pointer chord such as "Mouse5" on the pointer channel
    MouseHotkey {
        chord: String,
    },
    ToggleCollapse,
    SetScale {
        scale: f32,
    },
    SetNonActivating {
        enabled: bool,
    },
    SetAlwaysOnTop {
        enabled: bool,
    },
    Quit,
}

/// Which controller channel a command travels on
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    Command(ControllerEvent),
    Hook(String),
    Pointer(Chord),
}

impl ExternalCommand {
    /// Map to a controller event. Returns `None` for an unknown pointer button.
    pub fn route(self) -> Option<Routed> {
        let event = match self {
            ExternalCommand::Attach => ControllerEvent::Attach,
            ExternalCommand::Detach => ControllerEvent::Detach,
            ExternalCommand::Status => ControllerEvent::Status,
            ExternalCommand::SetFeature { id, enabled } => {
                ControllerEvent::SetFeature { id, enabled }
            }
            ExternalCommand::ToggleFeature { id } => ControllerEvent::ToggleFeature { id },
            ExternalCommand::ToggleGroup { group } => ControllerEvent::ToggleGroup { group },
            ExternalCommand::SuperRun { speed } => ControllerEvent::SuperRun { speed },
            ExternalCommand::ResetSuperRun => ControllerEvent::ResetSuperRun,
            ExternalCommand::BindHotkey { id } => ControllerEvent::BeginCapture { id },
            ExternalCommand::CaptureKey { key, modifiers } => ControllerEvent::CaptureKey(
                KeyPress::new(key, HeldModifiers::from_names(modifiers.as_slice())),
            ),
            ExternalCommand::CapturePointer { button } => {
                ControllerEvent::CapturePointer(PointerButton::from_index(button)?)
            }
            ExternalCommand::ClearHotkey { id } => ControllerEvent::ClearBinding { id },
            ExternalCommand::Hotkey { id } => return Some(Routed::Hook(id)),
            ExternalCommand::MouseHotkey { chord } => {
                return Some(Routed::Pointer(Chord::new(chord)))
            }
            ExternalCommand::ToggleCollapse => ControllerEvent::ToggleCollapse,
            ExternalCommand::SetScale { scale } => ControllerEvent::SetScale(scale),
            ExternalCommand::SetNonActivating { enabled } => {
                ControllerEvent::SetNonActivating(enabled)
            }
            ExternalCommand::SetAlwaysOnTop { enabled } => ControllerEvent::SetAlwaysOnTop(enabled),
            ExternalCommand::Quit => ControllerEvent::Shutdown,
        };
        Some(Routed::Command(event))
    }
}

/// Parse one stdin line. Blank and malformed lines yield `None`.
pub fn parse_line(line: &str) -> Option<ExternalCommand> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    logging::log("STDIN", &format!("Received: {}", line));
    match serde_json::from_str::<ExternalCommand>(line) {
        Ok(cmd) => {
            logging::log("STDIN", &format!("Parsed command: {:?}", cmd));
            Some(cmd)
        }
        Err(e) => {
            logging::log("STDIN", &format!("Failed to parse command: {}", e));
            None
        }
    }
}

/// Start a thread that listens on stdin for external JSONL commands.
/// Returns an async_channel::Receiver that can be awaited without polling.
///
/// # Channel Capacity
///
/// Uses a bounded channel with capacity of 100 to prevent unbounded memory growth.
/// This is generous for stdin commands which typically arrive at < 10/sec.
///
/// # Thread Safety
///
/// Spawns a background thread that reads stdin line-by-line. When the channel
/// is closed (receiver dropped), the thread will exit gracefully.
pub fn start_stdin_listener() -> async_channel::Receiver<ExternalCommand> {
    use std::io::BufRead;

    let (tx, rx) = async_channel::bounded(100);

    std::thread::spawn(move || {
        logging::log("STDIN", "External command listener started");
        let stdin = std::io::stdin();
        let reader = stdin.lock();

        for line in reader.lines() {
            match line {
                Ok(line) => {
                    let Some(cmd) = parse_line(&line) else {
                        continue;
                    };
                    // send_blocking is used since we're in a sync thread
                    if tx.send_blocking(cmd).is_err() {
                        logging::log("STDIN", "Command channel closed, exiting");
                        break;
                    }
                }
                Err(e) => {
                    logging::log("STDIN", &format!("Error reading stdin: {}", e));
                    break;
                }
            }
        }
        logging::log("STDIN", "External command listener exiting");
    });

    rx
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_command_attach_deserialization() {
        let json = r#"{"type": "attach"}"#;
        let cmd: ExternalCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd, ExternalCommand::Attach);
    }

    #[test]
    fn test_external_command_set_feature_deserialization() {
        let json = r#"{"type": "setFeature", "id": "godmode", "enabled": true}"#;
        let cmd: ExternalCommand = serde_json::from_str(json).unwrap();
        match cmd {
            ExternalCommand::SetFeature { id, enabled } => {
                assert_eq!(id, "godmode");
                assert!(enabled);
            }
            _ => panic!("Expected SetFeature command"),
        }
    }

    #[test]
    fn test_external_command_toggle_group_deserialization() {
        let json = r#"{"type": "toggleGroup", "group": "camera"}"#;
        let cmd: ExternalCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            ExternalCommand::ToggleGroup {
                group: FeatureGroup::Camera
            }
        );
    }

    #[test]
    fn test_external_command_super_run_speed_is_optional() {
        let json = r#"{"type": "superRun"}"#;
        let cmd: ExternalCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd, ExternalCommand::SuperRun { speed: None });

        let json = r#"{"type": "superRun", "speed": 12.5}"#;
        let cmd: ExternalCommand = serde_json::from_str(json).unwrap();
        assert_eq!(cmd, ExternalCommand::SuperRun { speed: Some(12.5) });
    }

    #[test]
    fn test_capture_key_routes_with_modifiers() {
        let json = r#"{"type": "captureKey", "key": "g", "modifiers": ["ctrl", "shift"]}"#;
        let cmd: ExternalCommand = serde_json::from_str(json).unwrap();
        let expected = KeyPress::new(
            "g",
            HeldModifiers {
                ctrl: true,
                shift: true,
                ..Default::default()
            },
        );
        assert_eq!(
            cmd.route(),
            Some(Routed::Command(ControllerEvent::CaptureKey(expected)))
        );
    }

    #[test]
    fn test_capture_key_no_modifiers() {
        let json = r#"{"type": "captureKey", "key": "Escape"}"#;
        let cmd: ExternalCommand = serde_json::from_str(json).unwrap();
        match cmd {
            ExternalCommand::CaptureKey { key, modifiers } => {
                assert_eq!(key, "Escape");
                assert!(modifiers.is_empty());
            }
            _ => panic!("Expected CaptureKey command"),
        }
    }

    #[test]
    fn test_capture_pointer_routes_known_buttons_only() {
        let back = ExternalCommand::CapturePointer { button: 3 };
        assert_eq!(
            back.route(),
            Some(Routed::Command(ControllerEvent::CapturePointer(
                PointerButton::Back
            )))
        );
        assert_eq!(ExternalCommand::CapturePointer { button: 9 }.route(), None);
    }

    #[test]
    fn test_triggers_route_to_their_channels() {
        let hook: ExternalCommand =
            serde_json::from_str(r#"{"type": "hotkey", "id": "godmode"}"#).unwrap();
        assert_eq!(hook.route(), Some(Routed::Hook("godmode".into())));

        let pointer: ExternalCommand =
            serde_json::from_str(r#"{"type": "mouseHotkey", "chord": "Mouse5"}"#).unwrap();
        assert_eq!(pointer.route(), Some(Routed::Pointer(Chord::new("Mouse5"))));
    }

    #[test]
    fn test_bind_and_quit_route_to_controller_events() {
        let bind: ExternalCommand =
            serde_json::from_str(r#"{"type": "bindHotkey", "id": "toggle-collapse"}"#).unwrap();
        assert_eq!(
            bind.route(),
            Some(Routed::Command(ControllerEvent::BeginCapture {
                id: "toggle-collapse".into()
            }))
        );
        assert_eq!(
            ExternalCommand::Quit.route(),
            Some(Routed::Command(ControllerEvent::Shutdown))
        );
    }

    #[test]
    fn test_external_command_invalid_json_fails() {
        let json = r#"{"type": "unknown"}"#;
        let result = serde_json::from_str::<ExternalCommand>(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_external_command_missing_required_field_fails() {
        // setFeature requires enabled
        let json = r#"{"type": "setFeature", "id": "godmode"}"#;
        let result = serde_json::from_str::<ExternalCommand>(json);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_line_skips_blank_and_malformed() {
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("{not json"), None);
        assert_eq!(
            parse_line(r#"  {"type": "toggleCollapse"}  "#),
            Some(ExternalCommand::ToggleCollapse)
        );
    }
}
