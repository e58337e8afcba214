//! OS-level hook backend on `global-hotkey`.
//!
//! The manager must be created on the thread that runs the platform event
//! loop. Presses arrive on `GlobalHotKeyEvent::receiver()`; a forwarding
//! thread maps hotkey ids back to target ids and pushes them onto the
//! controller's trigger channel.

use std::collections::HashMap;
use std::sync::Arc;

use global_hotkey::{
    hotkey::{Code, HotKey, Modifiers},
    Error as HotkeyError, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState,
};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::bridge::InputHookBridge;
use crate::chord::{Chord, ChordParts};
use crate::error::HookError;

pub struct GlobalHotkeyBridge {
    manager: GlobalHotKeyManager,
    /// Hotkey id -> (hotkey, target id); shared with the forwarding thread
    registered: Arc<Mutex<HashMap<u32, (HotKey, String)>>>,
}

impl GlobalHotkeyBridge {
    pub fn new(fired_tx: async_channel::Sender<String>) -> Result<Self, HookError> {
        let manager = GlobalHotKeyManager::new().map_err(|e| HookError::Rejected {
            chord: String::new(),
            reason: format!("Failed to create hotkey manager: {}", e),
        })?;
        let registered: Arc<Mutex<HashMap<u32, (HotKey, String)>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let lookup = Arc::clone(&registered);
        std::thread::spawn(move || {
            let receiver = GlobalHotKeyEvent::receiver();
            while let Ok(event) = receiver.recv() {
                // Only respond to key PRESS, not release
                if event.state != HotKeyState::Pressed {
                    continue;
                }
                let target = lookup.lock().get(&event.id).map(|(_, id)| id.clone());
                let Some(target_id) = target else {
                    continue;
                };
                debug!(
                    category = "HOTKEY",
                    hotkey_id = event.id,
                    target_id = %target_id,
                    "Hook fired"
                );
                if fired_tx.send_blocking(target_id).is_err() {
                    info!(category = "HOTKEY", "Trigger channel closed, stopping forwarder");
                    break;
                }
            }
        });

        Ok(Self {
            manager,
            registered,
        })
    }
}

impl InputHookBridge for GlobalHotkeyBridge {
    fn register(&mut self, chord: &Chord, target_id: &str) -> Result<(), HookError> {
        let parts = chord.parts()?;
        let hotkey = to_hotkey(&parts).ok_or_else(|| HookError::Unparsable(chord.to_string()))?;

        self.manager
            .register(hotkey)
            .map_err(|e| format_hotkey_error(e, chord))?;
        self.registered
            .lock()
            .insert(hotkey.id(), (hotkey, target_id.to_string()));
        Ok(())
    }

    fn unregister_all(&mut self) -> Result<(), HookError> {
        let hotkeys: Vec<HotKey> = self
            .registered
            .lock()
            .drain()
            .map(|(_, (hotkey, _))| hotkey)
            .collect();
        if hotkeys.is_empty() {
            return Ok(());
        }
        self.manager.unregister_all(&hotkeys).map_err(|e| {
            warn!(category = "HOTKEY", error = %e, "Failed to unregister hotkeys");
            HookError::Teardown(e.to_string())
        })
    }
}

fn format_hotkey_error(e: HotkeyError, chord: &Chord) -> HookError {
    match e {
        HotkeyError::AlreadyRegistered(_) => HookError::AlreadyRegistered(chord.to_string()),
        HotkeyError::FailedToRegister(msg) => HookError::Rejected {
            chord: chord.to_string(),
            reason: msg,
        },
        other => HookError::Rejected {
            chord: chord.to_string(),
            reason: other.to_string(),
        },
    }
}

fn to_hotkey(parts: &ChordParts) -> Option<HotKey> {
    let mut mods = Modifiers::empty();
    if parts.modifiers.ctrl {
        mods |= Modifiers::CONTROL;
    }
    if parts.modifiers.alt {
        mods |= Modifiers::ALT;
    }
    if parts.modifiers.shift {
        mods |= Modifiers::SHIFT;
    }
    if parts.modifiers.meta {
        mods |= Modifiers::META;
    }
    let code = key_to_code(&parts.key)?;
    Some(HotKey::new(
        if mods.is_empty() { None } else { Some(mods) },
        code,
    ))
}

/// Map a normalized key name to a physical key code.
fn key_to_code(key: &str) -> Option<Code> {
    let code = match key {
        "A" => Code::KeyA,
        "B" => Code::KeyB,
        "C" => Code::KeyC,
        "D" => Code::KeyD,
        "E" => Code::KeyE,
        "F" => Code::KeyF,
        "G" => Code::KeyG,
        "H" => Code::KeyH,
        "I" => Code::KeyI,
        "J" => Code::KeyJ,
        "K" => Code::KeyK,
        "L" => Code::KeyL,
        "M" => Code::KeyM,
        "N" => Code::KeyN,
        "O" => Code::KeyO,
        "P" => Code::KeyP,
        "Q" => Code::KeyQ,
        "R" => Code::KeyR,
        "S" => Code::KeyS,
        "T" => Code::KeyT,
        "U" => Code::KeyU,
        "V" => Code::KeyV,
        "W" => Code::KeyW,
        "X" => Code::KeyX,
        "Y" => Code::KeyY,
        "Z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        "F1" => Code::F1,
        "F2" => Code::F2,
        "F3" => Code::F3,
        "F4" => Code::F4,
        "F5" => Code::F5,
        "F6" => Code::F6,
        "F7" => Code::F7,
        "F8" => Code::F8,
        "F9" => Code::F9,
        "F10" => Code::F10,
        "F11" => Code::F11,
        "F12" => Code::F12,
        "Space" => Code::Space,
        "Enter" => Code::Enter,
        "Tab" => Code::Tab,
        "ArrowUp" => Code::ArrowUp,
        "ArrowDown" => Code::ArrowDown,
        "ArrowLeft" => Code::ArrowLeft,
        "ArrowRight" => Code::ArrowRight,
        "Home" => Code::Home,
        "End" => Code::End,
        "PageUp" => Code::PageUp,
        "PageDown" => Code::PageDown,
        "Insert" => Code::Insert,
        ";" => Code::Semicolon,
        "," => Code::Comma,
        "." => Code::Period,
        "/" => Code::Slash,
        "-" => Code::Minus,
        "=" => Code::Equal,
        "[" => Code::BracketLeft,
        "]" => Code::BracketRight,
        "`" => Code::Backquote,
        _ => return None,
    };
    Some(code)
}
