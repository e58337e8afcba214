//! Input hook backends
//!
//! A backend installs one hook per chord and reports presses by sending the
//! bound target id on the channel it was built with. Teardown is always
//! all-at-once.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::debug;

use crate::chord::Chord;
use crate::error::HookError;

pub trait InputHookBridge {
    /// Install a hook that reports `target_id` when `chord` is pressed.
    fn register(&mut self, chord: &Chord, target_id: &str) -> Result<(), HookError>;
    /// Remove every hook this backend installed. Idempotent.
    fn unregister_all(&mut self) -> Result<(), HookError>;
}

#[derive(Debug, Default)]
struct RecordingState {
    live: IndexMap<Chord, String>,
    reserved: HashSet<Chord>,
    teardowns: usize,
}

/// In-process backend: hooks are a table, presses are simulated with `fire`.
#[derive(Debug, Clone)]
pub struct RecordingHookBridge {
    state: Rc<RefCell<RecordingState>>,
    fired_tx: async_channel::Sender<String>,
}

impl RecordingHookBridge {
    pub fn new(fired_tx: async_channel::Sender<String>) -> Self {
        Self {
            state: Rc::new(RefCell::new(RecordingState::default())),
            fired_tx,
        }
    }

    /// Make `chord` fail to register, as if another application owned it.
    pub fn reserve(&self, chord: &str) {
        self.state.borrow_mut().reserved.insert(Chord::new(chord));
    }

    /// Live hooks in installation order
    pub fn live(&self) -> Vec<(Chord, String)> {
        self.state
            .borrow()
            .live
            .iter()
            .map(|(chord, id)| (chord.clone(), id.clone()))
            .collect()
    }

    pub fn teardown_count(&self) -> usize {
        self.state.borrow().teardowns
    }

    /// Simulate a press of `chord`. Returns false when no hook is installed.
    pub fn fire(&self, chord: &str) -> bool {
        let target = self.state.borrow().live.get(&Chord::new(chord)).cloned();
        match target {
            Some(id) => self.fired_tx.try_send(id).is_ok(),
            None => false,
        }
    }
}

impl InputHookBridge for RecordingHookBridge {
    fn register(&mut self, chord: &Chord, target_id: &str) -> Result<(), HookError> {
        let mut state = self.state.borrow_mut();
        if state.reserved.contains(chord) || state.live.contains_key(chord) {
            return Err(HookError::AlreadyRegistered(chord.to_string()));
        }
        state.live.insert(chord.clone(), target_id.to_string());
        debug!(category = "HOTKEY", chord = %chord, target_id, "Hook installed");
        Ok(())
    }

    fn unregister_all(&mut self) -> Result<(), HookError> {
        let mut state = self.state.borrow_mut();
        state.live.clear();
        state.teardowns += 1;
        Ok(())
    }
}
