//! modext - live feature toggles and global hotkeys for an external game process
//!
//! This library provides the controller core: the toggle reconciler that keeps
//! feature beliefs in step with a fallible executor, interactive hotkey
//! capture, gated hotkey registration, and the window presence animator.

pub mod config;
pub mod error;
pub mod logging;
pub mod transitions;

// Feature catalog and the process it patches
pub mod features;
pub mod target;
pub mod toggles;

// User feedback
pub mod notifications;

// Hotkeys: chords, bindings, capture, registration and dispatch
pub mod bindings;
pub mod capture;
pub mod chord;
pub mod gate;
pub mod hotkeys;

// Host window geometry and presence animation
pub mod window;

// Event loop and its automation surface
pub mod controller;
pub mod stdin_commands;
