//! In-memory stand-in for the game process.
//!
//! Implements both bridges over a sparse byte image so the whole controller can
//! run (and be tested) without a real process. Failures can be injected per
//! offset, and every executor call is journaled.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use serde::Serialize;
use tracing::debug;

use super::patch::{PatchBook, ProcessMemory};
use super::{payload, AttachInfo, OperationExecutor, ProcessSession};
use crate::config::defaults::{TARGET_EXE, TARGET_WINDOW_CLASS};
use crate::error::{ExecutorError, SessionError};
use crate::features::Operation;

const SIMULATED_PID: u32 = 4242;
const SIMULATED_BASE: usize = 0x4000_0000;
/// Value of every byte nobody has written yet
const FILL_BYTE: u8 = 0xCC;

/// One executor call as observed by the simulated target
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedOp {
    pub offset: usize,
    pub kind: &'static str,
    pub enabled: bool,
    pub ok: bool,
}

#[derive(Debug, Default)]
struct SparseMemory {
    bytes: HashMap<usize, u8>,
}

impl ProcessMemory for SparseMemory {
    fn read(&self, address: usize, len: usize) -> Result<Vec<u8>, ExecutorError> {
        Ok((0..len)
            .map(|i| *self.bytes.get(&(address + i)).unwrap_or(&FILL_BYTE))
            .collect())
    }

    fn write(&mut self, address: usize, bytes: &[u8]) -> Result<(), ExecutorError> {
        for (i, b) in bytes.iter().enumerate() {
            self.bytes.insert(address + i, *b);
        }
        Ok(())
    }
}

#[derive(Debug)]
struct SimState {
    running: bool,
    attached: Option<AttachInfo>,
    memory: SparseMemory,
    book: PatchBook,
    failing_offsets: HashSet<usize>,
    journal: Vec<AppliedOp>,
    window_class: Option<String>,
}

/// Shared handle to a simulated process; clones observe the same state.
#[derive(Debug, Clone)]
pub struct SimulatedTarget {
    inner: Rc<RefCell<SimState>>,
}

impl Default for SimulatedTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedTarget {
    /// A running process whose window is in the foreground.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SimState {
                running: true,
                attached: None,
                memory: SparseMemory::default(),
                book: PatchBook::new(),
                failing_offsets: HashSet::new(),
                journal: Vec::new(),
                window_class: Some(TARGET_WINDOW_CLASS.to_string()),
            })),
        }
    }

    /// Pretend the process exited (or was never launched).
    pub fn set_running(&self, running: bool) {
        self.inner.borrow_mut().running = running;
    }

    /// Make every call touching `offset` fail with a write error.
    pub fn fail_at(&self, offset: usize) {
        self.inner.borrow_mut().failing_offsets.insert(offset);
    }

    pub fn clear_failures(&self) {
        self.inner.borrow_mut().failing_offsets.clear();
    }

    /// `None` makes the foreground query fail.
    pub fn set_foreground_class(&self, class: Option<&str>) {
        self.inner.borrow_mut().window_class = class.map(str::to_string);
    }

    pub fn journal(&self) -> Vec<AppliedOp> {
        self.inner.borrow().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.inner.borrow_mut().journal.clear();
    }

    /// Current bytes at `base + offset`
    pub fn bytes_at(&self, offset: usize, len: usize) -> Vec<u8> {
        let state = self.inner.borrow();
        state
            .memory
            .read(SIMULATED_BASE + offset, len)
            .unwrap_or_default()
    }

    pub fn is_attached(&self) -> bool {
        self.inner.borrow().attached.is_some()
    }

    /// Number of addresses with a remembered original
    pub fn patched_count(&self) -> usize {
        self.inner.borrow().book.len()
    }
}

impl OperationExecutor for SimulatedTarget {
    async fn apply(&self, op: &Operation, enabled: bool) -> Result<(), ExecutorError> {
        tokio::task::yield_now().await;

        let mut guard = self.inner.borrow_mut();
        let state = &mut *guard;
        let offset = op.offset();

        let result = match state.attached {
            None => Err(ExecutorError::NotAttached),
            Some(info) => {
                let address = info.base + offset;
                let bytes = payload(op);
                if state.failing_offsets.contains(&offset) {
                    Err(ExecutorError::Write {
                        address,
                        len: bytes.len(),
                    })
                } else {
                    state
                        .book
                        .apply(&mut state.memory, address, &bytes, enabled)
                }
            }
        };

        state.journal.push(AppliedOp {
            offset,
            kind: op.kind(),
            enabled,
            ok: result.is_ok(),
        });
        debug!(
            offset = format_args!("{:#x}", offset),
            kind = op.kind(),
            enabled,
            ok = result.is_ok(),
            "Simulated apply"
        );
        result
    }
}

impl ProcessSession for SimulatedTarget {
    async fn attach(&self) -> Result<AttachInfo, SessionError> {
        tokio::task::yield_now().await;

        let mut state = self.inner.borrow_mut();
        if !state.running {
            return Err(SessionError::ProcessNotFound(TARGET_EXE.to_string()));
        }
        let info = AttachInfo {
            pid: SIMULATED_PID,
            base: SIMULATED_BASE,
        };
        state.attached = Some(info);
        state.book = PatchBook::new();
        Ok(info)
    }

    async fn detach(&self) -> Result<(), SessionError> {
        tokio::task::yield_now().await;

        let mut state = self.inner.borrow_mut();
        state.attached = None;
        state.book = PatchBook::new();
        Ok(())
    }

    async fn foreground_window_class(&self) -> Result<String, SessionError> {
        tokio::task::yield_now().await;

        self.inner
            .borrow()
            .window_class
            .clone()
            .ok_or(SessionError::NoForegroundWindow)
    }
}
