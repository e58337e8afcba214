//! Target process bridges
//!
//! Two collaborators sit between the controller and the game process:
//!
//! - `OperationExecutor` applies a catalog `Operation` at `base + offset`,
//!   remembering original bytes so a later `enabled = false` call restores them.
//! - `ProcessSession` attaches to / detaches from the process and reports the
//!   class of the current foreground window.
//!
//! Both are async so bridge calls are suspension points on the single
//! cooperative runtime. Neither needs to be `Send`.

mod patch;
mod simulated;

pub use patch::{PatchBook, ProcessMemory};
pub use simulated::{AppliedOp, SimulatedTarget};

use serde::Serialize;

use crate::error::{ExecutorError, SessionError};
use crate::features::Operation;

/// NOP opcode written by `Operation::Nop`
pub const NOP_OPCODE: u8 = 0x90;

/// Result of a successful attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttachInfo {
    pub pid: u32,
    pub base: usize,
}

#[allow(async_fn_in_trait)]
pub trait OperationExecutor {
    /// Apply (`enabled = true`) or restore (`enabled = false`) one operation.
    async fn apply(&self, op: &Operation, enabled: bool) -> Result<(), ExecutorError>;
}

#[allow(async_fn_in_trait)]
pub trait ProcessSession {
    async fn attach(&self) -> Result<AttachInfo, SessionError>;
    async fn detach(&self) -> Result<(), SessionError>;
    /// Class name of the window currently in the foreground
    async fn foreground_window_class(&self) -> Result<String, SessionError>;
}

/// Bytes an operation writes when enabled.
pub fn payload(op: &Operation) -> Vec<u8> {
    match op {
        Operation::Patch { bytes, .. } => bytes.to_vec(),
        Operation::Nop { size, .. } => vec![NOP_OPCODE; *size],
        Operation::FloatSet { value, .. } => value.to_le_bytes().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_encoding() {
        let patch = Operation::Patch {
            offset: 0,
            bytes: &[0x01, 0x02],
        };
        assert_eq!(payload(&patch), vec![0x01, 0x02]);

        let nop = Operation::Nop { offset: 0, size: 3 };
        assert_eq!(payload(&nop), vec![0x90, 0x90, 0x90]);

        let float = Operation::FloatSet {
            offset: 0,
            value: 3.5,
        };
        assert_eq!(payload(&float), vec![0x00, 0x00, 0x60, 0x40]);
    }
}
