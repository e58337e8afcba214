//! Restore-cache semantics shared by every executor.

use std::collections::HashMap;

use tracing::debug;

use crate::error::ExecutorError;

/// Raw memory access to an attached process
pub trait ProcessMemory {
    fn read(&self, address: usize, len: usize) -> Result<Vec<u8>, ExecutorError>;
    fn write(&mut self, address: usize, bytes: &[u8]) -> Result<(), ExecutorError>;
}

/// Original bytes for every address currently patched.
///
/// Lives exactly as long as one attach session.
#[derive(Debug, Default)]
pub struct PatchBook {
    original: HashMap<usize, Vec<u8>>,
}

impl PatchBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `bytes` at `address`, or put the original bytes back.
    ///
    /// Enabling reads and remembers the original bytes on the first write to an
    /// address only, so repeated enables never capture a patched value.
    /// Disabling an address with nothing remembered is a successful no-op.
    pub fn apply<M: ProcessMemory + ?Sized>(
        &mut self,
        memory: &mut M,
        address: usize,
        bytes: &[u8],
        enabled: bool,
    ) -> Result<(), ExecutorError> {
        if enabled {
            if !self.original.contains_key(&address) {
                let original = memory.read(address, bytes.len())?;
                self.original.insert(address, original);
            }
            return memory.write(address, bytes);
        }

        match self.original.remove(&address) {
            Some(original) => {
                if let Err(e) = memory.write(address, &original) {
                    // Keep the original so a retry can still restore it
                    self.original.insert(address, original);
                    return Err(e);
                }
                Ok(())
            }
            None => {
                debug!(address = format_args!("{:#x}", address), "Nothing to restore");
                Ok(())
            }
        }
    }

    pub fn is_patched(&self, address: usize) -> bool {
        self.original.contains_key(&address)
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }
}
