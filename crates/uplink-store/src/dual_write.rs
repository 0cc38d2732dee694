//! DualWriter: persists one reading into its device series and the
//! global series.
//!
//! # Write modes
//!
//! - [`WriteMode::Atomic`]: both appends share one redb transaction, so
//!   the device and global series always agree.
//! - [`WriteMode::Sequential`]: the device append commits first, then the
//!   global append runs in its own transaction. If the second step fails
//!   the device entry stays committed with no global counterpart and the
//!   roster will not count it. There is no compensating delete. The
//!   caller sees the plain `StoreError` of the failed step.
//!
//! No deduplication is done in either mode: redelivering an envelope
//! stores a second reading.

use std::sync::Arc;

use tracing::{debug, error};
use uplink_core::{Reading, WriteMode};

use crate::error::StoreResult;
use crate::series::SeriesStore;
use crate::types::WriteResult;

#[derive(Clone)]
pub struct DualWriter {
    store: Arc<dyn SeriesStore>,
    mode: WriteMode,
}

impl DualWriter {
    pub fn new(store: Arc<dyn SeriesStore>, mode: WriteMode) -> Self {
        Self { store, mode }
    }

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    /// Persist `reading` into both series.
    pub fn write(&self, reading: &Reading) -> StoreResult<WriteResult> {
        let stored = match self.mode {
            WriteMode::Atomic => self.store.append_both(reading)?.0,
            WriteMode::Sequential => {
                let stored = self.store.append_device(reading)?;
                if let Err(e) = self.store.append_global(&stored) {
                    error!(
                        device_id = %reading.device_id,
                        doc_id = %stored.id,
                        collection = %reading.collection_name(),
                        error = %e,
                        "global series append failed; device entry is orphaned"
                    );
                    return Err(e);
                }
                stored
            }
        };

        let result = WriteResult {
            device_doc_id: stored.id,
            collection_name: reading.collection_name(),
            stored_at: stored.stored_at,
        };
        debug!(
            device_id = %reading.device_id,
            doc_id = %result.device_doc_id,
            mode = %self.mode,
            "reading persisted"
        );
        Ok(result)
    }
}
