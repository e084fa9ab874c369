//! Firmware-update slot bookkeeping.
//!
//! This is rollback confirmation only. The firmware carries no network
//! update receiver; a new image arrives by whatever flashed it (serial or
//! an external OTA tool writing the inactive slot). The guard tells the
//! bootloader that the running image reached the control loop, so a
//! rollback-enabled bootloader keeps it instead of reverting on the next
//! reset.

use esp_idf_svc::ota::EspOta;
use log::{info, warn};

use crate::traits::UpdateService;

/// Marks the running OTA slot valid once the control loop is serviced.
///
/// A freshly flashed image that never reaches the loop stays pending and
/// the bootloader rolls it back on the next reset.
#[derive(Debug, Default)]
pub struct OtaSlotGuard {
    done: bool,
}

impl OtaSlotGuard {
    /// Creates a guard that has not marked the slot yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the slot has been handled.
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl UpdateService for OtaSlotGuard {
    fn service(&mut self) {
        if self.done {
            return;
        }
        self.done = true;

        match EspOta::new() {
            Ok(mut ota) => match ota.mark_running_slot_valid() {
                Ok(()) => info!("running firmware slot marked valid"),
                Err(e) => warn!("failed to mark firmware slot valid: {:?}", e),
            },
            Err(e) => warn!("OTA unavailable: {:?}", e),
        }
    }
}
