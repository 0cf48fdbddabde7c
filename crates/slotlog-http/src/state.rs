use slotlog_core::{SlotLedger, TimeDisplay};

/// Shared handler state
pub struct AppState {
    pub ledger: SlotLedger,
    pub display: TimeDisplay,
}

impl AppState {
    pub fn new(ledger: SlotLedger, display: TimeDisplay) -> Self {
        Self { ledger, display }
    }
}
