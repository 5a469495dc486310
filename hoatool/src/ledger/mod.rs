use std::fmt;

use shared_lib::SlotName;
use thiserror::Error;

pub mod gate;
pub mod session;
pub mod store;
pub mod view;

/// Every failure an edit-session or view-model operation can surface.
/// Store-level failures are mapped into `StoreUnavailable` at the
/// boundary; nothing else escapes these modules.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("invalid amount {0}: rates must be finite and not negative")]
    InvalidAmount(f32),
    #[error("incorrect password for the current administrator")]
    IncorrectPassword,
    #[error("audit trail incomplete: {written} of {expected} entries written")]
    PartialAuditFailure { written: usize, expected: usize },
    #[error("'{op}' is not valid while the session is {state}")]
    InvalidTransition {
        op: &'static str,
        state: &'static str,
    },
    #[error("no member named '{0}' in the current period")]
    UnknownMember(String),
    #[error("no cells are selected")]
    EmptySelection,
}

impl From<rusqlite::Error> for LedgerError {
    fn from(error: rusqlite::Error) -> Self {
        LedgerError::StoreUnavailable(error.to_string())
    }
}

/// Identifies one cell of the dues grid, `member` x `slot`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct CellId {
    pub member: String,
    pub slot: SlotName,
}

impl CellId {
    pub fn new(member: &str, slot: SlotName) -> Self {
        CellId {
            member: member.to_string(),
            slot,
        }
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.member, self.slot)
    }
}
