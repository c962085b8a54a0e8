//! Core types for Arbiter-0

mod floor;
mod lane;
mod ledger;
mod reason;
mod session;
mod verdict;

pub use floor::{FloorId, FloorKind, FloorScore, Threshold};
pub use lane::{Lane, Stakes};
pub use ledger::LedgerEntry;
pub use reason::ReasonCode;
pub use session::{AuthorityTier, SessionRecord, SessionStatus, Stage, StageResult};
pub use verdict::{CoolingTier, Verdict};
