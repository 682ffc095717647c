//! State module for tracking indexing progress
//!
//! # Components
//!
//! - `SiteStatus`: The persisted lifecycle status of a site (indexing, indexed, failed)
//! - `RunGate`: Process-wide guard allowing at most one indexing run at a time
//! - `StopSignal`: Cooperative cancellation flag shared by every task of a run

mod run_state;
mod site_status;

// Re-export main types
pub use run_state::{RunGate, RunTicket, StopSignal};
pub use site_status::SiteStatus;
