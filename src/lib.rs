//! Core booking orchestration for a crisis-support safehouse platform.
//!
//! The interesting machinery lives in [`workflows::booking`]: a capacity
//! ledger that never overbooks, a deterministic safety-match evaluator, and
//! the multi-step placement state machine. Auth, file storage, and delivery
//! transports are external collaborators reached through traits.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
