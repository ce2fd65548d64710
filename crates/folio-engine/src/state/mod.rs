//! Live editing state: batched updates, view deltas and time travel.
//!
//! Updates are queued on a [`StateControl`] and run together by
//! [`StateControl::run_updates`]. Each update gets a [`Delta`] through which
//! it applies mutations; every committed mutation is logged in [`History`]
//! so any earlier document or selection can be rebuilt on demand.

pub mod config;
pub mod control;
pub mod history;

pub use config::StateControlConfig;
pub use control::{Delta, Phase, State, StateControl, Update};
pub use history::{History, MutationRecord, StateSnapshot};
