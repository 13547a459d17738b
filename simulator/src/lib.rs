//! Local backend for updraft.
//!
//! Runs the authoritative crash-round lifecycle — countdown, multiplier
//! growth toward a hidden crash point, settlement — behind the same
//! WebSocket + REST surface the production gateway exposes. Dev and test
//! scaffolding: the client crate's integration tests spin this up on a
//! random port.

mod api;
mod engine;

pub use api::{Api, Simulator};
pub use engine::{Engine, EngineConfig, Outbound};
