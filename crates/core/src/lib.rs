//! Domain types and pure logic for the Draftline branch/version/merge engine.
//!
//! Nothing in this crate performs I/O. The store, engine and HTTP layers
//! build on the validation rules, ancestry math, conflict detection and the
//! CRDT decode boundary defined here.

pub mod ancestry;
pub mod branching;
pub mod conflict;
pub mod crdt;
pub mod diff;
pub mod encoding;
pub mod error;
pub mod merge;
pub mod types;
pub mod versioning;
