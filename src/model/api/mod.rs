//! API-compatible types.
//!
//! The types in this module are what clients send and receive. Internal
//! state, such as a participant's stored preferences, is only exposed
//! through the session dump.

pub mod participant;
pub mod session;
