//! Feature services: one submit call plus one probe per job family.
//!
//! Each service owns its wire action names and payload shapes and
//! exposes typed results; the polling cadence itself lives in
//! [`crate::poll`] and job ownership in [`crate::surface`].

pub mod chat;
pub mod export;
pub mod migration;
