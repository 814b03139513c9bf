//! Roomwatch - Room State Aggregation from an Infrastructure Event Bus
//!
//! This crate logs into a Salt-style event bus, consumes its long-lived event
//! stream and keeps one merged state record per physical room in a
//! key-value store. The store is seeded from a bulk status snapshot at
//! startup and shut down gracefully on SIGINT/SIGTERM.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
