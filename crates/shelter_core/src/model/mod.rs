//! Record shapes accepted and returned by the shelter facade.
//!
//! # Responsibility
//! - Name the dynamic document types used across the facade.
//! - Classify caller input before any store I/O happens.
//!
//! # Invariants
//! - Records handed to the store for insertion never carry `_id`.
//! - Shape errors are detected here, never by the store.

pub mod record;
