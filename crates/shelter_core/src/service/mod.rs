//! Caller-facing use-case services.
//!
//! # Responsibility
//! - Validate caller input and drive the document store.
//! - Keep driver details and error plumbing out of calling applications.

pub mod animal_shelter;
