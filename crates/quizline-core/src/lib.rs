//! quizline-core: Quiz session state machine, traits, and scoring.
//!
//! This crate defines the data model, the collaborator traits for the
//! question provider and scoring service, and the session controller that
//! the rest of quizline builds on.

pub mod controller;
pub mod error;
pub mod model;
pub mod session;
pub mod traits;
pub mod validation;
