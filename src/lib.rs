//! Acne risk inference service.
//!
//! A validated request is turned into the model's feature layout, scored by a
//! pre-trained binary classifier loaded at startup, and answered with a
//! human-readable verdict.

pub mod api;
pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod validation;
