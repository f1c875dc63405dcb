//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate form validation, repository calls and report export.
//! - Keep UI/CLI layers decoupled from storage details.

pub mod record_service;
