//! Form-side editing state.
//!
//! # Responsibility
//! - Keep in-progress user input separate from persisted records.
//! - Validate input before it is handed to the repository layer.

pub mod parts_editor;
