//! Printable record reports.
//!
//! `renderer` decides what goes where; `writer` owns the page model.

pub mod renderer;
pub mod writer;
