//! Core utilities for timeql.
//!
//! This crate provides foundational types used throughout timeql:
//! - `span`: Source location tracking and line/column mapping
//! - `text`: String interning
//! - `diagnostics`: Error reporting

pub mod diagnostics;
pub mod span;
pub mod text;

pub use diagnostics::{Diagnostic, DiagnosticBag, DiagnosticSeverity, Label};
pub use span::{LineCol, LineIndex, Span};
pub use text::{Interner, Text};
