//! Domain model for projects, labels and their refinements.
//!
//! # Invariants
//! - A label belongs to exactly one project; a refinement to exactly one label.
//! - At most one refinement exists per `(label, difficulty)` pair.
//! - Text fields are stored trimmed and within their documented bounds.

pub mod label;
pub mod project;
pub mod refinement;
pub mod text;
pub mod view;

use uuid::Uuid;

/// Opaque identity of the acting principal, resolved by the auth layer.
pub type UserId = Uuid;
