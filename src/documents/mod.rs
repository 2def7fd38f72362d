//! Document mutation boundaries: guarded outline updates and chapter
//! snapshots.
//!
//! These services sit between callers and the [`DocumentStore`]: they
//! validate before any mutation and translate store outcomes into the
//! client-facing error taxonomy. The transactional guarantees themselves
//! (compare-and-swap, consistent capture) live in the store.
//!
//! [`DocumentStore`]: crate::store::DocumentStore

use miette::Diagnostic;
use thiserror::Error;

use crate::store::StoreError;

pub mod outline;
pub mod snapshots;

pub use outline::apply_update;
pub use snapshots::{RollbackOptions, SnapshotService};

/// Errors of the document-update boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum DocumentError {
    /// The submitted content tree is malformed; nothing was written.
    #[error("invalid outline content: {detail}")]
    #[diagnostic(
        code(storyloom::documents::validation),
        help("Content must be an object with a \"volumes\" list of {{title, chapters}} entries.")
    )]
    Validation { detail: String },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}
