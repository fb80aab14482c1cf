//! Vector store abstraction and the local persistent implementation.
//!
//! The orchestrator treats the store as an opaque collaborator behind the
//! [`VectorStore`] trait: collections support upsert-by-id and k-nearest-
//! neighbor queries over embeddings, with metadata and raw text attached to
//! every entry. [`LocalVectorStore`] is the bundled backend; it persists each
//! collection as JSON under an opaque directory path.

pub mod local;
pub mod vectorstore;

pub use local::LocalVectorStore;
pub use vectorstore::{QueryHit, VectorEntry, VectorStore};
