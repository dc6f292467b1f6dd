//! Port traits implemented by the adapter crates.
//!
//! Mirrors the teacher's `ports/` split (`ICloudProvider`, `IStateRepository`)
//! — each trait here is the seam an adapter crate (`outlook-store`,
//! `outlook-auth`, `outlook-graph`, `outlook-attachments`) implements, and
//! `outlook-dispatcher`/`outlook-session` depend only on these traits, never
//! on the adapter crates' concrete types.

pub mod auth;
pub mod graph;
pub mod storage;
pub mod token_store;

pub use auth::AuthProvider;
pub use graph::GraphQueryEngine;
pub use storage::StorageBackend;
pub use token_store::TokenStore;
