//! Skinlog Firestore - Remote photo repository adapter
//!
//! Implements the `IPhotoRepository` port from `skinlog-core` against the
//! Firestore REST API. This is a driven (secondary) adapter in the
//! hexagonal architecture.
//!
//! ## Query shape
//!
//! The listing is a `runQuery` with a single equality filter on the owner
//! field. There is deliberately no timestamp range or ordering in the
//! query: that would require a composite index on the collection, and the
//! sync engine filters and sorts client-side instead.

pub mod repository;

pub use repository::FirestorePhotoRepository;
