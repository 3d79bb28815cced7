//! Infrastructure layer - document store access.
//!
//! Everything above this module talks to a [`DocumentStore`]; the MongoDB
//! backed [`MongoStore`] and the in-process [`MemoryStore`] are
//! interchangeable.

mod clock;
mod db;
mod memory;
mod mongo_store;
mod store;

pub use clock::{Clock, SystemClock};
pub use db::Database;
pub use memory::MemoryStore;
pub use mongo_store::MongoStore;
pub use store::{DocumentCursor, DocumentStore};

#[cfg(any(test, feature = "test-utils"))]
pub use store::MockDocumentStore;
