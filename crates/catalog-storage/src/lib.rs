pub mod mem;
pub mod persistent;
pub mod snapshot;
pub mod traits;
pub mod wal;

pub use mem::InMemoryStore;
pub use persistent::{load_products, PersistentStore};
pub use traits::*;
