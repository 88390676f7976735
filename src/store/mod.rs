//! Graph store abstraction and the in-memory backend.

pub mod memory;
pub mod traits;

pub use memory::MemoryGraphStore;
pub use traits::GraphStore;
