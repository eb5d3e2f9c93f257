//! Host window capability: scroll offsets, confirmation prompt and the unload hook slot.

mod memory;
mod viewport;

pub use memory::MemoryViewport;
pub use viewport::*;
