//! Concrete document stores.
//!
//! | Store | Source | Sink | Notes |
//! |-------|--------|------|-------|
//! | [`memory::MemoryStore`] | ✅ | ✅ | In-process, shared between clones |
//! | [`mongo::MongoStore`] | ✅ | ✅ | Official `mongodb` driver |

pub mod filter;
pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
