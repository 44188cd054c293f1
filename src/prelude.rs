//! Convenient re-exports for common usage.
//!
//! ```
//! use causal_dedup::prelude::*;
//! ```

pub use crate::CausalityViolation;
pub use crate::Deduplicator;
pub use crate::EntityId;
pub use crate::LingerPolicy;
pub use crate::Message;
pub use crate::Operation;
pub use crate::Timestamp;
