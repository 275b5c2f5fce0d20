//! Convenient re-exports for common usage.
//!
//! ```
//! use lattice_kit::prelude::*;
//! ```

pub use crate::Bias;
pub use crate::Crdt;
pub use crate::GCounter;
pub use crate::GSet;
pub use crate::LWWESet;
pub use crate::MCSet;
pub use crate::ORSet;
pub use crate::PNCounter;
pub use crate::TwoPSet;
