//! # lattice-kit
//!
//! State-based CRDTs with a canonical JSON wire format.
//!
//! A CRDT (Conflict-free Replicated Data Type) is a data structure that can
//! be replicated across multiple devices and updated independently. When
//! replicas are merged, they are guaranteed to converge to the same state
//! without requiring coordination or consensus. Merge here is a pure
//! function: it returns a fresh least-upper-bound state and never mutates
//! its operands.
//!
//! ## Quick Start
//!
//! ```
//! use lattice_kit::prelude::*;
//!
//! // Grow-only counter
//! let mut c1 = GCounter::new();
//! c1.update_for("device-1", 1.0).unwrap();
//!
//! let mut c2 = GCounter::new();
//! c2.update_for("device-2", 1.0).unwrap();
//!
//! let merged = c1.merge(&c2).unwrap();
//! assert_eq!(merged.value(), 2.0);
//! ```
//!
//! ## Available CRDTs
//!
//! ### Counters
//! - [`GCounter`] - Grow-only counter (update only)
//! - [`PNCounter`] - Positive-negative counter (signed updates)
//!
//! ### Sets
//! - [`GSet`] - Grow-only set (add only)
//! - [`TwoPSet`] - Two-phase set (add and remove, remove is permanent)
//! - [`LWWESet`] - Last-write-wins element set (timestamped add/remove)
//! - [`ORSet`] - Observed-remove set (add and remove freely)
//! - [`MCSet`] - Max-change set (parity-toggled membership)
//!
//! ## The wire format
//!
//! Every type encodes to a JSON object carrying a `"type"` discriminator
//! ([`GCounter::to_json`], …) and decodes back with the matching
//! `from_json`. [`parse`] dispatches on the discriminator; [`merge`] folds
//! any number of same-variant replicas:
//!
//! ```
//! use lattice_kit::{merge, parse, AnyCrdt};
//! use serde_json::json;
//!
//! let a = parse(&json!({"type": "g-counter", "e": {"x": 1.0}})).unwrap();
//! let b = parse(&json!({"type": "g-counter", "e": {"y": 2.0}})).unwrap();
//!
//! let merged = merge(&[a, b]).unwrap();
//! let AnyCrdt::GCounter(counter) = merged else { unreachable!() };
//! assert_eq!(counter.value(), 3.0);
//! ```
//!
//! ## The `Crdt` Trait
//!
//! All types implement the [`Crdt`] trait, which provides the [`Crdt::merge`]
//! method. Merge is guaranteed to be commutative, associative, and idempotent.

#![warn(missing_docs)]

mod crdt;
mod dispatch;
mod element;
mod error;
mod gcounter;
mod gset;
mod lww_set;
mod mc_set;
mod or_set;
mod pncounter;
mod tag;
mod twop_set;

pub mod events;
pub mod prelude;

pub use crdt::Crdt;
pub use dispatch::{merge, parse, parse_with_minter, AnyCrdt};
pub use element::Element;
pub use error::{Error, Result};
pub use gcounter::{GCounter, NULL_ACTOR};
pub use gset::GSet;
pub use lww_set::{Bias, LWWESet};
pub use mc_set::MCSet;
pub use or_set::ORSet;
pub use pncounter::PNCounter;
pub use tag::{Tag, TagMinter};
pub use twop_set::TwoPSet;
