//! # causal-dedup
//!
//! Effectively-once, causally ordered delivery of operation messages between
//! durable entities.
//!
//! Entities exchange messages over an at-least-once transport that may
//! duplicate and reorder them, while wall clocks may stall or run backward.
//! Each entity keeps a small [`Deduplicator`] as part of its durable state:
//!
//! - [`Deduplicator::send`] stamps every outgoing message with a strictly
//!   increasing timestamp and a link to the previous message sent to the
//!   same destination.
//! - [`Deduplicator::receive`] drops duplicates, holds messages that arrive
//!   before their predecessor, and releases each origin's messages exactly
//!   once, in send order.
//! - [`Deduplicator::collect`] prunes tracking state once a linger watermark
//!   proves no older message can still arrive.
//!
//! All operations are synchronous and deterministic, so replaying an entity
//! turn observes the same delivery decisions.
//!
//! ## `no_std` Support
//!
//! The crate supports `no_std` environments with the `alloc` crate.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! causal-dedup = { version = "0.1", default-features = false }
//! ```
//!
//! Note: [`Timestamp::now`] and the `json` feature require `std`.
//!
//! ## Quick Start
//!
//! ```
//! use causal_dedup::prelude::*;
//!
//! let mut counter = Deduplicator::new("@counter@a");
//! let mut ledger = Deduplicator::new("@ledger@main");
//!
//! let now = Timestamp::from_ticks(1_000);
//! let m1 = counter.send(ledger.id(), Operation::signal("add").with_input("1"), now);
//! let m2 = counter.send(ledger.id(), Operation::signal("add").with_input("2"), now);
//!
//! // m2 overtakes m1 and m1 is retried twice.
//! assert!(ledger.receive(m2).unwrap().is_empty());
//! let delivered = ledger.receive(m1.clone()).unwrap();
//! assert!(ledger.receive(m1).unwrap().is_empty());
//!
//! let inputs: Vec<_> = delivered
//!     .iter()
//!     .map(|m| m.payload().input.as_deref().unwrap())
//!     .collect();
//! assert_eq!(inputs, ["1", "2"]);
//! ```
//!
//! ## Features
//!
//! - `std` (default): `Timestamp::now` and std error integration.
//! - `serde`: `Serialize`/`Deserialize` for all persisted types.
//! - `json`: JSON persistence helpers on [`Deduplicator`].

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

mod buffer;
mod deduplicator;
mod entity;
mod error;
mod message;
#[cfg(feature = "json")]
mod persist;
mod timestamp;

pub mod linger;
pub mod prelude;

pub use buffer::{BufferState, ReceiveBuffer};
pub use deduplicator::{CollectStats, Deduplicator};
pub use entity::EntityId;
#[cfg(feature = "json")]
pub use error::PersistError;
pub use error::{CausalityViolation, ConfigError, TimestampExhausted};
pub use linger::LingerPolicy;
pub use message::{Message, Operation};
pub use timestamp::Timestamp;
