//! # attrset
//!
//! Typed, heterogeneous attribute sets: attach an open-ended collection of
//! optional, strongly-typed attributes to an object, where each key
//! statically fixes its value type and may imply further assignments.
//! Intended for structurally-comparable configuration bags (build options,
//! runtime options) that would otherwise degenerate into untyped maps.
//!
//! ## The pieces
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Keys (key.rs)                                              │
//! │  - Attribute trait: a zero-sized type fixing a value type   │
//! │  - capability markers: Flag / Default / Set attributes      │
//! │  - optional implies() hook producing further assignments    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Staging (builder.rs)                                       │
//! │  - AttributesBuilder: mutable, single-owner accumulator     │
//! │  - snapshot() hands each copy to the closure pass           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Closure (closure.rs)                                       │
//! │  - expands every explicit key's implication fragment once   │
//! │  - explicit beats implied; contradictions fail construction │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Value type (set.rs)                                        │
//! │  - Attributes: immutable explicit + derived implied maps    │
//! │  - typed lookup, derivation ops, structural equality        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every path that changes explicit content re-runs the closure over the
//! *entire* new explicit map, so an [`Attributes`] in hand always satisfies:
//! values match their keys' declared types, the implied map is the full
//! conflict-free expansion of the explicit map (minus explicit keys), and
//! nothing mutates after construction. The single escape hatch,
//! [`Attributes::from_raw_parts`], shifts those guarantees onto the caller
//! and says so in its contract.
//!
//! ## Example
//!
//! ```
//! use attrset::{Attribute, Attributes, DefaultAttribute};
//!
//! struct OptLevel;
//! impl Attribute for OptLevel {
//!     type Value = u8;
//!     // opt level 3 implies LTO
//!     fn implies(value: &u8) -> Option<Attributes> {
//!         if *value >= 3 {
//!             Attributes::of::<Lto>(true).ok()
//!         } else {
//!             None
//!         }
//!     }
//! }
//!
//! struct Lto;
//! impl Attribute for Lto {
//!     type Value = bool;
//! }
//! impl DefaultAttribute for Lto {
//!     fn default_value() -> bool {
//!         false
//!     }
//! }
//!
//! let release = Attributes::of::<OptLevel>(3)?;
//! assert_eq!(release.get::<Lto>(), Some(&true)); // implied
//!
//! let debug = Attributes::of::<OptLevel>(0)?;
//! assert_eq!(debug.get_or_default::<Lto>(), false);
//! # Ok::<(), attrset::AttrError>(())
//! ```
//!
//! ## Concurrency
//!
//! Everything is synchronous and in-memory. A published [`Attributes`] is
//! immutable and `Send + Sync`; read it from anywhere. A builder belongs to
//! one owner; compose concurrent construction by merging snapshots with
//! [`Attributes::plus`].

mod builder;
mod closure;
mod error;
mod key;
mod set;
mod value;
pub mod wire;

pub use builder::AttributesBuilder;
pub use error::{AttrError, Result};
pub use key::{AttrKey, Attribute, DefaultAttribute, FlagAttribute, SetAttribute};
pub use set::{AttributeContainer, Attributes};
pub use value::{raw_entry, AttributeValue, RawEntries};
