//! Erased attribute value storage.
//!
//! Attribute sets are heterogeneous: every key fixes its own value type, so
//! the backing map cannot name a single concrete value type. Values are
//! stored as `Arc<dyn AttributeValue>` and recovered through the typed key
//! that put them there. The blanket impl below means callers never implement
//! this trait by hand; any `T: Any + Debug + PartialEq + Send + Sync` works.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::sync::Arc;

use crate::key::AttrKey;

/// Object-safe erasure for attribute values.
///
/// `Send + Sync` is required so a published [`Attributes`](crate::Attributes)
/// can be read from multiple threads without synchronization.
pub trait AttributeValue: Any + Debug + Send + Sync {
    /// Upcast for downcasting back to the concrete value type.
    fn as_any(&self) -> &dyn Any;

    /// Dynamic equality. Values of different concrete types compare unequal,
    /// never panic.
    fn eq_value(&self, other: &dyn AttributeValue) -> bool;
}

impl<T> AttributeValue for T
where
    T: Any + Debug + PartialEq + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_value(&self, other: &dyn AttributeValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }
}

/// The map shape shared by explicit, implied and staged content.
///
/// A `BTreeMap` rather than a `HashMap`: iteration order is a pure function
/// of content (keys order by type name), which keeps closure runs and
/// conflict reports reproducible across processes.
pub type RawEntries = BTreeMap<AttrKey, Arc<dyn AttributeValue>>;

/// Build one entry of a [`RawEntries`] map from a typed key and value.
///
/// Convenience for assembling input to
/// [`Attributes::from_raw_parts`](crate::Attributes::from_raw_parts).
pub fn raw_entry<A: crate::Attribute>(value: A::Value) -> (AttrKey, Arc<dyn AttributeValue>) {
    (AttrKey::of::<A>(), Arc::new(value))
}
