//! Mutable staging session for assembling [`Attributes`].
//!
//! The builder owns a staged explicit map and nothing else. No implication
//! runs while staging; the closure pass happens once per
//! [`snapshot`](AttributesBuilder::snapshot), over a copy of the staged
//! state, so a builder can produce any number of independent sets. Not
//! thread-safe by design: one builder per caller, combine results with
//! [`Attributes::plus`] when composing concurrently.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::Result;
use crate::key::{AttrKey, Attribute, FlagAttribute, SetAttribute};
use crate::set::Attributes;
use crate::value::RawEntries;

#[derive(Default)]
pub struct AttributesBuilder {
    staged: RawEntries,
}

impl AttributesBuilder {
    pub fn new() -> Self {
        AttributesBuilder::default()
    }

    /// Stage a value for `A`, or remove the staged entry when `value` is
    /// `None`.
    pub fn put<A: Attribute>(&mut self, value: Option<A::Value>) -> &mut Self {
        let key = AttrKey::of::<A>();
        match value {
            Some(value) => {
                self.staged.insert(key, Arc::new(value));
            }
            None => {
                self.staged.remove(&key);
            }
        }
        self
    }

    /// Stage flag `A`.
    pub fn put_flag<A: FlagAttribute>(&mut self) -> &mut Self {
        self.put::<A>(Some(()))
    }

    /// Stage every *explicit* entry of `attributes`, replacing staged
    /// entries on collision. Implied entries are deliberately not imported;
    /// they are recomputed at snapshot time from whatever the staged map
    /// ends up containing.
    pub fn put_from(&mut self, attributes: &Attributes) -> &mut Self {
        for (key, value) in attributes.explicit_entries() {
            self.staged.insert(*key, value.clone());
        }
        self
    }

    /// Add an element to the staged set value of `A` (absent counts as
    /// empty).
    pub fn add_element<A: SetAttribute>(&mut self, element: A::Element) -> &mut Self {
        let mut current = self.staged_set_value::<A>();
        current.insert(element);
        self.put::<A>(Some(current))
    }

    /// Remove an element from the staged set value of `A`. On an absent key
    /// this stages an explicit empty set.
    pub fn remove_element<A: SetAttribute>(&mut self, element: &A::Element) -> &mut Self {
        let mut current = self.staged_set_value::<A>();
        current.remove(element);
        self.put::<A>(Some(current))
    }

    fn staged_set_value<A: SetAttribute>(&self) -> BTreeSet<A::Element> {
        self.staged
            .get(&AttrKey::of::<A>())
            .and_then(|erased| erased.as_any().downcast_ref::<BTreeSet<A::Element>>())
            .cloned()
            .unwrap_or_default()
    }

    /// Produce an immutable set from a copy of the staged state, running the
    /// closure pass. The builder is untouched and may be mutated or
    /// snapshotted again; later snapshots do not affect earlier ones.
    pub fn snapshot(&self) -> Result<Attributes> {
        Attributes::from_explicit(self.staged.clone())
    }
}
