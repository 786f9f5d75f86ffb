//! The immutable attribute set.
//!
//! [`Attributes`] holds two maps: `explicit` content a caller directly set,
//! and `implied` content derived from it by the closure pass. Both are fixed
//! at construction; every "modifying" operation derives a new instance and
//! re-runs the closure over the full new explicit map. Instances are cheap
//! to clone (values are `Arc`-shared) and safe to read concurrently once
//! published.
//!
//! Structural equality compares explicit key sets plus resolved
//! (explicit-or-implied) values. The distinguished [`Attributes::empty`]
//! instance equals any set with no explicit keys.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::closure;
use crate::error::Result;
use crate::key::{AttrKey, Attribute, DefaultAttribute, FlagAttribute, SetAttribute};
use crate::value::{AttributeValue, RawEntries};

static EMPTY: Lazy<Attributes> = Lazy::new(|| Attributes {
    explicit: RawEntries::new(),
    implied: RawEntries::new(),
});

/// An immutable, typed, heterogeneous attribute set.
#[derive(Clone)]
pub struct Attributes {
    explicit: RawEntries,
    implied: RawEntries,
}

impl Attributes {
    /// The shared zero-entry instance. Cloning it allocates nothing.
    pub fn empty() -> Attributes {
        EMPTY.clone()
    }

    /// Build a set from an explicit map, running the closure pass.
    pub(crate) fn from_explicit(explicit: RawEntries) -> Result<Attributes> {
        let implied = closure::close(&explicit)?;
        Ok(Attributes { explicit, implied })
    }

    /// A set holding a single key-value pair (plus whatever it implies).
    pub fn of<A: Attribute>(value: A::Value) -> Result<Attributes> {
        let mut explicit = RawEntries::new();
        explicit.insert(AttrKey::of::<A>(), Arc::new(value));
        Attributes::from_explicit(explicit)
    }

    /// A set holding a single flag (plus whatever it implies).
    pub fn flag<A: FlagAttribute>() -> Result<Attributes> {
        Attributes::of::<A>(())
    }

    /// Adopt caller-supplied maps verbatim: no type checking, no closure
    /// run. `implied` defaults to empty when `None`.
    ///
    /// The caller must independently guarantee what the typed constructors
    /// enforce: every value matches its key's declared type, `implied` is
    /// the closed expansion of `explicit` minus explicit keys, and the
    /// expansion is conflict-free. A violated type guarantee is not detected
    /// here; it surfaces later as a failed read (typed [`get`] returns
    /// `None`) local to the broken entry. Intended for trusted fast paths
    /// such as deserialization.
    ///
    /// [`get`]: Attributes::get
    pub fn from_raw_parts(explicit: RawEntries, implied: Option<RawEntries>) -> Attributes {
        Attributes {
            explicit,
            implied: implied.unwrap_or_default(),
        }
    }

    /// The explicit value for `A`, else the implied value, else `None`.
    ///
    /// Lookup is by key identity. Under a violated [`from_raw_parts`]
    /// contract a mistyped entry reads as `None`.
    ///
    /// [`from_raw_parts`]: Attributes::from_raw_parts
    pub fn get<A: Attribute>(&self) -> Option<&A::Value> {
        let key = AttrKey::of::<A>();
        let erased = self.explicit.get(&key).or_else(|| self.implied.get(&key))?;
        erased.as_any().downcast_ref::<A::Value>()
    }

    /// As [`get`](Attributes::get), falling back to the key's declared
    /// default when absent.
    pub fn get_or_default<A: DefaultAttribute>(&self) -> A::Value {
        self.get::<A>().cloned().unwrap_or_else(A::default_value)
    }

    /// Derive a set with `A` added or replaced as an explicit entry.
    pub fn with<A: Attribute>(&self, value: A::Value) -> Result<Attributes> {
        let mut explicit = self.explicit.clone();
        explicit.insert(AttrKey::of::<A>(), Arc::new(value));
        Attributes::from_explicit(explicit)
    }

    /// Derive a set with flag `A` set.
    pub fn with_flag<A: FlagAttribute>(&self) -> Result<Attributes> {
        self.with::<A>(())
    }

    /// Derive a set with `A`'s explicit entry removed.
    ///
    /// The closure re-runs over the remaining explicit keys, so a value for
    /// `A` reappears as implied when some other explicit key implies it, and
    /// a conflict previously masked by the explicit entry resurfaces as an
    /// error.
    pub fn without<A: Attribute>(&self) -> Result<Attributes> {
        let mut explicit = self.explicit.clone();
        explicit.remove(&AttrKey::of::<A>());
        Attributes::from_explicit(explicit)
    }

    /// As [`without`](Attributes::without), but a no-op clone when `A` is
    /// not explicit (the explicit map is unchanged, so no closure run).
    pub fn minus<A: Attribute>(&self) -> Result<Attributes> {
        if !self.explicit.contains_key(&AttrKey::of::<A>()) {
            return Ok(self.clone());
        }
        self.without::<A>()
    }

    /// Overlay `other` on top of this set: explicit maps merge with
    /// right-hand precedence on collision, and the implied map is derived
    /// fresh from the merged explicit content. Neither operand's implied map
    /// is reused; a conflict that only existed under one operand's explicit
    /// map does not survive, and one resolved by the merge does not reappear.
    pub fn plus(&self, other: &Attributes) -> Result<Attributes> {
        if self.is_empty() {
            return Ok(other.clone());
        }
        if other.is_empty() {
            return Ok(self.clone());
        }
        let mut explicit = self.explicit.clone();
        for (key, value) in &other.explicit {
            explicit.insert(*key, value.clone());
        }
        Attributes::from_explicit(explicit)
    }

    /// Derive a set with `element` added to the explicit set value of `A`.
    ///
    /// Reads the current *explicit* value only (absent counts as empty),
    /// writes the updated set back as an explicit entry, and re-runs the
    /// closure.
    pub fn with_element<A: SetAttribute>(&self, element: A::Element) -> Result<Attributes> {
        let mut current = self.explicit_set_value::<A>();
        current.insert(element);
        self.with::<A>(current)
    }

    /// Derive a set with `element` removed from the explicit set value of
    /// `A`. On an absent key this still writes an explicit empty set; the
    /// key does not stay absent.
    pub fn without_element<A: SetAttribute>(&self, element: &A::Element) -> Result<Attributes> {
        let mut current = self.explicit_set_value::<A>();
        current.remove(element);
        self.with::<A>(current)
    }

    fn explicit_set_value<A: SetAttribute>(&self) -> BTreeSet<A::Element> {
        self.explicit
            .get(&AttrKey::of::<A>())
            .and_then(|erased| erased.as_any().downcast_ref::<BTreeSet<A::Element>>())
            .cloned()
            .unwrap_or_default()
    }

    /// Whether `A` is explicitly present. Implied entries do not count.
    pub fn has<A: Attribute>(&self) -> bool {
        self.explicit.contains_key(&AttrKey::of::<A>())
    }

    /// Whether flag `A` is explicitly set.
    pub fn has_flag<A: FlagAttribute>(&self) -> bool {
        self.has::<A>()
    }

    /// Whether `A` is explicitly present with a value satisfying
    /// `predicate`. Implied entries do not count.
    pub fn has_any<A, P>(&self, predicate: P) -> bool
    where
        A: Attribute,
        P: FnOnce(&A::Value) -> bool,
    {
        self.explicit
            .get(&AttrKey::of::<A>())
            .and_then(|erased| erased.as_any().downcast_ref::<A::Value>())
            .is_some_and(predicate)
    }

    pub fn is_empty(&self) -> bool {
        self.explicit.is_empty()
    }

    /// The explicit key set.
    pub fn keys(&self) -> impl Iterator<Item = &AttrKey> {
        self.explicit.keys()
    }

    /// Explicit entries, in deterministic key order. This is the iteration
    /// surface wire adapters consume.
    pub fn explicit_entries(
        &self,
    ) -> impl Iterator<Item = (&AttrKey, &Arc<dyn AttributeValue>)> {
        self.explicit.iter()
    }

    /// Implied-only entries (never overlapping the explicit keys).
    pub fn implied_entries(
        &self,
    ) -> impl Iterator<Item = (&AttrKey, &Arc<dyn AttributeValue>)> {
        self.implied.iter()
    }

    /// Seed a builder with this set's explicit entries, for derive-by-
    /// mutation flows. Implied entries are left behind and recomputed at
    /// snapshot time.
    pub fn to_builder(&self) -> crate::AttributesBuilder {
        let mut builder = crate::AttributesBuilder::new();
        builder.put_from(self);
        builder
    }

    /// Resolved (explicit-or-implied) erased value for a key token.
    fn resolve(&self, key: &AttrKey) -> Option<&dyn AttributeValue> {
        self.explicit
            .get(key)
            .or_else(|| self.implied.get(key))
            .map(|arc| arc.as_ref())
    }

    /// Structural equality: identical explicit key sets, and for every key
    /// in that set an equal resolved value on both sides. Usable where the
    /// `PartialEq` sugar is not.
    pub fn structural_eq(a: &Attributes, b: &Attributes) -> bool {
        if !a.explicit.keys().eq(b.explicit.keys()) {
            return false;
        }
        a.explicit.keys().all(|key| match (a.resolve(key), b.resolve(key)) {
            (Some(left), Some(right)) => left.eq_value(right),
            _ => false,
        })
    }
}

impl PartialEq for Attributes {
    fn eq(&self, other: &Self) -> bool {
        Attributes::structural_eq(self, other)
    }
}

impl fmt::Debug for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in &self.explicit {
            map.entry(&key.name(), value);
        }
        map.finish()
    }
}

/// An object carrying an attribute set.
pub trait AttributeContainer {
    fn attributes(&self) -> &Attributes;
}
