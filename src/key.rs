//! Attribute keys and their capability markers.
//!
//! A key is a zero-sized Rust type implementing [`Attribute`]. The type *is*
//! the identity: two lookups agree exactly when they name the same key type.
//! At runtime a key is represented by the [`AttrKey`] token, which carries
//! the `TypeId`, the type name (for ordering and error messages) and an
//! erased hook into the key's implication function.
//!
//! Capabilities are independent marker traits, not a hierarchy:
//!
//! | Trait | Value shape | Adds |
//! |-------|-------------|------|
//! | [`FlagAttribute`] | `()` | presence-only semantics |
//! | [`DefaultAttribute`] | any | a fallback for [`get_or_default`](crate::Attributes::get_or_default) |
//! | [`SetAttribute`] | `BTreeSet<Element>` | element-level add/remove |

use std::any::{type_name, TypeId};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::fmt::Debug;
use std::hash::{Hash, Hasher};

use crate::set::Attributes;
use crate::value::AttributeValue;

/// A typed attribute key.
///
/// Implementors are usually unit structs; the associated [`Value`] type is
/// what a set stores under this key.
///
/// # Implication contract
///
/// [`implies`] must be a pure, deterministic function of the value, and the
/// fragment it returns must already be fully closed: if the fragment's own
/// explicit keys have further implications, those must already appear in the
/// fragment's implied content. The closure pass runs exactly once and never
/// re-invokes `implies` on entries it discovers, so a non-closed fragment
/// under-resolves and a cyclic implication graph (A implies B, B implies A)
/// will diverge while *building* the fragment, in the key author's code.
/// Both are contract violations the core does not defend against.
///
/// Fragments built through [`Attributes::of`] or
/// [`AttributesBuilder`](crate::AttributesBuilder) satisfy the closed-fragment
/// requirement automatically, because those constructors run the closure
/// themselves.
///
/// [`Value`]: Attribute::Value
/// [`implies`]: Attribute::implies
pub trait Attribute: 'static {
    /// The value type stored under this key.
    type Value: AttributeValue + Clone;

    /// Attributes that should be assigned whenever this one is, as a
    /// function of the assigned value. Default: none.
    fn implies(value: &Self::Value) -> Option<Attributes> {
        let _ = value;
        None
    }
}

/// An attribute that is either present or absent, with no payload.
pub trait FlagAttribute: Attribute<Value = ()> {}

/// An attribute with a fallback value used when it is neither explicit nor
/// implied.
pub trait DefaultAttribute: Attribute {
    fn default_value() -> Self::Value;
}

/// An attribute holding a set of elements, supporting element-level
/// add/remove through
/// [`with_element`](crate::Attributes::with_element) /
/// [`without_element`](crate::Attributes::without_element).
pub trait SetAttribute: Attribute<Value = BTreeSet<Self::Element>> {
    type Element: Ord + Clone + Debug + Send + Sync + 'static;
}

/// Erased `implies` dispatch stored inside [`AttrKey`].
///
/// Returns `None` (no implication) when the stored value does not downcast
/// to the key's declared type, which can only happen for maps assembled
/// through [`Attributes::from_raw_parts`] with a violated type contract.
fn implies_erased<A: Attribute>(value: &dyn AttributeValue) -> Option<Attributes> {
    let value = value.as_any().downcast_ref::<A::Value>()?;
    A::implies(value)
}

/// Runtime identity token for an attribute key type.
///
/// Equality and hashing go by `TypeId`. Ordering goes by type name first
/// (`TypeId` as a tiebreak), so map iteration order depends only on which
/// keys are present, never on hasher state or allocation order.
#[derive(Clone, Copy)]
pub struct AttrKey {
    id: TypeId,
    name: &'static str,
    is_flag: bool,
    implies: fn(&dyn AttributeValue) -> Option<Attributes>,
}

impl AttrKey {
    /// The token for key type `A`.
    pub fn of<A: Attribute>() -> Self {
        AttrKey {
            id: TypeId::of::<A>(),
            name: type_name::<A>(),
            is_flag: TypeId::of::<A::Value>() == TypeId::of::<()>(),
            implies: implies_erased::<A>,
        }
    }

    /// Full type path of the key, as used in `Debug` output and conflict
    /// messages.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the key's value type is `()`, i.e. it carries flag semantics.
    pub fn is_flag(&self) -> bool {
        self.is_flag
    }

    /// Whether this token identifies key type `A`.
    pub fn is<A: Attribute>(&self) -> bool {
        self.id == TypeId::of::<A>()
    }

    pub(crate) fn run_implies(&self, value: &dyn AttributeValue) -> Option<Attributes> {
        (self.implies)(value)
    }
}

impl PartialEq for AttrKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for AttrKey {}

impl Hash for AttrKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for AttrKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttrKey {
    fn cmp(&self, other: &Self) -> Ordering {
        // Name first so the order is stable across processes; TypeId breaks
        // the (unlikely) tie of two distinct types sharing a rendered name.
        self.name
            .cmp(other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl Debug for AttrKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttrKey({})", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Alpha;
    impl Attribute for Alpha {
        type Value = String;
    }

    struct Beta;
    impl Attribute for Beta {
        type Value = String;
    }

    struct Marker;
    impl Attribute for Marker {
        type Value = ();
    }
    impl FlagAttribute for Marker {}

    #[test]
    fn same_key_type_is_equal() {
        assert_eq!(AttrKey::of::<Alpha>(), AttrKey::of::<Alpha>());
    }

    #[test]
    fn different_key_types_differ_even_with_same_value_type() {
        assert_ne!(AttrKey::of::<Alpha>(), AttrKey::of::<Beta>());
    }

    #[test]
    fn flag_detection_goes_by_unit_value_type() {
        assert!(AttrKey::of::<Marker>().is_flag());
        assert!(!AttrKey::of::<Alpha>().is_flag());
    }

    #[test]
    fn is_checks_identity() {
        let key = AttrKey::of::<Alpha>();
        assert!(key.is::<Alpha>());
        assert!(!key.is::<Beta>());
    }

    #[test]
    fn ordering_follows_type_name() {
        let alpha = AttrKey::of::<Alpha>();
        let beta = AttrKey::of::<Beta>();
        assert!(alpha < beta);
        assert_eq!(alpha.cmp(&alpha), Ordering::Equal);
    }

    #[test]
    fn debug_includes_type_path() {
        let rendered = format!("{:?}", AttrKey::of::<Alpha>());
        assert!(rendered.contains("Alpha"));
    }
}
