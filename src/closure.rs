//! Implication closure and conflict detection.
//!
//! Every path that changes an explicit mapping funnels through [`close`]:
//! builder snapshots, the typed constructors and every derivation operation
//! on [`Attributes`](crate::Attributes). The pass expands each explicit
//! key's implication fragment once and accumulates the result, failing on
//! contradiction. There is no fixed-point loop; fragments are required to be
//! pre-closed (see [`Attribute::implies`](crate::Attribute::implies)).

use crate::error::{AttrError, Result};
use crate::value::RawEntries;

/// Compute the implied map for `explicit`.
///
/// Rules, applied per implied entry:
/// - a key that is explicit is skipped (explicit always wins, never a
///   conflict);
/// - a key already accumulated with an equal value is skipped (idempotent);
/// - a key already accumulated with a different value fails the whole run
///   with [`AttrError::ImpliedConflict`].
///
/// The result never shares keys with `explicit`. Iteration is over
/// `BTreeMap`s, so conflict-free inputs produce the same map and conflicting
/// inputs report the same conflict on every run with equal content.
pub(crate) fn close(explicit: &RawEntries) -> Result<RawEntries> {
    let mut implied = RawEntries::new();

    for (key, value) in explicit {
        let Some(fragment) = key.run_implies(value.as_ref()) else {
            continue;
        };

        // The fragment's own explicit and implied entries count equally:
        // the closed-fragment contract puts transitive implications in the
        // fragment's implied half.
        for (implied_key, implied_value) in fragment.explicit_entries().chain(fragment.implied_entries()) {
            if explicit.contains_key(implied_key) {
                continue;
            }
            match implied.get(implied_key) {
                Some(existing) if !existing.eq_value(implied_value.as_ref()) => {
                    return Err(AttrError::ImpliedConflict {
                        contested: implied_key.name(),
                        implied_by: key.name(),
                    });
                }
                Some(_) => {}
                None => {
                    implied.insert(*implied_key, implied_value.clone());
                }
            }
        }
    }

    Ok(implied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{AttrKey, Attribute};
    use crate::set::Attributes;
    use crate::value::raw_entry;

    struct Target;
    impl Attribute for Target {
        type Value = String;
    }

    struct SaysX;
    impl Attribute for SaysX {
        type Value = String;
        fn implies(_: &String) -> Option<Attributes> {
            Attributes::of::<Target>("x".to_string()).ok()
        }
    }

    struct SaysY;
    impl Attribute for SaysY {
        type Value = String;
        fn implies(_: &String) -> Option<Attributes> {
            Attributes::of::<Target>("y".to_string()).ok()
        }
    }

    struct AlsoSaysX;
    impl Attribute for AlsoSaysX {
        type Value = String;
        fn implies(_: &String) -> Option<Attributes> {
            Attributes::of::<Target>("x".to_string()).ok()
        }
    }

    fn entries(pairs: Vec<(AttrKey, std::sync::Arc<dyn crate::AttributeValue>)>) -> RawEntries {
        pairs.into_iter().collect()
    }

    #[test]
    fn no_implication_yields_empty_map() {
        let explicit = entries(vec![raw_entry::<Target>("t".into())]);
        let implied = close(&explicit).unwrap();
        assert!(implied.is_empty());
    }

    #[test]
    fn single_implier_lands_in_implied() {
        let explicit = entries(vec![raw_entry::<SaysX>("s".into())]);
        let implied = close(&explicit).unwrap();
        assert_eq!(implied.len(), 1);
        assert!(implied.contains_key(&AttrKey::of::<Target>()));
    }

    #[test]
    fn agreeing_impliers_do_not_conflict() {
        let explicit = entries(vec![
            raw_entry::<SaysX>("a".into()),
            raw_entry::<AlsoSaysX>("b".into()),
        ]);
        let implied = close(&explicit).unwrap();
        assert_eq!(implied.len(), 1);
    }

    #[test]
    fn disagreeing_impliers_conflict() {
        let explicit = entries(vec![
            raw_entry::<SaysX>("a".into()),
            raw_entry::<SaysY>("b".into()),
        ]);
        let err = close(&explicit).unwrap_err();
        match err {
            AttrError::ImpliedConflict { contested, .. } => {
                assert!(contested.contains("Target"));
            }
            other => panic!("expected ImpliedConflict, got {other:?}"),
        }
    }

    #[test]
    fn explicit_target_silences_the_conflict() {
        let explicit = entries(vec![
            raw_entry::<SaysX>("a".into()),
            raw_entry::<SaysY>("b".into()),
            raw_entry::<Target>("mine".into()),
        ]);
        let implied = close(&explicit).unwrap();
        // the implied map never shadows explicit keys
        assert!(!implied.contains_key(&AttrKey::of::<Target>()));
        assert!(implied.is_empty());
    }

    #[test]
    fn conflict_is_reproducible_for_identical_input() {
        let build = || {
            entries(vec![
                raw_entry::<SaysX>("a".into()),
                raw_entry::<SaysY>("b".into()),
            ])
        };
        let first = format!("{:?}", close(&build()).unwrap_err());
        for _ in 0..10 {
            assert_eq!(format!("{:?}", close(&build()).unwrap_err()), first);
        }
    }
}
