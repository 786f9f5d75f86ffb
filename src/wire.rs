//! Serde adapter for attribute sets.
//!
//! Heterogeneous content cannot round-trip through serde on its own: the
//! wire side only sees names and JSON values, while the typed side needs the
//! original key types back. [`WireCodec`] bridges the two with an explicit
//! registry: each attribute type is registered once under a caller-chosen
//! wire name, which pins both the serialization of its value type and the
//! key token used on the way back in.
//!
//! Only *explicit* entries travel. The implied map is a derived artifact and
//! is recomputed by the closure pass when a document is decoded, so a
//! conflict baked into serialized content fails at decode time the same way
//! it would have failed at original construction time.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{AttrError, Result};
use crate::key::{AttrKey, Attribute};
use crate::set::Attributes;
use crate::value::{AttributeValue, RawEntries};

/// Wire shape: a single JSON object of name → value.
#[derive(Debug, Serialize, Deserialize)]
struct WireDoc {
    attributes: BTreeMap<String, serde_json::Value>,
}

struct EntryCodec {
    key: AttrKey,
    encode: fn(&dyn AttributeValue) -> Result<serde_json::Value>,
    decode: fn(serde_json::Value) -> Result<Arc<dyn AttributeValue>>,
}

fn encode_erased<A>(value: &dyn AttributeValue) -> Result<serde_json::Value>
where
    A: Attribute,
    A::Value: Serialize,
{
    let value = value
        .as_any()
        .downcast_ref::<A::Value>()
        .ok_or(AttrError::ValueType {
            attribute: AttrKey::of::<A>().name(),
        })?;
    Ok(serde_json::to_value(value)?)
}

fn decode_erased<A>(value: serde_json::Value) -> Result<Arc<dyn AttributeValue>>
where
    A: Attribute,
    A::Value: DeserializeOwned,
{
    let value: A::Value = serde_json::from_value(value)?;
    Ok(Arc::new(value))
}

/// Name-keyed registry translating between [`Attributes`] and JSON.
#[derive(Default)]
pub struct WireCodec {
    by_name: BTreeMap<String, EntryCodec>,
    names: BTreeMap<AttrKey, String>,
}

impl WireCodec {
    pub fn new() -> Self {
        WireCodec::default()
    }

    /// Register attribute type `A` under `name`. Later registrations under
    /// the same name win; one attribute type may be registered under one
    /// name only (re-registering moves it).
    pub fn register<A>(&mut self, name: impl Into<String>) -> &mut Self
    where
        A: Attribute,
        A::Value: Serialize + DeserializeOwned,
    {
        let name = name.into();
        let key = AttrKey::of::<A>();
        if let Some(old) = self.names.insert(key, name.clone()) {
            self.by_name.remove(&old);
        }
        self.by_name.insert(
            name,
            EntryCodec {
                key,
                encode: encode_erased::<A>,
                decode: decode_erased::<A>,
            },
        );
        self
    }

    /// Serialize the explicit entries of `attributes` to a JSON document.
    ///
    /// Fails with [`AttrError::UnregisteredAttribute`] when an explicit key
    /// has no registration.
    pub fn encode(&self, attributes: &Attributes) -> Result<serde_json::Value> {
        let mut doc = WireDoc {
            attributes: BTreeMap::new(),
        };
        for (key, value) in attributes.explicit_entries() {
            let name = self
                .names
                .get(key)
                .ok_or(AttrError::UnregisteredAttribute(key.name()))?;
            let codec = &self.by_name[name];
            doc.attributes
                .insert(name.clone(), (codec.encode)(value.as_ref())?);
        }
        Ok(serde_json::to_value(doc)?)
    }

    /// Rebuild a set from a JSON document produced by [`encode`].
    ///
    /// Goes through the closure-running constructor, so the result satisfies
    /// the usual invariants; implied content is derived, never read from the
    /// wire. Unknown names fail with [`AttrError::UnknownAttribute`].
    ///
    /// [`encode`]: WireCodec::encode
    pub fn decode(&self, document: serde_json::Value) -> Result<Attributes> {
        let doc: WireDoc = serde_json::from_value(document)?;
        let mut explicit = RawEntries::new();
        for (name, value) in doc.attributes {
            let codec = self
                .by_name
                .get(&name)
                .ok_or(AttrError::UnknownAttribute(name))?;
            explicit.insert(codec.key, (codec.decode)(value)?);
        }
        Attributes::from_explicit(explicit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Name;
    impl Attribute for Name {
        type Value = String;
    }

    struct Threads;
    impl Attribute for Threads {
        type Value = u32;
    }

    struct Fallback;
    impl Attribute for Fallback {
        type Value = String;
    }

    // Name implies Fallback=<same value>
    struct Profile;
    impl Attribute for Profile {
        type Value = String;
        fn implies(value: &String) -> Option<Attributes> {
            Attributes::of::<Fallback>(value.clone()).ok()
        }
    }

    fn codec() -> WireCodec {
        let mut codec = WireCodec::new();
        codec
            .register::<Name>("name")
            .register::<Threads>("threads")
            .register::<Profile>("profile")
            .register::<Fallback>("fallback");
        codec
    }

    #[test]
    fn encode_emits_explicit_entries_by_wire_name() {
        let attrs = Attributes::of::<Name>("build".into())
            .unwrap()
            .with::<Threads>(8)
            .unwrap();
        let doc = codec().encode(&attrs).unwrap();
        assert_eq!(doc, json!({"attributes": {"name": "build", "threads": 8}}));
    }

    #[test]
    fn implied_entries_stay_off_the_wire() {
        let attrs = Attributes::of::<Profile>("fast".into()).unwrap();
        assert!(attrs.get::<Fallback>().is_some());
        let doc = codec().encode(&attrs).unwrap();
        assert_eq!(doc, json!({"attributes": {"profile": "fast"}}));
    }

    #[test]
    fn decode_rederives_implied_content() {
        let attrs = codec()
            .decode(json!({"attributes": {"profile": "fast"}}))
            .unwrap();
        assert_eq!(attrs.get::<Fallback>().map(String::as_str), Some("fast"));
        assert!(!attrs.has::<Fallback>());
    }

    #[test]
    fn roundtrip_is_structurally_equal() {
        let attrs = Attributes::of::<Profile>("fast".into())
            .unwrap()
            .with::<Threads>(4)
            .unwrap();
        let codec = codec();
        let rebuilt = codec.decode(codec.encode(&attrs).unwrap()).unwrap();
        assert_eq!(attrs, rebuilt);
    }

    #[test]
    fn unknown_wire_name_fails_decode() {
        let err = codec()
            .decode(json!({"attributes": {"mystery": 1}}))
            .unwrap_err();
        assert!(matches!(err, AttrError::UnknownAttribute(name) if name == "mystery"));
    }

    #[test]
    fn unregistered_explicit_attribute_fails_encode() {
        struct Unregistered;
        impl Attribute for Unregistered {
            type Value = bool;
        }
        let attrs = Attributes::of::<Unregistered>(true).unwrap();
        let err = codec().encode(&attrs).unwrap_err();
        assert!(matches!(err, AttrError::UnregisteredAttribute(_)));
    }

    #[test]
    fn malformed_value_fails_decode_with_json_error() {
        let err = codec()
            .decode(json!({"attributes": {"threads": "not a number"}}))
            .unwrap_err();
        assert!(matches!(err, AttrError::Json(_)));
    }
}
