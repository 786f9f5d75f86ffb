use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttrError {
    /// Two different explicit attributes implied different values for the
    /// same key that is not itself explicit. Resolved by setting `contested`
    /// explicitly or removing one of the implying attributes.
    #[error(
        "attribute `{contested}` is implied with different values (last by `{implied_by}`); \
         set it explicitly to resolve the conflict"
    )]
    ImpliedConflict {
        /// The key that received contradictory implied values.
        contested: &'static str,
        /// The explicit key whose implication lost the race, i.e. the one
        /// that disagreed with the already-accumulated value.
        implied_by: &'static str,
    },

    /// Wire decoding met an attribute name with no codec registration.
    #[error("unknown attribute in wire data: {0}")]
    UnknownAttribute(String),

    /// Wire encoding met an explicit attribute with no codec registration.
    #[error("attribute `{0}` is not registered with this codec")]
    UnregisteredAttribute(&'static str),

    /// A stored value did not have the type its key declares. Only reachable
    /// through maps assembled via `Attributes::from_raw_parts` in violation
    /// of its contract.
    #[error("value stored under `{attribute}` does not match the key's declared type")]
    ValueType { attribute: &'static str },

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AttrError>;
