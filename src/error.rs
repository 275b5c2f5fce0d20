use thiserror::Error;

/// Result type for fallible CRDT operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by updates, decoding, and merging.
///
/// The variants fall into two classes. *Validation errors* report malformed
/// arguments or wire payloads: [`UnsafeAmount`], [`UnsafeValue`],
/// [`InvalidShape`], [`InvalidElement`], [`InvalidCounter`], [`Json`].
/// *Type errors* report a CRDT variant that does not match expectations:
/// [`TypeMismatch`], [`MissingType`], [`UnknownType`], [`BiasMismatch`],
/// [`MinterMismatch`], [`EmptyMerge`]. A failed operation never leaves the
/// receiving instance partially mutated.
///
/// [`UnsafeAmount`]: Error::UnsafeAmount
/// [`UnsafeValue`]: Error::UnsafeValue
/// [`InvalidShape`]: Error::InvalidShape
/// [`InvalidElement`]: Error::InvalidElement
/// [`InvalidCounter`]: Error::InvalidCounter
/// [`Json`]: Error::Json
/// [`TypeMismatch`]: Error::TypeMismatch
/// [`MissingType`]: Error::MissingType
/// [`UnknownType`]: Error::UnknownType
/// [`BiasMismatch`]: Error::BiasMismatch
/// [`MinterMismatch`]: Error::MinterMismatch
/// [`EmptyMerge`]: Error::EmptyMerge
#[derive(Debug, Error)]
pub enum Error {
    /// An update amount was NaN, infinite, zero, or negative where a
    /// positive finite number is required.
    #[error("expected a finite, positive amount")]
    UnsafeAmount,

    /// A decoded counter slot held something other than a finite,
    /// non-negative number.
    #[error("the value for {key:?} is not a safe number")]
    UnsafeValue {
        /// Actor key of the offending slot.
        key: String,
    },

    /// A wire payload was missing a field or had one of the wrong shape.
    #[error("expected {0}")]
    InvalidShape(&'static str),

    /// A serialized set entry could not be decoded.
    #[error("invalid element: {0}")]
    InvalidElement(String),

    /// A decoded toggle counter was not a positive integer.
    #[error("expected a positive integer counter, got {0}")]
    InvalidCounter(String),

    /// Element serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Two different concrete CRDT variants were merged.
    #[error("cannot merge {expected} with {found}")]
    TypeMismatch {
        /// Variant of the first operand.
        expected: &'static str,
        /// Variant of the mismatched operand.
        found: &'static str,
    },

    /// The parsed value was not an object carrying a `"type"` field.
    #[error("expected a JSON object with a \"type\" field")]
    MissingType,

    /// The `"type"` discriminator named no known CRDT variant.
    #[error("unknown CRDT type {0:?}")]
    UnknownType(String),

    /// Two [`LWWESet`](crate::LWWESet)s with different biases were merged.
    #[error("cannot merge LWW sets with different biases")]
    BiasMismatch,

    /// Two [`ORSet`](crate::ORSet)s minted by different tag registries were
    /// merged; their tags are not comparable.
    #[error("cannot merge OR sets minted by different tag registries")]
    MinterMismatch,

    /// [`merge`](crate::merge) was called with no items.
    #[error("merge requires at least one replica")]
    EmptyMerge,
}

impl Error {
    /// Whether this is a type error (wrong or mixed CRDT variant) rather
    /// than a validation error (malformed argument or payload).
    #[must_use]
    pub fn is_type_error(&self) -> bool {
        matches!(
            self,
            Error::TypeMismatch { .. }
                | Error::MissingType
                | Error::UnknownType(_)
                | Error::BiasMismatch
                | Error::MinterMismatch
                | Error::EmptyMerge
        )
    }
}
