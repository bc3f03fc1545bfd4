// ⚠️ Listing Errors
// Typed errors for the normalization and update engine

use thiserror::Error;

/// Errors raised while normalizing or storing a listing.
///
/// `Parse` and `UnrecognizedDatePhrase` are local to one listing: the ingest
/// pipeline skips that listing and carries on with the batch.
/// `DuplicateIdentity` and `UnknownIdentity` are caller errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ListingError {
    /// A scalar, date or field could not be coerced
    #[error("could not parse {field} from {value:?}: {reason}")]
    Parse {
        field: String,
        value: String,
        reason: String,
    },

    /// Date phrase outside the known vocabulary
    #[error("unrecognized date phrase: {0:?}")]
    UnrecognizedDatePhrase(String),

    /// Insert of an identity that is already stored
    #[error("listing already in dataset: {0}")]
    DuplicateIdentity(String),

    /// Update of an identity that was never stored
    #[error("listing not in dataset: {0}")]
    UnknownIdentity(String),

    /// An update tried to move a record to another identity
    #[error("update may not change listing identity {from} to {to}")]
    IdentityChanged { from: String, to: String },
}

impl ListingError {
    pub fn parse(field: &str, value: &str, reason: impl Into<String>) -> Self {
        ListingError::Parse {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// True for every error that only invalidates the listing being parsed
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ListingError::Parse { .. } | ListingError::UnrecognizedDatePhrase(_)
        )
    }
}

pub type ListingResult<T> = std::result::Result<T, ListingError>;
