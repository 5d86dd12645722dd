use thiserror::Error;

/// Errors raised while indexing schema documents or resolving references between them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A reference, `$id` or document key is not a valid URI reference.
    #[error("Invalid URI reference '{uri}': {reason}")]
    InvalidUri { uri: String, reason: String },
    /// Two different schema nodes claim the same canonical identifier.
    #[error("Duplicate schema identifier '{id}'")]
    DuplicateId { id: String },
    /// A `$ref` target is not present in any supplied document.
    #[error("Unresolvable reference '{reference}'")]
    Unresolvable { reference: String },
    /// A `$ref` target is declared below another `$ref`, where identifiers are not indexed.
    #[error(
        "Unresolvable reference '{reference}': it is declared below a schema with `$ref` \
         '{parent}', where identifiers are ignored"
    )]
    BelowReference { reference: String, parent: String },
    /// A document has neither an explicit key nor an `$id`.
    #[error("Schema document has no `$id` and no key was provided")]
    MissingKey,
}

impl Error {
    pub(crate) fn invalid_uri(uri: impl Into<String>, reason: impl ToString) -> Error {
        Error::InvalidUri {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn duplicate_id(id: impl Into<String>) -> Error {
        Error::DuplicateId { id: id.into() }
    }

    pub(crate) fn unresolvable(reference: impl Into<String>) -> Error {
        Error::Unresolvable {
            reference: reference.into(),
        }
    }

    pub(crate) fn below_reference(reference: impl Into<String>, parent: impl Into<String>) -> Error {
        Error::BelowReference {
            reference: reference.into(),
            parent: parent.into(),
        }
    }
}
