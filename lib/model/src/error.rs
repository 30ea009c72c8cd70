use thiserror::Error;

/// An error raised while registering a prefix in a [`PrefixTable`](crate::PrefixTable).
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum PrefixError {
    /// The short name cannot be used as a prefix name in SPARQL or Turtle.
    #[error("'{0}' is not a valid prefix name")]
    InvalidShortName(String),
    /// The namespace bound to a prefix must not be empty.
    #[error("The namespace of prefix '{0}' is empty")]
    EmptyNamespace(String),
}
