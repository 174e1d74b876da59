use thiserror::Error;

/// Failures when turning a string key back into a [`crate::NodeId`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Node id `{0}` has no type delimiter")]
    MissingDelimiter(String),
    #[error("Node id `{0}` ends with a dangling escape")]
    DanglingEscape(String),
    #[error("Node id `{0}` has an empty resource type")]
    EmptyType(String),
}
