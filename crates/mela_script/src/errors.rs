//! Error type and diagnostic fragments for the scripting layer.

use thiserror::Error;

pub mod messages {
    pub const NO_ATTRIBUTE: &str = "no such attribute";
    pub const READ_ONLY: &str = "attribute is read-only";
    pub const FALLBACK_DECLINED: &str = "fallback accessor declined the name";
    pub const NO_METHOD: &str = "no such method";
    pub const RETURNS_REFERENCE: &str = "method returns a reference; invoke it with call_ref";
    pub const NO_CONSTRUCTOR: &str = "no constructor registered";
    pub const NO_CONVERTER: &str = "no converter registered";
    pub const NOT_ITERABLE: &str = "type is not iterable";
    pub const EMPTY_PATH: &str = "empty attribute path";
    pub const UNKNOWN_TYPE_NAME: &str = "no type registered under this name";
    pub const REGISTERED_TYPE: &str = "a registered type";
    pub const FOREIGN_VALUE: &str = "a value of another type";
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScriptError {
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeError { expected: String, actual: String },

    #[error("{ty} has no member '{member}': {detail}")]
    MemberNotFound {
        ty: String,
        member: String,
        detail: String,
    },

    #[error("Type {ty} is already registered as '{existing}'")]
    TypeAlreadyRegistered { ty: String, existing: String },

    #[error("Value of type {ty} is already borrowed")]
    BorrowConflict { ty: String },

    #[error("{ty}.{member} yields a computed value, which cannot be bound by reference")]
    NoReferent { ty: String, member: String },
}

pub type ScriptResult<T> = Result<T, ScriptError>;

impl ScriptError {
    pub(crate) fn type_error(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeError {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub(crate) fn member_not_found(
        ty: impl Into<String>,
        member: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::MemberNotFound {
            ty: ty.into(),
            member: member.into(),
            detail: detail.into(),
        }
    }

    pub(crate) fn borrowed(ty: impl Into<String>) -> Self {
        Self::BorrowConflict { ty: ty.into() }
    }

    pub(crate) fn no_referent(ty: impl Into<String>, member: impl Into<String>) -> Self {
        Self::NoReferent {
            ty: ty.into(),
            member: member.into(),
        }
    }

    pub fn is_type_error(&self) -> bool {
        matches!(self, Self::TypeError { .. })
    }

    pub fn is_member_not_found(&self) -> bool {
        matches!(self, Self::MemberNotFound { .. })
    }

    pub fn is_no_referent(&self) -> bool {
        matches!(self, Self::NoReferent { .. })
    }
}
