use serde::{Deserialize, Serialize};
use tabproxy_contracts::{
    ERR_BAD_ARGUMENT, ERR_BAD_REQUEST, ERR_INTERNAL, ERR_UNICODE_CONVERSION, ERR_UNKNOWN_CLASS,
    ERR_UNKNOWN_METHOD,
};
use thiserror::Error as ThisError;

use crate::encoding::EncodingError;

/// The only error shape that crosses the host boundary: a stable identifier the
/// host can match on plus a human-readable message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("{message}")]
pub struct HostError {
    pub id: String,
    pub message: String,

    /// Set when the failure points at a corrupted host reference rather than a
    /// user error (an unresolvable handle for the object being called).
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
}

impl HostError {
    pub fn new(id: &str, message: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            message: message.into(),
            fatal: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ERR_INTERNAL, message)
    }

    #[must_use]
    pub fn into_fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn is_fatal(&self) -> bool {
        self.fatal
    }
}

impl From<EncodingError> for HostError {
    fn from(err: EncodingError) -> Self {
        Self::new(ERR_UNICODE_CONVERSION, err.to_string())
    }
}

/// Failures of the name-based call convention itself, before any class logic runs.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DispatchError {
    #[error("unknown proxy class '{0}'")]
    UnknownClass(String),

    #[error("proxy class '{class}' has no method '{method}'")]
    UnknownMethod { class: &'static str, method: String },

    #[error("argument '{name}' must be {expected}")]
    BadArgument {
        name: String,
        expected: &'static str,
    },

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl DispatchError {
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::UnknownClass(_) => ERR_UNKNOWN_CLASS,
            Self::UnknownMethod { .. } => ERR_UNKNOWN_METHOD,
            Self::BadArgument { .. } => ERR_BAD_ARGUMENT,
            Self::BadRequest(_) => ERR_BAD_REQUEST,
        }
    }
}

impl From<DispatchError> for HostError {
    fn from(err: DispatchError) -> Self {
        Self::new(err.identifier(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::from_host_text;

    #[test]
    fn encoding_errors_map_to_unicode_identifier() {
        let err: HostError = from_host_text(&[0xD800]).unwrap_err().into();
        assert_eq!(err.id, ERR_UNICODE_CONVERSION);
        assert!(!err.is_fatal());
    }

    #[test]
    fn fatal_flag_is_not_serialized_unless_set() {
        let err = HostError::new(ERR_BAD_REQUEST, "nope");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json, serde_json::json!({"id": ERR_BAD_REQUEST, "message": "nope"}));

        let json = serde_json::to_value(err.into_fatal()).unwrap();
        assert_eq!(json["fatal"], serde_json::json!(true));
    }

    #[test]
    fn dispatch_errors_carry_their_identifier() {
        let err: HostError = DispatchError::UnknownMethod {
            class: "C",
            method: "m".to_string(),
        }
        .into();
        assert_eq!(err.id, ERR_UNKNOWN_METHOD);
        assert_eq!(err.message, "proxy class 'C' has no method 'm'");
    }
}
