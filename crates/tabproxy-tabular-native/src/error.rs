use tabproxy_contracts::{
    ERR_SCHEMA_AMBIGUOUS_FIELD_NAME, ERR_SCHEMA_INVALID_NUMERIC_FIELD_INDEX,
    ERR_SCHEMA_NUMERIC_FIELD_INDEX_WITH_EMPTY_SCHEMA, ERR_SCHEMA_UNKNOWN_FIELD_NAME,
    ERR_UNICODE_CONVERSION, ERR_UNKNOWN_DATA_TYPE,
};
use tabproxy_core::{DispatchError, EncodingError, HostError, RegistryError};
use thiserror::Error as ThisError;

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TabularError {
    #[error("Numeric indexing using the field method is not supported for schemas with no fields.")]
    EmptySchema,

    #[error(
        "Invalid field index: {index}. Field index must be between 1 and the number of fields ({num_fields})."
    )]
    InvalidFieldIndex { index: i64, num_fields: usize },

    #[error("Unknown field name: '{0}'.")]
    UnknownFieldName(String),

    #[error("Field name '{name}' is ambiguous: {matches} fields share it.")]
    AmbiguousFieldName { name: String, matches: usize },

    #[error("Unknown data type: '{0}'.")]
    UnknownDataType(String),

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl TabularError {
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::EmptySchema => ERR_SCHEMA_NUMERIC_FIELD_INDEX_WITH_EMPTY_SCHEMA,
            Self::InvalidFieldIndex { .. } => ERR_SCHEMA_INVALID_NUMERIC_FIELD_INDEX,
            Self::UnknownFieldName(_) => ERR_SCHEMA_UNKNOWN_FIELD_NAME,
            Self::AmbiguousFieldName { .. } => ERR_SCHEMA_AMBIGUOUS_FIELD_NAME,
            Self::UnknownDataType(_) => ERR_UNKNOWN_DATA_TYPE,
            Self::Encoding(_) => ERR_UNICODE_CONVERSION,
            Self::Registry(e) => e.identifier(),
            Self::Dispatch(e) => e.identifier(),
        }
    }
}

impl From<TabularError> for HostError {
    fn from(err: TabularError) -> Self {
        HostError::new(err.identifier(), err.to_string())
    }
}
