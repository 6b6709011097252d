//! Shared, version-pinned protocol identifiers.
//!
//! These constants are the single source of truth for version strings and error
//! identifiers that appear in machine-readable host I/O. Hosts match on the error
//! identifiers, so they must never change meaning once published.

pub const TABPROXY_REQUEST_SCHEMA_VERSION: &str = "tabproxy.request@0.1.0";
pub const TABPROXY_HOST_REPORT_SCHEMA_VERSION: &str = "tabproxy-host.report@0.1.0";

pub const CLASS_FIELD: &str = "tabproxy.type.Field";
pub const CLASS_SCHEMA: &str = "tabproxy.tabular.Schema";

// Proxy lifetime and dispatch.
pub const ERR_UNKNOWN_PROXY_ID: &str = "tabproxy:proxy:UnknownProxyID";
pub const ERR_PROXY_TYPE_MISMATCH: &str = "tabproxy:proxy:TypeMismatch";
pub const ERR_UNKNOWN_CLASS: &str = "tabproxy:proxy:UnknownClass";
pub const ERR_UNKNOWN_METHOD: &str = "tabproxy:proxy:UnknownMethod";
pub const ERR_BAD_ARGUMENT: &str = "tabproxy:proxy:BadArgument";
pub const ERR_BAD_REQUEST: &str = "tabproxy:proxy:BadRequest";
pub const ERR_INTERNAL: &str = "tabproxy:proxy:Internal";

// Text boundary.
pub const ERR_UNICODE_CONVERSION: &str = "tabproxy:unicode:UnicodeConversion";

// Tabular schema lookups.
pub const ERR_SCHEMA_NUMERIC_FIELD_INDEX_WITH_EMPTY_SCHEMA: &str =
    "tabproxy:tabular:schema:NumericFieldIndexWithEmptySchema";
pub const ERR_SCHEMA_INVALID_NUMERIC_FIELD_INDEX: &str =
    "tabproxy:tabular:schema:InvalidNumericFieldIndex";
pub const ERR_SCHEMA_UNKNOWN_FIELD_NAME: &str = "tabproxy:tabular:schema:UnknownFieldName";
pub const ERR_SCHEMA_AMBIGUOUS_FIELD_NAME: &str = "tabproxy:tabular:schema:AmbiguousFieldName";

// Type system.
pub const ERR_UNKNOWN_DATA_TYPE: &str = "tabproxy:type:UnknownDataType";
