//! Registry wrappers for the tabular values, one per host class.

pub mod field;
pub mod schema;

pub use field::FieldProxy;
pub use schema::SchemaProxy;

use tabproxy_core::DispatchError;

fn unknown_method(class: &'static str, method: &str) -> DispatchError {
    DispatchError::UnknownMethod {
        class,
        method: method.to_string(),
    }
}
