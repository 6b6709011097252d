#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]

//! Tabular schema classes exposed to the host through handles.
//!
//! `Schema` and `Field` are plain immutable values; the `proxy` module wraps them
//! for the registry and `ops` offers the same operations as typed functions.

mod datatype;
mod error;
mod field;
mod schema;

pub mod ffi;
pub mod ops;
pub mod proxy;

use std::sync::Arc;

use tabproxy_contracts::{CLASS_FIELD, CLASS_SCHEMA};
use tabproxy_core::{ProxyManager, ProxyRegistry};

pub use datatype::{DataType, TimeUnit};
pub use error::TabularError;
pub use field::Field;
pub use schema::{NameLookup, Schema};

/// Register every tabular class with `manager`.
pub fn register_classes(manager: &mut ProxyManager) {
    manager.register_class(CLASS_FIELD, proxy::field::make);
    manager.register_class(CLASS_SCHEMA, proxy::schema::make);
}

/// A manager over `registry` with all tabular classes available.
pub fn new_manager(registry: Arc<ProxyRegistry>) -> ProxyManager {
    let mut manager = ProxyManager::new(registry);
    register_classes(&mut manager);
    manager
}
