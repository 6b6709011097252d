//! Typed entry points over a registry, for callers that hold handles but do
//! not go through the JSON envelope.

use tabproxy_core::{HostString, ProxyId, ProxyRegistry};

use crate::error::TabularError;
use crate::proxy::{FieldProxy, SchemaProxy};

pub fn make_field(
    registry: &ProxyRegistry,
    name: &HostString,
    type_name: &HostString,
    nullable: bool,
) -> Result<ProxyId, TabularError> {
    let proxy = FieldProxy::from_host(name, type_name, nullable)?;
    Ok(registry.register(proxy))
}

/// Build a schema from field handles, in order. Nothing is registered on failure.
pub fn construct_schema(
    registry: &ProxyRegistry,
    field_ids: &[ProxyId],
) -> Result<ProxyId, TabularError> {
    let proxy = SchemaProxy::from_field_ids(field_ids, registry)?;
    Ok(registry.register(proxy))
}

/// `index` is 1-based.
pub fn field_by_index(
    registry: &ProxyRegistry,
    schema: ProxyId,
    index: i64,
) -> Result<ProxyId, TabularError> {
    registry
        .resolve::<SchemaProxy>(schema)?
        .field_by_index(index, registry)
}

/// The name is decoded before the schema handle is looked at.
pub fn field_by_name(
    registry: &ProxyRegistry,
    schema: ProxyId,
    name: &HostString,
) -> Result<ProxyId, TabularError> {
    let name = name.decode()?;
    registry
        .resolve::<SchemaProxy>(schema)?
        .field_by_name(&name, registry)
}

pub fn num_fields(registry: &ProxyRegistry, schema: ProxyId) -> Result<i64, TabularError> {
    Ok(registry.resolve::<SchemaProxy>(schema)?.num_fields())
}

pub fn field_names(
    registry: &ProxyRegistry,
    schema: ProxyId,
) -> Result<Vec<HostString>, TabularError> {
    registry.resolve::<SchemaProxy>(schema)?.field_names()
}

pub fn schema_to_string(
    registry: &ProxyRegistry,
    schema: ProxyId,
) -> Result<HostString, TabularError> {
    registry.resolve::<SchemaProxy>(schema)?.to_host_string()
}

pub fn field_name(registry: &ProxyRegistry, field: ProxyId) -> Result<HostString, TabularError> {
    registry.resolve::<FieldProxy>(field)?.name()
}
