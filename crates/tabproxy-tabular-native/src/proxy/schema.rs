use std::any::Any;
use std::sync::Arc;

use tabproxy_contracts::CLASS_SCHEMA;
use tabproxy_core::{
    HostArgs, HostError, HostString, HostValue, Proxy, ProxyClass, ProxyId, ProxyRegistry,
};
use tracing::debug;

use super::field::FieldProxy;
use super::unknown_method;
use crate::error::TabularError;
use crate::schema::{NameLookup, Schema};

/// Host-facing Schema. Lookups that yield a field register a new `FieldProxy`
/// sharing the schema's field and return its handle.
#[derive(Debug)]
pub struct SchemaProxy {
    schema: Arc<Schema>,
}

impl SchemaProxy {
    pub fn new(schema: Arc<Schema>) -> Self {
        Self { schema }
    }

    /// Resolve every field handle, in order. Any failure aborts the whole build.
    pub fn from_field_ids(ids: &[ProxyId], registry: &ProxyRegistry) -> Result<Self, TabularError> {
        let mut fields = Vec::with_capacity(ids.len());
        for id in ids {
            fields.push(registry.resolve::<FieldProxy>(*id)?.shared_field());
        }
        debug!(num_fields = fields.len(), "constructed schema");
        Ok(Self::new(Arc::new(Schema::new(fields))))
    }

    pub fn shared_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    /// `index` is 1-based, as the host counts.
    pub fn field_by_index(
        &self,
        index: i64,
        registry: &ProxyRegistry,
    ) -> Result<ProxyId, TabularError> {
        if self.schema.is_empty() {
            return Err(TabularError::EmptySchema);
        }
        let num_fields = self.schema.num_fields();
        let field = usize::try_from(index)
            .ok()
            .filter(|i| (1..=num_fields).contains(i))
            .and_then(|i| self.schema.field(i - 1))
            .ok_or(TabularError::InvalidFieldIndex { index, num_fields })?;
        Ok(registry.register(FieldProxy::new(Arc::clone(field))))
    }

    pub fn field_by_name(
        &self,
        name: &str,
        registry: &ProxyRegistry,
    ) -> Result<ProxyId, TabularError> {
        let i = match self.schema.lookup(name) {
            NameLookup::Unique(i) => i,
            NameLookup::Missing => return Err(TabularError::UnknownFieldName(name.to_string())),
            NameLookup::Ambiguous(matches) => {
                return Err(TabularError::AmbiguousFieldName {
                    name: name.to_string(),
                    matches,
                })
            }
        };
        let field = self
            .schema
            .field(i)
            .ok_or_else(|| TabularError::UnknownFieldName(name.to_string()))?;
        Ok(registry.register(FieldProxy::new(Arc::clone(field))))
    }

    pub fn num_fields(&self) -> i64 {
        i64::try_from(self.schema.num_fields()).unwrap_or(i64::MAX)
    }

    /// All names in schema order; one bad name fails the whole list.
    pub fn field_names(&self) -> Result<Vec<HostString>, TabularError> {
        let mut names = Vec::with_capacity(self.schema.num_fields());
        for name in self.schema.field_names() {
            names.push(HostString::encode(name.as_bytes())?);
        }
        Ok(names)
    }

    pub fn to_host_string(&self) -> Result<HostString, TabularError> {
        Ok(HostString::encode(self.schema.to_string().as_bytes())?)
    }
}

impl Proxy for SchemaProxy {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn invoke(
        &self,
        method: &str,
        args: &HostArgs,
        registry: &ProxyRegistry,
    ) -> Result<HostValue, HostError> {
        let value = match method {
            "getFieldByIndex" => {
                let index = args.int("Index")?;
                HostValue::proxy_id(self.field_by_index(index, registry)?)
            }
            "getFieldByName" => {
                let name = args.string("Name")?.decode()?;
                HostValue::proxy_id(self.field_by_name(&name, registry)?)
            }
            "getNumFields" => HostValue::Int(self.num_fields()),
            "getFieldNames" => HostValue::StringArray(self.field_names()?),
            "toString" => HostValue::String(self.to_host_string()?),
            _ => return Err(unknown_method(Self::CLASS_NAME, method).into()),
        };
        Ok(value)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl ProxyClass for SchemaProxy {
    const CLASS_NAME: &'static str = CLASS_SCHEMA;
}

/// `make` for the Schema class: `{FieldProxyIDs}`.
pub fn make(args: &HostArgs, registry: &ProxyRegistry) -> Result<Arc<dyn Proxy>, HostError> {
    let ids = args.proxy_ids("FieldProxyIDs")?;
    Ok(Arc::new(SchemaProxy::from_field_ids(&ids, registry)?))
}
