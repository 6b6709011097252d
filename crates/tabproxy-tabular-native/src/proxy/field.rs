use std::any::Any;
use std::sync::Arc;

use tabproxy_contracts::CLASS_FIELD;
use tabproxy_core::{HostArgs, HostError, HostString, HostValue, Proxy, ProxyClass, ProxyRegistry};

use super::unknown_method;
use crate::datatype::DataType;
use crate::error::TabularError;
use crate::field::Field;

#[derive(Debug)]
pub struct FieldProxy {
    field: Arc<Field>,
}

impl FieldProxy {
    pub fn new(field: Arc<Field>) -> Self {
        Self { field }
    }

    /// Build from host arguments: name and type name arrive as host text.
    pub fn from_host(
        name: &HostString,
        type_name: &HostString,
        nullable: bool,
    ) -> Result<Self, TabularError> {
        let name = name.decode()?;
        let data_type: DataType = type_name.decode()?.parse()?;
        Ok(Self::new(Arc::new(Field::new(name, data_type, nullable))))
    }

    /// Shared handle to the wrapped field.
    pub fn shared_field(&self) -> Arc<Field> {
        Arc::clone(&self.field)
    }

    pub fn name(&self) -> Result<HostString, TabularError> {
        Ok(HostString::encode(self.field.name().as_bytes())?)
    }

    pub fn type_name(&self) -> Result<HostString, TabularError> {
        Ok(HostString::encode(self.field.data_type().to_string().as_bytes())?)
    }

    pub fn to_host_string(&self) -> Result<HostString, TabularError> {
        Ok(HostString::encode(self.field.to_string().as_bytes())?)
    }
}

impl Proxy for FieldProxy {
    fn class_name(&self) -> &'static str {
        Self::CLASS_NAME
    }

    fn invoke(
        &self,
        method: &str,
        _args: &HostArgs,
        _registry: &ProxyRegistry,
    ) -> Result<HostValue, HostError> {
        let value = match method {
            "getName" => HostValue::String(self.name()?),
            "getType" => HostValue::String(self.type_name()?),
            "getNullable" => HostValue::Bool(self.field.is_nullable()),
            "toString" => HostValue::String(self.to_host_string()?),
            _ => return Err(unknown_method(Self::CLASS_NAME, method).into()),
        };
        Ok(value)
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl ProxyClass for FieldProxy {
    const CLASS_NAME: &'static str = CLASS_FIELD;
}

/// `make` for the Field class: `{Name, Type, Nullable = true}`.
pub fn make(args: &HostArgs, _registry: &ProxyRegistry) -> Result<Arc<dyn Proxy>, HostError> {
    let name = args.string("Name")?;
    let type_name = args.string("Type")?;
    let nullable = args.bool_or("Nullable", true)?;
    Ok(Arc::new(FieldProxy::from_host(name, type_name, nullable)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabproxy_contracts::{ERR_UNICODE_CONVERSION, ERR_UNKNOWN_DATA_TYPE, ERR_UNKNOWN_METHOD};

    fn args(name: HostString, ty: &str) -> HostArgs {
        HostArgs::new()
            .with("Name", HostValue::String(name))
            .with("Type", HostValue::String(ty.into()))
    }

    #[test]
    fn field_methods_report_name_type_and_nullability() {
        let registry = ProxyRegistry::new();
        let a = args("price".into(), "double").with("Nullable", HostValue::Bool(false));
        let proxy = make(&a, &registry).unwrap();
        let none = HostArgs::new();

        assert_eq!(
            proxy.invoke("getName", &none, &registry).unwrap(),
            HostValue::String("price".into())
        );
        assert_eq!(
            proxy.invoke("getType", &none, &registry).unwrap(),
            HostValue::String("double".into())
        );
        assert_eq!(
            proxy.invoke("getNullable", &none, &registry).unwrap(),
            HostValue::Bool(false)
        );
        assert_eq!(
            proxy.invoke("toString", &none, &registry).unwrap(),
            HostValue::String("price: double not null".into())
        );
        let err = proxy.invoke("setName", &none, &registry).unwrap_err();
        assert_eq!(err.id, ERR_UNKNOWN_METHOD);
    }

    #[test]
    fn invalid_host_name_is_an_encoding_error() {
        let registry = ProxyRegistry::new();
        let bad = HostString::from_units(vec![0x61, 0xDFFF]);
        let err = make(&args(bad, "int8"), &registry).err().unwrap();
        assert_eq!(err.id, ERR_UNICODE_CONVERSION);
    }

    #[test]
    fn unknown_type_name_is_rejected() {
        let registry = ProxyRegistry::new();
        let err = make(&args("x".into(), "decimal9000"), &registry).err().unwrap();
        assert_eq!(err.id, ERR_UNKNOWN_DATA_TYPE);
    }
}
