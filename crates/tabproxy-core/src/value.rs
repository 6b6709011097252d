use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::encoding::{from_host_text, to_host_text, EncodingError};
use crate::error::DispatchError;
use crate::registry::ProxyId;

/// Host-native text: UTF-16 code units, possibly ill-formed. Serialized as an
/// array of code units; a plain JSON string is accepted on input for convenience.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct HostString(Vec<u16>);

impl HostString {
    pub fn from_units(units: Vec<u16>) -> Self {
        Self(units)
    }

    /// Encode internal UTF-8 text for the host.
    pub fn encode(utf8: &[u8]) -> Result<Self, EncodingError> {
        to_host_text(utf8).map(Self)
    }

    /// Decode into internal UTF-8 text.
    pub fn decode(&self) -> Result<String, EncodingError> {
        from_host_text(&self.0)
    }

    pub fn units(&self) -> &[u16] {
        &self.0
    }
}

impl From<&str> for HostString {
    fn from(s: &str) -> Self {
        Self(s.encode_utf16().collect())
    }
}

impl fmt::Debug for HostString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decode() {
            Ok(s) => write!(f, "{s:?}"),
            Err(_) => write!(f, "HostString({:?})", self.0),
        }
    }
}

impl Serialize for HostString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for HostString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Units(Vec<u16>),
            Text(String),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Units(units) => Self(units),
            Repr::Text(text) => Self::from(text.as_str()),
        })
    }
}

/// The host's tagged value model for arguments and results.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostValue {
    Bool(bool),
    Int(i64),
    Uint64(u64),
    Uint64Array(Vec<u64>),
    String(HostString),
    StringArray(Vec<HostString>),
}

impl HostValue {
    pub fn proxy_id(id: ProxyId) -> Self {
        HostValue::Uint64(id.raw())
    }
}

/// Named arguments of one host call.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostArgs(BTreeMap<String, HostValue>);

impl HostArgs {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: HostValue) -> Self {
        self.0.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&HostValue> {
        self.0.get(name)
    }

    fn require(&self, name: &str, expected: &'static str) -> Result<&HostValue, DispatchError> {
        self.get(name).ok_or_else(|| bad_argument(name, expected))
    }

    /// Signed integer argument; `uint64` values that fit are accepted.
    pub fn int(&self, name: &str) -> Result<i64, DispatchError> {
        const EXPECTED: &str = "an integer";
        match self.require(name, EXPECTED)? {
            HostValue::Int(v) => Ok(*v),
            HostValue::Uint64(v) => i64::try_from(*v).map_err(|_| bad_argument(name, EXPECTED)),
            _ => Err(bad_argument(name, EXPECTED)),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, DispatchError> {
        match self.get(name) {
            None => Ok(default),
            Some(HostValue::Bool(v)) => Ok(*v),
            Some(_) => Err(bad_argument(name, "a bool")),
        }
    }

    pub fn string(&self, name: &str) -> Result<&HostString, DispatchError> {
        match self.require(name, "a string")? {
            HostValue::String(s) => Ok(s),
            _ => Err(bad_argument(name, "a string")),
        }
    }

    /// Handle list argument; a scalar `uint64` counts as a one-element list.
    pub fn proxy_ids(&self, name: &str) -> Result<Vec<ProxyId>, DispatchError> {
        const EXPECTED: &str = "a uint64 array of proxy ids";
        match self.require(name, EXPECTED)? {
            HostValue::Uint64Array(ids) => Ok(ids.iter().copied().map(ProxyId::new).collect()),
            HostValue::Uint64(id) => Ok(vec![ProxyId::new(*id)]),
            _ => Err(bad_argument(name, EXPECTED)),
        }
    }
}

fn bad_argument(name: &str, expected: &'static str) -> DispatchError {
    DispatchError::BadArgument {
        name: name.to_string(),
        expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn host_strings_accept_units_or_text() {
        let from_units: HostString = serde_json::from_value(json!([104, 105])).unwrap();
        let from_text: HostString = serde_json::from_value(json!("hi")).unwrap();
        assert_eq!(from_units, from_text);
        assert_eq!(serde_json::to_value(&from_text).unwrap(), json!([104, 105]));
    }

    #[test]
    fn ill_formed_units_survive_deserialization() {
        let s: HostString = serde_json::from_value(json!([55296])).unwrap();
        assert_eq!(s.units(), &[0xD800]);
        assert!(s.decode().is_err());
    }

    #[test]
    fn values_use_snake_case_tags() {
        let args = HostArgs::new()
            .with("Index", HostValue::Int(2))
            .with("FieldProxyIDs", HostValue::Uint64Array(vec![1, 2]));
        assert_eq!(
            serde_json::to_value(args).unwrap(),
            json!({"FieldProxyIDs": {"uint64_array": [1, 2]}, "Index": {"int": 2}})
        );
    }

    #[test]
    fn typed_accessors_report_bad_arguments() {
        let args: HostArgs = serde_json::from_value(json!({
            "Index": {"uint64": 3},
            "Name": {"string": "a"},
            "Ids": {"uint64": 9},
        }))
        .unwrap();

        assert_eq!(args.int("Index").unwrap(), 3);
        assert_eq!(args.string("Name").unwrap().decode().unwrap(), "a");
        assert_eq!(args.proxy_ids("Ids").unwrap(), vec![ProxyId::new(9)]);
        assert!(args.bool_or("Nullable", true).unwrap());

        let err = args.int("Name").unwrap_err();
        assert_eq!(err.to_string(), "argument 'Name' must be an integer");
        let err = args.string("Missing").unwrap_err();
        assert_eq!(err.to_string(), "argument 'Missing' must be a string");
    }

    #[test]
    fn oversized_uint64_is_not_an_int() {
        let args = HostArgs::new().with("Index", HostValue::Uint64(u64::MAX));
        assert!(args.int("Index").is_err());
    }
}
