use std::fmt;
use std::str::FromStr;

use crate::error::TabularError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl TimeUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Second => "s",
            TimeUnit::Millisecond => "ms",
            TimeUnit::Microsecond => "us",
            TimeUnit::Nanosecond => "ns",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "s" => Some(TimeUnit::Second),
            "ms" => Some(TimeUnit::Millisecond),
            "us" => Some(TimeUnit::Microsecond),
            "ns" => Some(TimeUnit::Nanosecond),
            _ => None,
        }
    }
}

/// Column type carried by a field. Only its canonical name matters here: it is
/// what the host sends on construction and what schema rendering prints.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    Null,
    Boolean,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float16,
    Float32,
    Float64,
    Utf8,
    LargeUtf8,
    Binary,
    Date32,
    Date64,
    Timestamp {
        unit: TimeUnit,
        timezone: Option<String>,
    },
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Null => "null",
            DataType::Boolean => "bool",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::UInt8 => "uint8",
            DataType::UInt16 => "uint16",
            DataType::UInt32 => "uint32",
            DataType::UInt64 => "uint64",
            DataType::Float16 => "halffloat",
            DataType::Float32 => "float",
            DataType::Float64 => "double",
            DataType::Utf8 => "string",
            DataType::LargeUtf8 => "large_string",
            DataType::Binary => "binary",
            DataType::Date32 => "date32[day]",
            DataType::Date64 => "date64[ms]",
            DataType::Timestamp { unit, timezone } => {
                return match timezone {
                    Some(tz) => write!(f, "timestamp[{}, tz={tz}]", unit.as_str()),
                    None => write!(f, "timestamp[{}]", unit.as_str()),
                };
            }
        };
        f.write_str(name)
    }
}

impl FromStr for DataType {
    type Err = TabularError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || TabularError::UnknownDataType(s.to_string());
        let ty = match s.trim() {
            "null" => DataType::Null,
            "bool" | "boolean" => DataType::Boolean,
            "int8" => DataType::Int8,
            "int16" => DataType::Int16,
            "int32" => DataType::Int32,
            "int64" => DataType::Int64,
            "uint8" => DataType::UInt8,
            "uint16" => DataType::UInt16,
            "uint32" => DataType::UInt32,
            "uint64" => DataType::UInt64,
            "halffloat" | "float16" => DataType::Float16,
            "float" | "float32" => DataType::Float32,
            "double" | "float64" => DataType::Float64,
            "string" | "utf8" => DataType::Utf8,
            "large_string" | "large_utf8" => DataType::LargeUtf8,
            "binary" => DataType::Binary,
            "date32[day]" | "date32" => DataType::Date32,
            "date64[ms]" | "date64" => DataType::Date64,
            other => {
                let inner = other
                    .strip_prefix("timestamp[")
                    .and_then(|rest| rest.strip_suffix(']'))
                    .ok_or_else(unknown)?;
                let (unit, timezone) = match inner.split_once(',') {
                    Some((unit, tz)) => {
                        let tz = tz.trim().strip_prefix("tz=").ok_or_else(unknown)?;
                        if tz.is_empty() {
                            return Err(unknown());
                        }
                        (unit, Some(tz.to_string()))
                    }
                    None => (inner, None),
                };
                let unit = TimeUnit::parse(unit).ok_or_else(unknown)?;
                DataType::Timestamp { unit, timezone }
            }
        };
        Ok(ty)
    }
}
