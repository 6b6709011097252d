use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tabproxy_contracts::TABPROXY_REQUEST_SCHEMA_VERSION;

use crate::error::{DispatchError, HostError};
use crate::registry::ProxyId;
use crate::value::{HostArgs, HostValue};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Create {
        class: String,
        #[serde(default)]
        args: HostArgs,
    },
    Call {
        id: ProxyId,
        method: String,
        #[serde(default)]
        args: HostArgs,
    },
    Delete {
        id: ProxyId,
    },
}

impl Request {
    pub fn op_name(&self) -> &'static str {
        match self {
            Request::Create { .. } => "create",
            Request::Call { .. } => "call",
            Request::Delete { .. } => "delete",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,

    #[serde(flatten)]
    pub request: Request,
}

impl RequestEnvelope {
    pub fn new(request: Request) -> Self {
        Self {
            schema_version: Some(TABPROXY_REQUEST_SCHEMA_VERSION.to_string()),
            request,
        }
    }

    pub fn decode(bytes: &[u8], max_request_bytes: u32) -> Result<Self, DispatchError> {
        if bytes.len() > max_request_bytes as usize {
            return Err(DispatchError::BadRequest(format!(
                "request is {} bytes, limit is {max_request_bytes}",
                bytes.len()
            )));
        }
        let bytes = lower_lone_surrogates(bytes);
        let envelope: RequestEnvelope = serde_json::from_slice(&bytes)
            .map_err(|e| DispatchError::BadRequest(format!("invalid request json: {e}")))?;
        if let Some(v) = &envelope.schema_version {
            if v != TABPROXY_REQUEST_SCHEMA_VERSION {
                return Err(DispatchError::BadRequest(format!(
                    "unsupported schema_version {v:?} (expected {TABPROXY_REQUEST_SCHEMA_VERSION:?})"
                )));
            }
        }
        Ok(envelope)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response {
    Ok { value: HostValue },
    Err { error: HostError },
}

impl Response {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok { .. })
    }

    pub fn encode(&self) -> Vec<u8> {
        serde_json::to_vec(self).unwrap_or_else(|e| {
            let fallback = Response::Err {
                error: HostError::internal(format!("response encoding failed: {e}")),
            };
            serde_json::to_vec(&fallback).unwrap_or_default()
        })
    }
}

/// Rewrite every JSON string literal whose escapes decode to an unpaired
/// surrogate as an array of its UTF-16 code units.
///
/// serde_json refuses such escapes outright, but host text may be ill-formed:
/// the array form carries it intact to `HostString::decode`, which then reports
/// the encoding error. Anything else is left byte-for-byte alone.
fn lower_lone_surrogates(bytes: &[u8]) -> Cow<'_, [u8]> {
    if !bytes.windows(2).any(|w| w == b"\\u") {
        return Cow::Borrowed(bytes);
    }

    let mut out: Option<Vec<u8>> = None;
    let mut copied = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'"' {
            i += 1;
            continue;
        }
        let Some(end) = string_end(bytes, i + 1) else {
            break;
        };
        if let Some(units) = literal_units(&bytes[i + 1..end]) {
            if char::decode_utf16(units.iter().copied()).any(|c| c.is_err()) {
                let out = out.get_or_insert_with(|| Vec::with_capacity(bytes.len()));
                out.extend_from_slice(&bytes[copied..i]);
                write_units(out, &units);
                copied = end + 1;
            }
        }
        i = end + 1;
    }

    match out {
        Some(mut out) => {
            out.extend_from_slice(&bytes[copied..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(bytes),
    }
}

/// Index of the quote closing a string literal whose body starts at `start`.
fn string_end(bytes: &[u8], start: usize) -> Option<usize> {
    let mut j = start;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b'"' => return Some(j),
            _ => j += 1,
        }
    }
    None
}

/// UTF-16 code units of a string literal body, surrogates kept as written.
/// `None` when the body is not valid JSON string content.
fn literal_units(body: &[u8]) -> Option<Vec<u16>> {
    let mut units = Vec::with_capacity(body.len());
    let mut j = 0;
    while j < body.len() {
        if body[j] != b'\\' {
            let run_end = body[j..]
                .iter()
                .position(|&b| b == b'\\')
                .map_or(body.len(), |p| j + p);
            units.extend(std::str::from_utf8(&body[j..run_end]).ok()?.encode_utf16());
            j = run_end;
            continue;
        }
        let unit = match *body.get(j + 1)? {
            b'"' => 0x22,
            b'\\' => 0x5C,
            b'/' => 0x2F,
            b'b' => 0x08,
            b'f' => 0x0C,
            b'n' => 0x0A,
            b'r' => 0x0D,
            b't' => 0x09,
            b'u' => {
                let hex = body.get(j + 2..j + 6)?;
                if !hex.iter().all(u8::is_ascii_hexdigit) {
                    return None;
                }
                let unit = u16::from_str_radix(std::str::from_utf8(hex).ok()?, 16).ok()?;
                units.push(unit);
                j += 6;
                continue;
            }
            _ => return None,
        };
        units.push(unit);
        j += 2;
    }
    Some(units)
}

fn write_units(out: &mut Vec<u8>, units: &[u16]) {
    out.push(b'[');
    for (k, unit) in units.iter().enumerate() {
        if k > 0 {
            out.push(b',');
        }
        out.extend_from_slice(unit.to_string().as_bytes());
    }
    out.push(b']');
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn requests_decode_with_or_without_version() {
        let a = RequestEnvelope::decode(br#"{"op":"delete","id":4}"#, 1024).unwrap();
        assert_eq!(a.request, Request::Delete { id: ProxyId::new(4) });
        assert_eq!(a.schema_version, None);

        let b = RequestEnvelope::decode(
            br#"{"schema_version":"tabproxy.request@0.1.0","op":"call","id":2,"method":"getNumFields"}"#,
            1024,
        )
        .unwrap();
        assert_eq!(b.request.op_name(), "call");
    }

    #[test]
    fn wrong_version_and_oversized_requests_are_rejected() {
        let err = RequestEnvelope::decode(
            br#"{"schema_version":"tabproxy.request@9.0.0","op":"delete","id":1}"#,
            1024,
        )
        .unwrap_err();
        assert!(err.to_string().contains("unsupported schema_version"), "{err}");

        let err = RequestEnvelope::decode(br#"{"op":"delete","id":1}"#, 4).unwrap_err();
        assert!(matches!(err, DispatchError::BadRequest(_)));
    }

    #[test]
    fn unknown_op_is_a_bad_request() {
        let err = RequestEnvelope::decode(br#"{"op":"explode"}"#, 1024).unwrap_err();
        assert!(matches!(err, DispatchError::BadRequest(_)));
    }

    #[test]
    fn envelope_serializes_with_version() {
        let env = RequestEnvelope::new(Request::Delete { id: ProxyId::new(3) });
        assert_eq!(
            serde_json::to_value(&env).unwrap(),
            json!({"schema_version": TABPROXY_REQUEST_SCHEMA_VERSION, "op": "delete", "id": 3})
        );
    }

    #[test]
    fn responses_are_status_tagged() {
        let ok = Response::Ok {
            value: HostValue::Int(3),
        };
        assert_eq!(
            serde_json::from_slice::<serde_json::Value>(&ok.encode()).unwrap(),
            json!({"status": "ok", "value": {"int": 3}})
        );
        let decoded: Response = serde_json::from_slice(&ok.encode()).unwrap();
        assert!(decoded.is_ok());
    }

    #[test]
    fn lone_surrogate_escapes_survive_as_code_units() {
        let env = RequestEnvelope::decode(
            br#"{"op":"create","class":"C","args":{"Name":{"string":"a\ud800"}}}"#,
            1024,
        )
        .unwrap();
        let Request::Create { args, .. } = env.request else {
            panic!("expected create");
        };
        let name = args.string("Name").unwrap();
        assert_eq!(name.units(), &[0x61, 0xD800]);
        assert!(name.decode().is_err());
    }

    #[test]
    fn well_formed_escapes_are_left_to_serde() {
        let raw = br#"{"op":"create","class":"C","args":{"Name":{"string":"\ud83d\ude00 \"q\""}}}"#;
        assert!(matches!(lower_lone_surrogates(raw), Cow::Borrowed(_)));
        let env = RequestEnvelope::decode(raw, 1024).unwrap();
        let Request::Create { args, .. } = env.request else {
            panic!("expected create");
        };
        assert_eq!(args.string("Name").unwrap().decode().unwrap(), "\u{1F600} \"q\"");
    }

    #[test]
    fn lowering_rewrites_only_the_offending_literal() {
        let raw = br#"["x\n", "\udc00\t", "ok"]"#;
        assert_eq!(
            lower_lone_surrogates(raw).as_ref(),
            br#"["x\n", [56320,9], "ok"]"#
        );
    }
}
