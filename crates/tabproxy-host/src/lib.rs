//! NDJSON session runner: one request per input line, one response per output line.

use std::io::{self, BufRead, Read, Write};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tabproxy_contracts::TABPROXY_HOST_REPORT_SCHEMA_VERSION;
use tabproxy_core::{policy, HostError, ProxyManager, RequestEnvelope, Response};
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Stop at the first fatal error instead of reporting it and going on.
    pub strict_handles: bool,
    pub max_request_bytes: u32,
}

impl SessionConfig {
    /// Defaults from the process environment.
    pub fn from_env() -> Self {
        let p = policy();
        Self {
            strict_handles: p.strict_handles,
            max_request_bytes: p.max_request_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionReport {
    pub schema_version: String,
    pub requests: u64,
    pub ok: u64,
    pub errors: u64,
    /// Set when strict mode stopped the session on a fatal error.
    pub aborted: Option<HostError>,
    /// Handles the host never released.
    pub live_handles: usize,
}

impl SessionReport {
    fn new() -> Self {
        Self {
            schema_version: TABPROXY_HOST_REPORT_SCHEMA_VERSION.to_string(),
            requests: 0,
            ok: 0,
            errors: 0,
            aborted: None,
            live_handles: 0,
        }
    }

    pub fn exit_code(&self) -> u8 {
        if self.aborted.is_some() {
            2
        } else {
            0
        }
    }
}

pub fn handle_line(manager: &ProxyManager, line: &[u8], config: &SessionConfig) -> Response {
    match RequestEnvelope::decode(line, config.max_request_bytes) {
        Ok(envelope) => manager.handle(envelope.request),
        Err(err) => Response::Err {
            error: HostError::from(err),
        },
    }
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    output.write_all(&response.encode())?;
    output.write_all(b"\n")?;
    output.flush()
}

/// Read one request line into `buf`, without its line terminator.
///
/// An overlong line is cut just past `limit` bytes, which still fails the size
/// check in `RequestEnvelope::decode`, and its tail is skipped unbuffered.
/// Returns `false` at EOF.
fn read_request<R: BufRead>(input: &mut R, limit: u32, buf: &mut Vec<u8>) -> io::Result<bool> {
    buf.clear();
    let cap = u64::from(limit) + 1;
    let n = input.by_ref().take(cap + 1).read_until(b'\n', buf)?;
    if n == 0 {
        return Ok(false);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
    } else if buf.len() as u64 > cap {
        skip_line(input)?;
    }
    if buf.last() == Some(&b'\r') {
        buf.pop();
    }
    Ok(true)
}

fn skip_line<R: BufRead>(input: &mut R) -> io::Result<()> {
    loop {
        let available = input.fill_buf()?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|&b| b == b'\n') {
            Some(i) => {
                input.consume(i + 1);
                return Ok(());
            }
            None => {
                let n = available.len();
                input.consume(n);
            }
        }
    }
}

/// Run requests from `input` until EOF (or a fatal error in strict mode).
/// Blank lines are skipped. Lines that are not valid requests, including
/// non-UTF-8 and oversized ones, are answered with `BadRequest`.
pub fn run_session<R: BufRead, W: Write>(
    manager: &ProxyManager,
    mut input: R,
    mut output: W,
    config: &SessionConfig,
) -> Result<SessionReport> {
    let mut report = SessionReport::new();
    let mut line = Vec::new();
    let mut lineno = 0u64;

    while read_request(&mut input, config.max_request_bytes, &mut line)
        .with_context(|| format!("read request line {}", lineno + 1))?
    {
        lineno += 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        report.requests += 1;

        let response = handle_line(manager, &line, config);
        write_response(&mut output, &response).context("write response")?;

        match response {
            Response::Ok { .. } => report.ok += 1,
            Response::Err { error } => {
                report.errors += 1;
                if error.is_fatal() && config.strict_handles {
                    error!(line = lineno, id = %error.id, "aborting session: {}", error.message);
                    report.aborted = Some(error);
                    break;
                }
            }
        }
    }

    report.live_handles = manager.registry().len();
    debug!(
        requests = report.requests,
        errors = report.errors,
        live_handles = report.live_handles,
        "session finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tabproxy_core::ProxyRegistry;

    fn config(strict_handles: bool) -> SessionConfig {
        SessionConfig {
            strict_handles,
            max_request_bytes: 4096,
        }
    }

    #[test]
    fn oversized_line_is_a_bad_request() {
        let manager = tabproxy_tabular::new_manager(Arc::new(ProxyRegistry::new()));
        let line = vec![b' '; 5000];
        let resp = handle_line(&manager, &line, &config(false));
        let Response::Err { error } = resp else {
            panic!("expected an error");
        };
        assert_eq!(error.id, tabproxy_contracts::ERR_BAD_REQUEST);
    }

    #[test]
    fn exit_code_reflects_abort() {
        let mut report = SessionReport::new();
        assert_eq!(report.exit_code(), 0);
        report.aborted = Some(HostError::internal("x").into_fatal());
        assert_eq!(report.exit_code(), 2);
    }
}
