use once_cell::sync::OnceCell;

pub const ENV_STRICT_HANDLES: &str = "TABPROXY_STRICT_HANDLES";
pub const ENV_MAX_REQUEST_BYTES: &str = "TABPROXY_MAX_REQUEST_BYTES";

pub const DEFAULT_MAX_REQUEST_BYTES: u32 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Policy {
    /// Abort a session on fatal errors (unresolvable handle of the called object).
    pub strict_handles: bool,
    pub max_request_bytes: u32,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            strict_handles: false,
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
        }
    }
}

static POLICY: OnceCell<Policy> = OnceCell::new();

pub fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

pub fn env_u32_nonzero(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

pub fn load_policy() -> Policy {
    Policy {
        strict_handles: env_bool(ENV_STRICT_HANDLES, false),
        max_request_bytes: env_u32_nonzero(ENV_MAX_REQUEST_BYTES, DEFAULT_MAX_REQUEST_BYTES),
    }
}

/// Process policy, read from the environment on first use.
pub fn policy() -> &'static Policy {
    POLICY.get_or_init(load_policy)
}
