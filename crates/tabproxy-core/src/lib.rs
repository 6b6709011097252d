//! Host-boundary plumbing shared by every tabproxy native class.
//!
//! - `encoding`: UTF-8 / UTF-16 conversion at the host boundary
//! - `registry`: the handle table that owns native objects on behalf of the host
//! - `value`: the host's tagged value model used for arguments and results
//! - `manager`: name-based class construction and method dispatch
//! - `envelope`: the JSON request/response frames used by the front-ends

pub mod encoding;
pub mod envelope;
pub mod error;
pub mod manager;
pub mod policy;
pub mod registry;
pub mod value;

pub use encoding::{from_host_text, to_host_text, EncodingDirection, EncodingError};
pub use envelope::{Request, RequestEnvelope, Response};
pub use error::{DispatchError, HostError};
pub use manager::{MakeFn, ProxyManager};
pub use policy::{env_bool, env_u32_nonzero, policy, Policy};
pub use registry::{Proxy, ProxyClass, ProxyId, ProxyRegistry, RegistryError};
pub use value::{HostArgs, HostString, HostValue};
