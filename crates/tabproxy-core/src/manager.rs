use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::envelope::{Request, RequestEnvelope, Response};
use crate::error::{DispatchError, HostError};
use crate::registry::{Proxy, ProxyId, ProxyRegistry};
use crate::value::{HostArgs, HostValue};

/// Class constructor: builds a native object from host arguments.
pub type MakeFn = fn(&HostArgs, &ProxyRegistry) -> Result<Arc<dyn Proxy>, HostError>;

/// Name-based front door for the host: constructs registered classes, routes
/// method calls to the object behind a handle and releases handles.
pub struct ProxyManager {
    registry: Arc<ProxyRegistry>,
    classes: HashMap<&'static str, MakeFn>,
}

impl ProxyManager {
    pub fn new(registry: Arc<ProxyRegistry>) -> Self {
        Self {
            registry,
            classes: HashMap::new(),
        }
    }

    pub fn register_class(&mut self, class: &'static str, make: MakeFn) {
        self.classes.insert(class, make);
    }

    #[must_use]
    pub fn with_class(mut self, class: &'static str, make: MakeFn) -> Self {
        self.register_class(class, make);
        self
    }

    pub fn registry(&self) -> &ProxyRegistry {
        &self.registry
    }

    pub fn create(&self, class: &str, args: &HostArgs) -> Result<ProxyId, HostError> {
        let make = self
            .classes
            .get(class)
            .ok_or_else(|| DispatchError::UnknownClass(class.to_string()))?;
        let proxy = make(args, self.registry())?;
        let id = self.registry.register_shared(proxy);
        debug!(%id, class, "created proxy");
        Ok(id)
    }

    pub fn call(&self, id: ProxyId, method: &str, args: &HostArgs) -> Result<HostValue, HostError> {
        // A dangling handle for the called object itself is fatal.
        let proxy = self
            .registry
            .get(id)
            .map_err(|e| HostError::from(e).into_fatal())?;
        trace!(%id, class = proxy.class_name(), method, "invoking proxy method");
        proxy.invoke(method, args, self.registry())
    }

    pub fn delete(&self, id: ProxyId) -> Result<(), HostError> {
        self.registry.release(id)?;
        Ok(())
    }

    pub fn handle(&self, request: Request) -> Response {
        let result = match &request {
            Request::Create { class, args } => self.create(class, args).map(HostValue::proxy_id),
            Request::Call { id, method, args } => self.call(*id, method, args),
            Request::Delete { id } => self.delete(*id).map(|()| HostValue::Bool(true)),
        };
        match result {
            Ok(value) => Response::Ok { value },
            Err(error) => {
                warn!(op = request.op_name(), id = %error.id, "request failed: {}", error.message);
                Response::Err { error }
            }
        }
    }

    /// Decode one JSON request, run it and encode the response.
    pub fn handle_json(&self, request: &[u8], max_request_bytes: u32) -> Vec<u8> {
        let response = match RequestEnvelope::decode(request, max_request_bytes) {
            Ok(envelope) => self.handle(envelope.request),
            Err(err) => Response::Err {
                error: HostError::from(err),
            },
        };
        response.encode()
    }
}
