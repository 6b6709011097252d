use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use serde::{Deserialize, Serialize};
use tabproxy_contracts::{ERR_PROXY_TYPE_MISMATCH, ERR_UNKNOWN_PROXY_ID};
use thiserror::Error as ThisError;
use tracing::debug;

use crate::error::HostError;
use crate::value::{HostArgs, HostValue};

/// Opaque handle the host holds in place of a native object reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProxyId(u64);

impl ProxyId {
    /// Handle 0 is reserved as invalid and never issued.
    pub const INVALID: ProxyId = ProxyId(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A native object the host may address by handle. Implementors are immutable
/// once registered, so the registry hands out shared `Arc`s without locking the
/// object itself.
pub trait Proxy: Any + Send + Sync {
    fn class_name(&self) -> &'static str;

    /// Run a named method. Results that are themselves native objects are
    /// registered in `registry` and returned as handles.
    fn invoke(
        &self,
        method: &str,
        args: &HostArgs,
        registry: &ProxyRegistry,
    ) -> Result<HostValue, HostError>;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// Static class identity used for checked resolution.
pub trait ProxyClass: Proxy + Sized {
    const CLASS_NAME: &'static str;
}

#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum RegistryError {
    #[error("no proxy with id {0} (unknown or already released)")]
    NotFound(ProxyId),

    #[error("proxy {id} is a '{actual}', expected a '{expected}'")]
    TypeMismatch {
        id: ProxyId,
        expected: &'static str,
        actual: &'static str,
    },
}

impl RegistryError {
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::NotFound(_) => ERR_UNKNOWN_PROXY_ID,
            Self::TypeMismatch { .. } => ERR_PROXY_TYPE_MISMATCH,
        }
    }
}

impl From<RegistryError> for HostError {
    fn from(err: RegistryError) -> Self {
        Self::new(err.identifier(), err.to_string())
    }
}

struct ProxyTable {
    entries: HashMap<ProxyId, Arc<dyn Proxy>>,
    next: u64,
}

impl ProxyTable {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            // Handle 0 reserved as invalid.
            next: 1,
        }
    }

    fn insert(&mut self, proxy: Arc<dyn Proxy>) -> ProxyId {
        // Monotonic assignment: released handles are never handed out again.
        let id = ProxyId(self.next);
        self.next += 1;
        self.entries.insert(id, proxy);
        id
    }

    fn get(&self, id: ProxyId) -> Option<&Arc<dyn Proxy>> {
        self.entries.get(&id)
    }
}

/// Table mapping handles to shared ownership of native objects. Each operation
/// takes the lock once; objects are cloned out as `Arc`s so no lock is held
/// while a proxy method runs.
pub struct ProxyRegistry {
    table: Mutex<ProxyTable>,
}

static GLOBAL: OnceLock<Arc<ProxyRegistry>> = OnceLock::new();

impl Default for ProxyRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ProxyRegistry {
    pub fn new() -> Self {
        Self {
            table: Mutex::new(ProxyTable::new()),
        }
    }

    /// The process-wide registry used by the C ABI.
    pub fn global() -> Arc<ProxyRegistry> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ProxyRegistry::new())))
    }

    // Every operation leaves the table consistent, so a poisoned lock is safe to reuse.
    fn lock(&self) -> MutexGuard<'_, ProxyTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take ownership of `proxy` and issue a fresh handle for it.
    pub fn register<P: Proxy>(&self, proxy: P) -> ProxyId {
        self.register_shared(Arc::new(proxy))
    }

    /// Register an object the caller already shares.
    pub fn register_shared(&self, proxy: Arc<dyn Proxy>) -> ProxyId {
        let class = proxy.class_name();
        let id = self.lock().insert(proxy);
        debug!(%id, class, "registered proxy");
        id
    }

    /// Untyped lookup, used by dispatch.
    pub fn get(&self, id: ProxyId) -> Result<Arc<dyn Proxy>, RegistryError> {
        self.lock()
            .get(id)
            .cloned()
            .ok_or(RegistryError::NotFound(id))
    }

    /// Typed lookup. Fails with `TypeMismatch` if the handle names another class.
    pub fn resolve<T: ProxyClass>(&self, id: ProxyId) -> Result<Arc<T>, RegistryError> {
        let proxy = self.get(id)?;
        let actual = proxy.class_name();
        proxy
            .into_any()
            .downcast::<T>()
            .map_err(|_| RegistryError::TypeMismatch {
                id,
                expected: T::CLASS_NAME,
                actual,
            })
    }

    /// Remove the mapping. Releasing twice reports `NotFound` the second time.
    pub fn release(&self, id: ProxyId) -> Result<(), RegistryError> {
        let removed = self.lock().entries.remove(&id);
        match removed {
            Some(proxy) => {
                debug!(%id, class = proxy.class_name(), "released proxy");
                // Dropped outside the lock.
                drop(proxy);
                Ok(())
            }
            None => Err(RegistryError::NotFound(id)),
        }
    }

    pub fn contains(&self, id: ProxyId) -> bool {
        self.lock().get(id).is_some()
    }

    pub fn class_of(&self, id: ProxyId) -> Option<&'static str> {
        self.lock().get(id).map(|p| p.class_name())
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DispatchError;
    use std::thread;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    impl Proxy for Counter {
        fn class_name(&self) -> &'static str {
            Self::CLASS_NAME
        }

        fn invoke(
            &self,
            method: &str,
            _args: &HostArgs,
            _registry: &ProxyRegistry,
        ) -> Result<HostValue, HostError> {
            match method {
                "get" => Ok(HostValue::Int(i64::from(self.0))),
                _ => Err(DispatchError::UnknownMethod {
                    class: Self::CLASS_NAME,
                    method: method.to_string(),
                }
                .into()),
            }
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    impl ProxyClass for Counter {
        const CLASS_NAME: &'static str = "test.Counter";
    }

    struct Label;

    impl Proxy for Label {
        fn class_name(&self) -> &'static str {
            Self::CLASS_NAME
        }

        fn invoke(
            &self,
            _method: &str,
            _args: &HostArgs,
            _registry: &ProxyRegistry,
        ) -> Result<HostValue, HostError> {
            Ok(HostValue::Bool(true))
        }

        fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
            self
        }
    }

    impl ProxyClass for Label {
        const CLASS_NAME: &'static str = "test.Label";
    }

    #[test]
    fn register_then_resolve_returns_the_same_object() {
        let registry = ProxyRegistry::new();
        let id = registry.register(Counter(7));
        assert_ne!(id, ProxyId::INVALID);
        assert_eq!(*registry.resolve::<Counter>(id).unwrap(), Counter(7));
        assert_eq!(registry.class_of(id), Some("test.Counter"));
    }

    #[test]
    fn released_handles_stop_resolving() {
        let registry = ProxyRegistry::new();
        let id = registry.register(Counter(1));
        registry.release(id).unwrap();
        assert_eq!(
            registry.resolve::<Counter>(id).unwrap_err(),
            RegistryError::NotFound(id)
        );
        assert_eq!(registry.release(id).unwrap_err(), RegistryError::NotFound(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn handles_are_monotonic_and_never_reused() {
        let registry = ProxyRegistry::new();
        let a = registry.register(Counter(1));
        registry.release(a).unwrap();
        let b = registry.register(Counter(2));
        assert!(b > a);
        assert!(registry.get(ProxyId::INVALID).is_err());
    }

    #[test]
    fn wrong_class_is_a_type_mismatch() {
        let registry = ProxyRegistry::new();
        let id = registry.register(Label);
        let err = registry.resolve::<Counter>(id).unwrap_err();
        assert_eq!(
            err,
            RegistryError::TypeMismatch {
                id,
                expected: "test.Counter",
                actual: "test.Label",
            }
        );
        let host: HostError = err.into();
        assert_eq!(host.id, ERR_PROXY_TYPE_MISMATCH);
        // the object is untouched by a failed typed lookup
        assert!(registry.contains(id));
    }

    #[test]
    fn equal_values_get_independent_handles() {
        let registry = ProxyRegistry::new();
        let a = registry.register(Counter(3));
        let b = registry.register(Counter(3));
        assert_ne!(a, b);
        registry.release(a).unwrap();
        assert_eq!(*registry.resolve::<Counter>(b).unwrap(), Counter(3));
    }

    #[test]
    fn global_registry_is_a_single_instance() {
        let a = ProxyRegistry::global();
        let b = ProxyRegistry::global();
        assert!(Arc::ptr_eq(&a, &b));
        let id = a.register(Counter(9));
        assert!(b.contains(id));
        b.release(id).unwrap();
    }

    #[test]
    fn concurrent_register_and_resolve() {
        let registry = Arc::new(ProxyRegistry::new());
        let workers: Vec<_> = (0..8)
            .map(|t| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    let mut ids = Vec::new();
                    for i in 0..100 {
                        let id = registry.register(Counter(t * 1000 + i));
                        assert_eq!(registry.resolve::<Counter>(id).unwrap().0, t * 1000 + i);
                        ids.push(id);
                    }
                    for id in ids.iter().step_by(2) {
                        registry.release(*id).unwrap();
                    }
                    ids
                })
            })
            .collect();

        let mut all = Vec::new();
        for w in workers {
            all.extend(w.join().unwrap());
        }
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 800);
        assert_eq!(registry.len(), 400);
    }
}
