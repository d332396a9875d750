//! Service registry for late-bound collaborators.
//!
//! The [`ServiceRegistry`] maps a service type to a shared instance. Lookups
//! may happen before registration: [`resolve`](ServiceRegistry::resolve)
//! suspends until the service shows up.
//!
//! # Keys
//!
//! Services are keyed by their `Arc` type, so trait objects work directly:
//!
//! ```ignore
//! registry.register::<dyn EncounterManager>(Arc::new(level));
//! let level: Arc<dyn EncounterManager> = registry.resolve().await;
//! ```

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

use super::{Result, RuntimeError};

type Service = Box<dyn Any + Send + Sync>;

#[derive(Default)]
struct Inner {
    services: Mutex<HashMap<TypeId, Service>>,
    registered: Notify,
}

/// Type-keyed registry of shared services. Cloning shares the registry.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    inner: Arc<Inner>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn services(&self) -> MutexGuard<'_, HashMap<TypeId, Service>> {
        self.inner
            .services
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `service`, replacing any previous instance of `T`, and wakes
    /// pending resolvers.
    pub fn register<T>(&self, service: Arc<T>)
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services()
            .insert(TypeId::of::<Arc<T>>(), Box::new(service));
        tracing::debug!(target: "runtime::services", service = type_name::<T>(), "registered");
        self.inner.registered.notify_waiters();
    }

    /// Returns `T` if it is registered.
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services()
            .get(&TypeId::of::<Arc<T>>())
            .and_then(|service| service.downcast_ref::<Arc<T>>())
            .cloned()
    }

    pub fn contains<T>(&self) -> bool
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.services().contains_key(&TypeId::of::<Arc<T>>())
    }

    /// Waits until `T` is registered.
    pub async fn resolve<T>(&self) -> Arc<T>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        loop {
            // Arm the notification before checking so a registration between
            // the check and the await is not missed.
            let notified = self.inner.registered.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(service) = self.get::<T>() {
                return service;
            }
            tracing::trace!(
                target: "runtime::services",
                service = type_name::<T>(),
                "waiting for registration"
            );
            notified.await;
        }
    }

    /// [`resolve`](Self::resolve) with an upper bound on the wait.
    pub async fn resolve_timeout<T>(&self, timeout: Duration) -> Result<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        tokio::time::timeout(timeout, self.resolve::<T>())
            .await
            .map_err(|_| RuntimeError::ServiceTimeout {
                missing: vec![type_name::<T>()],
            })
    }
}
