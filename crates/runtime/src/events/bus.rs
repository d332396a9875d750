//! Type-keyed event bus with global and entity scopes.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use runner_core::EntityId;

/// Marker for values that can travel over the bus.
pub trait Event: Any + Send + Sync {}

impl<T: Any + Send + Sync> Event for T {}

/// Channel a value is published on.
///
/// Entity scopes are distinct from the global scope and from each other: a
/// handler subscribed to `Entity(a)` never sees events published on
/// `Entity(b)` or `Global`.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub enum Scope {
    Global,
    Entity(EntityId),
}

type Payload = Arc<dyn Any + Send + Sync>;
type SyncHandler = Arc<dyn Fn(&(dyn Any + Send + Sync)) + Send + Sync>;
type AsyncHandler = Arc<dyn Fn(Payload) -> Option<BoxFuture<'static, ()>> + Send + Sync>;
type Key = (Scope, TypeId);

#[derive(Clone)]
enum Handler {
    Sync(SyncHandler),
    Async(AsyncHandler),
}

struct Entry {
    id: u64,
    handler: Handler,
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    handlers: Mutex<HashMap<Key, Vec<Entry>>>,
    sticky: Mutex<HashMap<Key, Payload>>,
}

impl Inner {
    fn handlers(&self) -> MutexGuard<'_, HashMap<Key, Vec<Entry>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sticky(&self) -> MutexGuard<'_, HashMap<Key, Payload>> {
        self.sticky.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remove(&self, key: &Key, id: u64) {
        let mut handlers = self.handlers();
        if let Some(entries) = handlers.get_mut(key) {
            entries.retain(|entry| entry.id != id);
            if entries.is_empty() {
                handlers.remove(key);
            }
        }
    }
}

/// Typed publish/subscribe bus.
///
/// Handlers are keyed by `(Scope, event type)`. Sync handlers run inline
/// during [`publish`](Self::publish); async handlers are spawned by
/// `publish` and awaited by [`publish_async`](Self::publish_async).
///
/// The handler list is snapshotted before dispatch, so handlers may publish,
/// subscribe or drop subscriptions without deadlocking. A handler added
/// during a publish does not see that publish.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sync handler for `T` on `scope`.
    pub fn subscribe<T, F>(&self, scope: Scope, handler: F) -> Subscription
    where
        T: Event,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let handler: SyncHandler = Arc::new(move |payload: &(dyn Any + Send + Sync)| {
            if let Some(event) = payload.downcast_ref::<T>() {
                handler(event);
            }
        });
        self.insert::<T>(scope, Handler::Sync(handler))
    }

    /// Like [`subscribe`](Self::subscribe), then immediately replays the last
    /// sticky `T` on `scope` to the new handler, if one was published.
    pub fn subscribe_sticky<T, F>(&self, scope: Scope, handler: F) -> Subscription
    where
        T: Event,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let handler = Arc::new(handler);
        let forward = Arc::clone(&handler);
        let subscription = self.subscribe::<T, _>(scope, move |event| forward(event));

        if let Some(event) = self.sticky::<T>(scope) {
            handler(event.as_ref());
        }
        subscription
    }

    /// Registers a handler that suspends. `publish_async` waits for it.
    pub fn subscribe_async<T, F, Fut>(&self, scope: Scope, handler: F) -> Subscription
    where
        T: Event,
        F: Fn(Arc<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler: AsyncHandler = Arc::new(move |payload: Payload| {
            payload
                .downcast::<T>()
                .ok()
                .map(|event| handler(event).boxed())
        });
        self.insert::<T>(scope, Handler::Async(handler))
    }

    /// Delivers `event` to every handler on `scope`.
    ///
    /// Sync handlers have all run when this returns. Async handlers are
    /// spawned onto the current tokio runtime and not awaited.
    pub fn publish<T: Event>(&self, scope: Scope, event: T) {
        let payload: Payload = Arc::new(event);
        let pending = self.dispatch::<T>(scope, &payload);
        spawn_all::<T>(pending);
    }

    /// Delivers `event` and completes once every handler, including
    /// suspending ones, has finished.
    pub async fn publish_async<T: Event>(&self, scope: Scope, event: T) {
        let payload: Payload = Arc::new(event);
        let pending = self.dispatch::<T>(scope, &payload);
        if !pending.is_empty() {
            join_all(pending).await;
        }
    }

    /// Stores `event` as the latest sticky `T` on `scope`, then publishes it.
    pub fn publish_sticky<T: Event>(&self, scope: Scope, event: T) {
        let payload: Payload = Arc::new(event);
        self.inner
            .sticky()
            .insert((scope, TypeId::of::<T>()), Arc::clone(&payload));
        let pending = self.dispatch::<T>(scope, &payload);
        spawn_all::<T>(pending);
    }

    /// Latest sticky `T` published on `scope`.
    pub fn sticky<T: Event>(&self, scope: Scope) -> Option<Arc<T>> {
        self.inner
            .sticky()
            .get(&(scope, TypeId::of::<T>()))
            .cloned()
            .and_then(|payload| payload.downcast::<T>().ok())
    }

    /// Drops every handler and sticky value attached to `scope`.
    ///
    /// Used when the owning entity is destroyed. Outstanding [`Subscription`]s
    /// for the scope become no-ops.
    pub fn close_scope(&self, scope: Scope) {
        let removed: usize = {
            let mut handlers = self.inner.handlers();
            let keys: Vec<Key> = handlers.keys().filter(|(s, _)| *s == scope).copied().collect();
            keys.iter()
                .filter_map(|key| handlers.remove(key))
                .map(|entries| entries.len())
                .sum()
        };
        self.inner.sticky().retain(|(s, _), _| *s != scope);
        tracing::debug!(target: "runtime::bus", ?scope, removed, "closed scope");
    }

    /// Number of live handlers for `T` on `scope`.
    pub fn subscriber_count<T: Event>(&self, scope: Scope) -> usize {
        self.inner
            .handlers()
            .get(&(scope, TypeId::of::<T>()))
            .map_or(0, Vec::len)
    }

    fn insert<T: Event>(&self, scope: Scope, handler: Handler) -> Subscription {
        let key = (scope, TypeId::of::<T>());
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers()
            .entry(key)
            .or_default()
            .push(Entry { id, handler });

        Subscription {
            bus: Arc::downgrade(&self.inner),
            key,
            id,
        }
    }

    /// Runs sync handlers and returns the futures of async ones.
    fn dispatch<T: Event>(&self, scope: Scope, payload: &Payload) -> Vec<BoxFuture<'static, ()>> {
        let handlers: Vec<Handler> = self
            .inner
            .handlers()
            .get(&(scope, TypeId::of::<T>()))
            .map(|entries| entries.iter().map(|entry| entry.handler.clone()).collect())
            .unwrap_or_default();

        if handlers.is_empty() {
            tracing::trace!(
                target: "runtime::bus",
                ?scope,
                event = std::any::type_name::<T>(),
                "no subscribers"
            );
            return Vec::new();
        }

        let mut pending = Vec::new();
        for handler in handlers {
            match handler {
                Handler::Sync(handler) => handler(payload.as_ref()),
                Handler::Async(handler) => pending.extend(handler(Arc::clone(payload))),
            }
        }
        pending
    }
}

fn spawn_all<T>(pending: Vec<BoxFuture<'static, ()>>) {
    if pending.is_empty() {
        return;
    }
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            for future in pending {
                runtime.spawn(future);
            }
        }
        Err(_) => {
            tracing::warn!(
                target: "runtime::bus",
                event = std::any::type_name::<T>(),
                dropped = pending.len(),
                "async handlers published outside a tokio runtime"
            );
        }
    }
}

/// Live registration on an [`EventBus`]. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    bus: Weak<Inner>,
    key: Key,
    id: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(&self.key, self.id);
        }
    }
}

/// Subscriptions owned by one component, revoked together.
#[derive(Default)]
pub struct SubscriptionSet {
    subscriptions: Vec<Subscription>,
}

impl SubscriptionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Revokes every subscription in the set.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Ping(u32);

    #[derive(Debug, Clone, PartialEq)]
    struct Pong(u32);

    fn recorder<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |event: &T| sink.lock().unwrap().push(event.clone()))
    }

    #[test]
    fn delivers_by_type() {
        let bus = EventBus::new();
        let (pings, on_ping) = recorder::<Ping>();
        let _sub = bus.subscribe::<Ping, _>(Scope::Global, on_ping);

        bus.publish(Scope::Global, Ping(1));
        bus.publish(Scope::Global, Pong(2));

        assert_eq!(*pings.lock().unwrap(), vec![Ping(1)]);
    }

    #[test]
    fn scopes_are_distinct_channels() {
        let bus = EventBus::new();
        let (global, on_global) = recorder::<Ping>();
        let (entity, on_entity) = recorder::<Ping>();
        let _a = bus.subscribe::<Ping, _>(Scope::Global, on_global);
        let _b = bus.subscribe::<Ping, _>(Scope::Entity(EntityId(7)), on_entity);

        bus.publish(Scope::Entity(EntityId(7)), Ping(1));
        bus.publish(Scope::Entity(EntityId(8)), Ping(2));
        bus.publish(Scope::Global, Ping(3));

        assert_eq!(*global.lock().unwrap(), vec![Ping(3)]);
        assert_eq!(*entity.lock().unwrap(), vec![Ping(1)]);
    }

    #[test]
    fn dropping_subscription_revokes_it() {
        let bus = EventBus::new();
        let (pings, on_ping) = recorder::<Ping>();
        let sub = bus.subscribe::<Ping, _>(Scope::Global, on_ping);
        bus.publish(Scope::Global, Ping(1));
        drop(sub);
        bus.publish(Scope::Global, Ping(2));

        assert_eq!(*pings.lock().unwrap(), vec![Ping(1)]);
        assert_eq!(bus.subscriber_count::<Ping>(Scope::Global), 0);
    }

    #[test]
    fn sticky_value_reaches_late_subscribers() {
        let bus = EventBus::new();
        let scope = Scope::Entity(EntityId(1));
        bus.publish_sticky(scope, Ping(1));
        bus.publish_sticky(scope, Ping(2));

        let (late, on_late) = recorder::<Ping>();
        let _sub = bus.subscribe_sticky::<Ping, _>(scope, on_late);
        bus.publish(scope, Ping(3));

        assert_eq!(*late.lock().unwrap(), vec![Ping(2), Ping(3)]);
        // Plain subscribers do not get the replay.
        let (plain, on_plain) = recorder::<Ping>();
        let _plain = bus.subscribe::<Ping, _>(scope, on_plain);
        assert!(plain.lock().unwrap().is_empty());
    }

    #[test]
    fn close_scope_drops_handlers_and_sticky() {
        let bus = EventBus::new();
        let scope = Scope::Entity(EntityId(3));
        let (pings, on_ping) = recorder::<Ping>();
        let sub = bus.subscribe::<Ping, _>(scope, on_ping);
        bus.publish_sticky(scope, Ping(1));

        bus.close_scope(scope);
        bus.publish(scope, Ping(2));
        drop(sub);

        assert_eq!(*pings.lock().unwrap(), vec![Ping(1)]);
        assert!(bus.sticky::<Ping>(scope).is_none());
    }

    #[test]
    fn handlers_may_publish_reentrantly() {
        let bus = EventBus::new();
        let (pongs, on_pong) = recorder::<Pong>();
        let _pong = bus.subscribe::<Pong, _>(Scope::Global, on_pong);
        let relay = bus.clone();
        let _ping = bus.subscribe::<Ping, _>(Scope::Global, move |ping: &Ping| {
            relay.publish(Scope::Global, Pong(ping.0 * 10));
        });

        bus.publish(Scope::Global, Ping(4));

        assert_eq!(*pongs.lock().unwrap(), vec![Pong(40)]);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_async_waits_for_suspending_handlers() {
        let bus = EventBus::new();
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let _slow = bus.subscribe_async::<Ping, _, _>(Scope::Global, move |_event| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        let sync_counter = Arc::clone(&done);
        let _fast = bus.subscribe::<Ping, _>(Scope::Global, move |_: &Ping| {
            sync_counter.fetch_add(1, Ordering::SeqCst);
        });

        bus.publish_async(Scope::Global, Ping(1)).await;

        assert_eq!(done.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn publish_spawns_async_handlers_without_waiting() {
        let bus = EventBus::new();
        let done = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&done);
        let _slow = bus.subscribe_async::<Ping, _, _>(Scope::Global, move |_event| {
            let counter = Arc::clone(&counter);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        bus.publish(Scope::Global, Ping(1));
        assert_eq!(done.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(done.load(Ordering::SeqCst), 1);
    }
}
