use std::sync::{Arc, Mutex};

use serde_json::Value;
use tracing::{debug, warn};

use super::{Entrypoint, EnvironmentConfig, EnvironmentError, NetworkFunction, NetworkRequest};
use crate::cache::{stable_signature, ResultCache};
use crate::check::{check, FetchPolicy};
use crate::gc::{garbage_collect, RetainedQuery, Retention};
use crate::normalize::{EncounteredIds, Normalizer};
use crate::pointer::{ReferenceCountedPointer, Teardown};
use crate::read::{
    read_data, read_data_tracked, DeferredComponent, FragmentReference, MissingData,
    ReadDataResult, ReadValue, TrackedRead,
};
use crate::selection::{SelectionNode, SelectionRegistry, Variables};
use crate::store::{EntityId, Store};
use crate::subscription::{NextChange, SubscriptionChannel, SubscriptionId};

/// Result of reading through the environment.
#[derive(Debug)]
pub enum ReadOutcome {
    Ready(ReadValue),
    /// Data is missing. Retry once `next_change` resolves.
    Pending {
        missing: MissingData,
        next_change: NextChange,
    },
}

impl ReadOutcome {
    pub fn ready(self) -> Option<ReadValue> {
        match self {
            ReadOutcome::Ready(value) => Some(value),
            ReadOutcome::Pending { .. } => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, ReadOutcome::Pending { .. })
    }
}

/// Everything a rendering layer talks to: the store, the computed
/// definitions, the change channel, the network and the query cache.
///
/// Clones share all of it.
#[derive(Clone)]
pub struct Environment {
    store: Store,
    registry: Arc<SelectionRegistry>,
    subscriptions: SubscriptionChannel,
    network: Arc<dyn NetworkFunction>,
    queries: ResultCache<FragmentReference>,
    retention: Arc<Mutex<Retention>>,
    config: EnvironmentConfig,
}

impl Environment {
    pub fn new<N>(registry: SelectionRegistry, network: N) -> Self
    where
        N: NetworkFunction + 'static,
    {
        Self::with_config(registry, network, EnvironmentConfig::default())
    }

    pub fn with_config<N>(registry: SelectionRegistry, network: N, config: EnvironmentConfig) -> Self
    where
        N: NetworkFunction + 'static,
    {
        Environment {
            store: Store::new(),
            registry: Arc::new(registry),
            subscriptions: SubscriptionChannel::new(),
            network: Arc::new(network),
            queries: ResultCache::new(),
            retention: Arc::new(Mutex::new(Retention::new(config.gc_buffer_size))),
            config,
        }
    }

    /// Use `store` instead of an empty one, e.g. one restored from a snapshot.
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = store;
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn registry(&self) -> &SelectionRegistry {
        &self.registry
    }

    pub fn subscriptions(&self) -> &SubscriptionChannel {
        &self.subscriptions
    }

    pub fn config(&self) -> &EnvironmentConfig {
        &self.config
    }

    /// Normalize `response` into the store, then notify every subscriber.
    pub fn write(
        &self,
        selections: &[SelectionNode],
        response: &serde_json::Map<String, Value>,
        variables: &Variables,
        root: &EntityId,
    ) -> Result<EncounteredIds, EnvironmentError> {
        let changed = self.normalize(selections, response, variables, root)?;
        self.subscriptions.notify(&changed)?;
        Ok(changed)
    }

    fn normalize(
        &self,
        selections: &[SelectionNode],
        response: &serde_json::Map<String, Value>,
        variables: &Variables,
        root: &EntityId,
    ) -> Result<EncounteredIds, EnvironmentError> {
        Ok(Normalizer::new(&self.registry, &self.config.id_field).normalize(
            &self.store,
            selections,
            response,
            variables,
            root,
        )?)
    }

    /// Read `fragment`, or get a handle that resolves on the next write if
    /// data is missing.
    pub fn read(&self, fragment: &FragmentReference) -> Result<ReadOutcome, EnvironmentError> {
        if let ReadDataResult::Success(value) = read_data(&self.store, &self.registry, fragment)? {
            return Ok(ReadOutcome::Ready(value));
        }

        // Register before reading again, so a write landing in between is
        // not missed.
        let next_change = self.subscriptions.on_next_change()?;
        match read_data(&self.store, &self.registry, fragment)? {
            ReadDataResult::Success(value) => Ok(ReadOutcome::Ready(value)),
            ReadDataResult::MissingData(missing) => Ok(ReadOutcome::Pending {
                missing,
                next_change,
            }),
        }
    }

    /// Run a deferred component: read its fragment and apply its transform.
    pub fn materialize(&self, component: &DeferredComponent) -> Result<ReadOutcome, EnvironmentError> {
        debug!(component = %component.name, root = %component.fragment.root, "environment.materialize");
        self.read(&component.fragment)
    }

    /// Call `callback` with the fragment's new result whenever a write changes
    /// a record the fragment depends on and the result differs from the last
    /// one delivered.
    pub fn subscribe_fragment<F>(
        &self,
        fragment: FragmentReference,
        callback: F,
    ) -> Result<SubscriptionId, EnvironmentError>
    where
        F: Fn(&ReadDataResult) + Send + Sync + 'static,
    {
        let last: Arc<Mutex<Option<TrackedRead>>> = Arc::new(Mutex::new(None));
        let store = self.store.clone();
        let registry = Arc::clone(&self.registry);
        let fragment = Arc::new(fragment);

        // Subscribe before the initial read, holding `last` so a write that
        // lands in between is compared against that read once it exists.
        let mut initial = last
            .lock()
            .map_err(|_| EnvironmentError::LockPoisoned("subscribe_fragment"))?;
        let shared = Arc::clone(&last);
        let watched = Arc::clone(&fragment);
        let id = self.subscriptions.subscribe(move |changed| {
            let Ok(mut last) = shared.lock() else {
                warn!("environment.fragment_subscription_poisoned");
                return;
            };
            let Some(previous) = last.as_mut() else {
                return;
            };
            if previous.encountered.is_disjoint(changed) {
                return;
            }
            match read_data_tracked(&store, &registry, &watched) {
                Ok(next) => {
                    let differs = next.result != previous.result;
                    *previous = next;
                    if differs {
                        callback(&previous.result);
                    }
                }
                Err(err) => warn!(error = %err, root = %watched.root, "environment.fragment_reread_failed"),
            }
        })?;

        match read_data_tracked(&self.store, &self.registry, &fragment) {
            Ok(read) => {
                *initial = Some(read);
                Ok(id)
            }
            Err(err) => {
                drop(initial);
                self.subscriptions.unsubscribe(id)?;
                Err(err.into())
            }
        }
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<bool, EnvironmentError> {
        Ok(self.subscriptions.unsubscribe(id)?)
    }

    /// Fetch with the configured default policy.
    pub fn load(
        &self,
        entrypoint: &Entrypoint,
        variables: Variables,
    ) -> Result<ReferenceCountedPointer<FragmentReference>, EnvironmentError> {
        self.fetch(entrypoint, variables, self.config.default_fetch_policy)
    }

    /// Make sure an entrypoint's data is in the store and retained, and return
    /// a handle onto the fragment that reads it.
    ///
    /// Identical requests (same query text and variables) share one network
    /// call and one handle group. The query stays retained until every handle
    /// is disposed.
    pub fn fetch(
        &self,
        entrypoint: &Entrypoint,
        variables: Variables,
        policy: FetchPolicy,
    ) -> Result<ReferenceCountedPointer<FragmentReference>, EnvironmentError> {
        let signature = stable_signature(&entrypoint.query_text, &variables);
        let mut changed = None;
        let lookup = self.queries.get_or_insert_with(&signature, || {
            changed = self.make_request(entrypoint, &variables, policy)?;
            let teardown = self.retain(RetainedQuery {
                root: EntityId::root(),
                selections: Arc::clone(&entrypoint.normalization),
                variables: variables.clone(),
            })?;
            Ok::<_, EnvironmentError>((entrypoint.fragment(variables.clone()), teardown))
        });

        // Subscribers may fetch this same signature, so they are notified
        // only once its slot is free again.
        if let Some(changed) = changed {
            self.subscriptions.notify(&changed)?;
        }
        let lookup = lookup?;

        debug!(entrypoint = %entrypoint.name, hit = lookup.hit, "environment.fetch");
        Ok(lookup.pointer)
    }

    /// Delete every record no retained or recently released query reaches.
    pub fn garbage_collect(&self) -> Result<usize, EnvironmentError> {
        let retention = self
            .retention
            .lock()
            .map_err(|_| EnvironmentError::LockPoisoned("garbage_collect"))?;
        Ok(garbage_collect(&self.store, &self.registry, retention.live_queries())?)
    }

    fn make_request(
        &self,
        entrypoint: &Entrypoint,
        variables: &Variables,
        policy: FetchPolicy,
    ) -> Result<Option<EncounteredIds>, EnvironmentError> {
        let should_fetch = match policy {
            FetchPolicy::Always => true,
            FetchPolicy::Never => false,
            FetchPolicy::IfNecessary => !check(
                &self.store,
                &self.registry,
                &entrypoint.normalization,
                variables,
                &EntityId::root(),
            )?
            .is_enough(),
        };
        if !should_fetch {
            debug!(entrypoint = %entrypoint.name, "environment.fetch_skipped");
            return Ok(None);
        }

        let request = NetworkRequest {
            query: entrypoint.query_text.clone(),
            variables: variables.clone(),
        };
        let response = self
            .network
            .execute(&request)
            .map_err(|err| EnvironmentError::Network(err.to_string()))?;

        let data = match response.data {
            Some(Value::Object(data)) => data,
            Some(_) => {
                return Err(EnvironmentError::InvalidResponse(
                    "data is not an object".to_string(),
                ))
            }
            None => {
                return Err(EnvironmentError::InvalidResponse(format!(
                    "no data, {} error(s)",
                    response.errors.len()
                )))
            }
        };
        if !response.errors.is_empty() {
            warn!(entrypoint = %entrypoint.name, errors = response.errors.len(), "environment.partial_response");
        }

        let changed = self.normalize(&entrypoint.normalization, &data, variables, &EntityId::root())?;
        Ok(Some(changed))
    }

    fn retain(&self, query: RetainedQuery) -> Result<Teardown, EnvironmentError> {
        let retention_id = self
            .retention
            .lock()
            .map_err(|_| EnvironmentError::LockPoisoned("retain"))?
            .retain(query);

        let retention = Arc::clone(&self.retention);
        let store = self.store.clone();
        let registry = Arc::clone(&self.registry);
        let collect_on_release = self.config.collect_on_release;

        Ok(Box::new(move || {
            let Ok(mut retention) = retention.lock() else {
                warn!(retention = retention_id, "environment.release_poisoned");
                return;
            };
            let overflowed = retention.release(retention_id);
            if overflowed && collect_on_release {
                if let Err(err) = garbage_collect(&store, &registry, retention.live_queries()) {
                    warn!(error = %err, "environment.collect_on_release_failed");
                }
            }
        }))
    }
}
