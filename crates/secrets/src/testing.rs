//! In-memory fetch capabilities for unit tests

use crate::{FetchError, ParameterFetcher, SecretError, SecretFetcher, StoreClients, StoreConnector};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Script = Arc<Mutex<VecDeque<Result<Option<String>, FetchError>>>>;

/// Replays scripted responses and records every requested name.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    responses: Script,
    calls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedStore {
    pub fn with(responses: Vec<Result<Option<String>, FetchError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into())),
            calls: Arc::default(),
        }
    }

    fn next(&self, name: &str) -> Result<Option<String>, FetchError> {
        self.calls.lock().unwrap().push(name.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(FetchError::service("script exhausted")))
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretFetcher for ScriptedStore {
    async fn fetch_secret(&self, name: &str) -> Result<Option<String>, FetchError> {
        self.next(name)
    }
}

#[async_trait]
impl ParameterFetcher for ScriptedStore {
    async fn fetch_parameter(&self, path: &str) -> Result<Option<String>, FetchError> {
        self.next(path)
    }
}

pub fn clients(secrets: &ScriptedStore, parameters: &ScriptedStore) -> StoreClients {
    StoreClients::new(secrets.clone(), parameters.clone())
}

/// Fixed name -> value store; unknown names fail with a service error.
#[derive(Clone, Default)]
pub struct MapStore {
    values: Arc<HashMap<String, String>>,
    calls: Arc<AtomicUsize>,
}

impl MapStore {
    pub fn new<const N: usize>(values: [(&str, &str); N]) -> Self {
        Self {
            values: Arc::new(
                values
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            calls: Arc::default(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup(&self, name: &str) -> Result<Option<String>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.values
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| FetchError::service(format!("ResourceNotFoundException: {name}")))
    }
}

#[async_trait]
impl SecretFetcher for MapStore {
    async fn fetch_secret(&self, name: &str) -> Result<Option<String>, FetchError> {
        self.lookup(name)
    }
}

#[async_trait]
impl ParameterFetcher for MapStore {
    async fn fetch_parameter(&self, path: &str) -> Result<Option<String>, FetchError> {
        self.lookup(path)
    }
}

/// Connector handing out [`MapStore`] clients and counting connections.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub store: MapStore,
    pub fail: bool,
    connects: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new(store: MapStore) -> Self {
        Self {
            store,
            fail: false,
            connects: Arc::default(),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for FakeConnector {
    async fn connect(&self) -> Result<StoreClients, SecretError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SecretError::ClientInit {
                message: "no credentials".to_string(),
            });
        }
        Ok(StoreClients::new(self.store.clone(), self.store.clone()))
    }
}
