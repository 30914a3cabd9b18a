//! In-process doubles for the transport and store seams.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use offgrid_core::{CacheDb, CacheStore, Error, Request, RequestIdentity, Response, Transport};

/// Transport answering from a fixed script keyed by URL.
///
/// Queued responses are served once each, in order, before the fixed
/// route. Unscripted URLs fail as unreachable.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, Result<Response, String>>>,
    queued: Mutex<HashMap<String, VecDeque<Response>>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self { delay: Some(delay), ..Self::default() }
    }

    pub fn respond(self, url: &str, status: u16, body: &str) -> Self {
        self.set(url, Ok(Response::new(status, vec![("content-type".into(), "text/plain".into())], body.to_string())));
        self
    }

    pub fn fail(self, url: &str) -> Self {
        self.set(url, Err(format!("{url}: connection refused")));
        self
    }

    pub fn set(&self, url: &str, outcome: Result<Response, String>) {
        self.routes.lock().unwrap().insert(url.to_string(), outcome);
    }

    /// Answer the next call to `url` with `response`, ahead of any fixed route.
    pub fn enqueue(&self, url: &str, response: Response) {
        self.queued.lock().unwrap().entry(url.to_string()).or_default().push_back(response);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request) -> Result<Response, Error> {
        let url = request.url().to_string();
        self.calls.lock().unwrap().push(url.clone());
        let queued = self.queued.lock().unwrap().get_mut(&url).and_then(VecDeque::pop_front);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let outcome = match queued {
            Some(response) => Some(Ok(response)),
            None => self.routes.lock().unwrap().get(&url).cloned(),
        };
        match outcome {
            Some(Ok(response)) => Ok(response.duplicate()),
            Some(Err(msg)) => Err(Error::NetworkFailure(msg)),
            None => Err(Error::NetworkFailure(format!("{url}: unreachable"))),
        }
    }
}

/// Store wrapper counting every read and write that reaches the backend.
pub struct SpyStore {
    inner: CacheDb,
    pub lookups: AtomicUsize,
    pub puts: AtomicUsize,
    pub fail_deletes: Mutex<BTreeSet<String>>,
    pub fail_lookups: AtomicBool,
}

impl SpyStore {
    pub async fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: CacheDb::open_in_memory().await.unwrap(),
            lookups: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
            fail_deletes: Mutex::new(BTreeSet::new()),
            fail_lookups: AtomicBool::new(false),
        })
    }

    pub fn touches(&self) -> usize {
        self.lookups.load(Ordering::SeqCst) + self.puts.load(Ordering::SeqCst)
    }

    pub fn db(&self) -> &CacheDb {
        &self.inner
    }
}

#[async_trait]
impl CacheStore for SpyStore {
    async fn open_bucket(&self, name: &str) -> Result<(), Error> {
        self.inner.open_bucket(name).await
    }

    async fn bucket_names(&self) -> Result<BTreeSet<String>, Error> {
        self.inner.bucket_names().await
    }

    async fn delete_bucket(&self, name: &str) -> Result<bool, Error> {
        if self.fail_deletes.lock().unwrap().contains(name) {
            return Err(Error::StoreFailure(format!("cannot delete {name}")));
        }
        self.inner.delete_bucket(name).await
    }

    async fn lookup(&self, bucket: &str, identity: &RequestIdentity) -> Result<Option<Response>, Error> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(Error::StoreFailure(format!("cannot read {bucket}")));
        }
        self.inner.lookup(bucket, identity).await
    }

    async fn put(&self, bucket: &str, identity: &RequestIdentity, response: &Response) -> Result<(), Error> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(bucket, identity, response).await
    }
}
