use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::watch;

use crate::client::ClientError;
use crate::domain::{PageRequest, ResourceId, ResourceKind};

/// Composite identifier for a cached result. Page index and size are part
/// of the key, so every pagination variant is an independent entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    List {
        kind: ResourceKind,
        page: PageRequest,
    },
    ById {
        kind: ResourceKind,
        id: ResourceId,
    },
}

impl QueryKey {
    pub fn list(kind: ResourceKind, page: PageRequest) -> Self {
        Self::List { kind, page }
    }

    pub fn by_id(kind: ResourceKind, id: ResourceId) -> Self {
        Self::ById { kind, id }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::List { kind, .. } | Self::ById { kind, .. } => *kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    Fetching,
    Fresh,
    Stale,
    Error,
}

/// Last-known state of one cache entry as broadcast to subscribers.
///
/// After a failed refetch the previous data is kept alongside the error
/// so a view can keep rendering it; the status makes the failure visible.
#[derive(Debug, Clone)]
pub struct QuerySnapshot<V> {
    pub status: QueryStatus,
    pub data: Option<V>,
    pub error: Option<Arc<ClientError>>,
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<V> QuerySnapshot<V> {
    fn initial() -> Self {
        Self {
            status: QueryStatus::Fetching,
            data: None,
            error: None,
            fetched_at: None,
        }
    }
}

type FetchFuture<V> = Pin<Box<dyn Future<Output = Result<V, ClientError>> + Send>>;
type Fetcher<V> = Arc<dyn Fn() -> FetchFuture<V> + Send + Sync>;

struct Entry<V> {
    /// Sequence number handed to the most recently started fetch.
    issued: u64,
    /// Sequence number of the result currently applied.
    applied: u64,
    /// Results issued at or below this mark predate the last invalidation
    /// and are discarded on arrival.
    floor: u64,
    tx: watch::Sender<QuerySnapshot<V>>,
    fetcher: Fetcher<V>,
}

impl<V> Entry<V> {
    fn new(fetcher: Fetcher<V>) -> Self {
        let (tx, _rx) = watch::channel(QuerySnapshot::initial());
        Self {
            issued: 0,
            applied: 0,
            floor: 0,
            tx,
            fetcher,
        }
    }
}

/// Keyed store of last-known server responses with in-flight request
/// de-duplication: at most one fetch runs per key at any time.
///
/// The cache is an explicitly owned handle over shared state; clone it
/// and pass it to whoever needs it. Fetches run on spawned tasks, so all
/// methods must be called from within a Tokio runtime.
pub struct QueryCache<V> {
    entries: Arc<DashMap<QueryKey, Entry<V>>>,
}

impl<V> Clone for QueryCache<V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
        }
    }
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> QueryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }
}

impl<V> QueryCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Subscribe to a key. A missing, stale or errored entry triggers the
    /// fetch; an entry already being fetched attaches to the in-flight
    /// operation instead of issuing a duplicate request; a fresh entry is
    /// returned as-is. The fetcher is retained for refetch-on-invalidate.
    pub fn subscribe<F, Fut>(&self, key: QueryKey, fetch: F) -> Subscription<V>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ClientError>> + Send + 'static,
    {
        let fetcher: Fetcher<V> = Arc::new(move || Box::pin(fetch()));

        let mut created = false;
        let (rx, start) = {
            let mut entry = self.entries.entry(key).or_insert_with(|| {
                created = true;
                Entry::new(Arc::clone(&fetcher))
            });

            if !created {
                // Parameters are part of the key, so any fetcher handed in
                // for this key is interchangeable; keep the newest.
                entry.fetcher = Arc::clone(&fetcher);
            }

            let status = entry.tx.borrow().status;
            let needs_fetch =
                created || matches!(status, QueryStatus::Stale | QueryStatus::Error);

            let start = if needs_fetch {
                entry.issued += 1;
                entry
                    .tx
                    .send_modify(|snap| snap.status = QueryStatus::Fetching);
                Some((entry.issued, Arc::clone(&entry.fetcher)))
            } else {
                None
            };

            (entry.tx.subscribe(), start)
        };

        if let Some((seq, fetcher)) = start {
            self.spawn_fetch(key, seq, fetcher);
        }

        Subscription { rx }
    }

    /// Mark every entry matching the predicate stale. Entries with live
    /// subscribers are refetched immediately; the rest wait for the next
    /// subscribe. In-flight results issued before this call are
    /// superseded and will be discarded when they resolve.
    pub fn invalidate<P>(&self, predicate: P)
    where
        P: Fn(&QueryKey) -> bool,
    {
        let mut refetch = Vec::new();

        for mut entry in self.entries.iter_mut() {
            let key = *entry.key();
            if !predicate(&key) {
                continue;
            }

            let entry = entry.value_mut();
            entry.floor = entry.issued;

            if entry.tx.receiver_count() > 0 {
                entry.issued += 1;
                entry
                    .tx
                    .send_modify(|snap| snap.status = QueryStatus::Fetching);
                refetch.push((key, entry.issued, Arc::clone(&entry.fetcher)));
            } else {
                entry
                    .tx
                    .send_modify(|snap| snap.status = QueryStatus::Stale);
            }
        }

        tracing::debug!(refetching = refetch.len(), "invalidated cache entries");

        for (key, seq, fetcher) in refetch {
            self.spawn_fetch(key, seq, fetcher);
        }
    }

    /// Invalidate every entry for one resource kind, the conservative
    /// post-mutation policy: membership and totals of any page may shift.
    pub fn invalidate_kind(&self, kind: ResourceKind) {
        self.invalidate(|key| key.kind() == kind);
    }

    /// Current snapshot for a key without subscribing, if the entry exists.
    pub fn peek(&self, key: &QueryKey) -> Option<QuerySnapshot<V>> {
        self.entries.get(key).map(|entry| entry.tx.borrow().clone())
    }

    fn spawn_fetch(&self, key: QueryKey, seq: u64, fetcher: Fetcher<V>) {
        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            let result = fetcher().await;
            apply_fetch_result(&entries, key, seq, result);
        });
    }
}

/// Apply a resolved fetch to its entry, unless a later-issued fetch or an
/// invalidation has superseded it. This is the ordering rule: out-of-order
/// resolutions never overwrite a newer result.
fn apply_fetch_result<V>(
    entries: &DashMap<QueryKey, Entry<V>>,
    key: QueryKey,
    seq: u64,
    result: Result<V, ClientError>,
) {
    let Some(mut entry) = entries.get_mut(&key) else {
        return;
    };
    let entry = entry.value_mut();

    if seq <= entry.applied || seq <= entry.floor {
        tracing::debug!(?key, seq, "discarding superseded fetch result");
        return;
    }
    entry.applied = seq;

    match result {
        Ok(value) => {
            entry.tx.send_modify(|snap| {
                snap.status = QueryStatus::Fresh;
                snap.data = Some(value);
                snap.error = None;
                snap.fetched_at = Some(Utc::now());
            });
        }
        Err(error) => {
            tracing::warn!(?key, error = %error, "fetch failed");
            entry.tx.send_modify(|snap| {
                snap.status = QueryStatus::Error;
                snap.error = Some(Arc::new(error));
            });
        }
    }
}

/// Live view of one cache entry: the current snapshot plus updates as the
/// entry is refetched or invalidated. Dropping the subscription releases
/// the entry to lazy-refetch behavior on later invalidations.
pub struct Subscription<V> {
    rx: watch::Receiver<QuerySnapshot<V>>,
}

impl<V: Clone> Subscription<V> {
    pub fn current(&self) -> QuerySnapshot<V> {
        self.rx.borrow().clone()
    }

    /// Wait until the entry settles fresh or errored and return the
    /// outcome. Called again after an invalidation, this yields the
    /// refetched value.
    pub async fn settled(&mut self) -> Result<V, Arc<ClientError>> {
        loop {
            let snapshot = self.rx.borrow_and_update().clone();
            match snapshot.status {
                QueryStatus::Fresh => {
                    if let Some(data) = snapshot.data {
                        return Ok(data);
                    }
                }
                QueryStatus::Error => {
                    if let Some(error) = snapshot.error {
                        return Err(error);
                    }
                }
                QueryStatus::Fetching | QueryStatus::Stale => {}
            }

            if self.rx.changed().await.is_err() {
                // Cache dropped while we were waiting.
                return Err(Arc::new(ClientError::Transport(
                    "query cache was dropped".to_string(),
                )));
            }
        }
    }
}
