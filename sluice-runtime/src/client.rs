//! Contract with the remote system a sink writes into.
//!
//! The core never speaks a wire protocol itself. Adapter crates implement
//! [`ClientFactory`] and [`RemoteClient`] for a concrete system; the pool and
//! the invocation lifecycle only use the operations below.

use crate::error::RemoteError;
use async_trait::async_trait;
use serde_json::{Map, Value};
use sluice_model::FlattenedField;
use std::collections::BTreeMap;

/// One record submitted as a single write.
pub type Record = Map<String, Value>;

/// How to reach the remote system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectConfig {
    pub uri: String,
    pub token: Option<String>,
}

/// A namespace (database) to create before any collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSpec {
    pub name: String,
    pub properties: BTreeMap<String, String>,
}

/// A collection laid out after a flattened schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub fields: Vec<FlattenedField>,
}

/// A live connection to the remote system.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Returns [`RemoteError::AlreadyExists`] if the namespace exists.
    async fn create_namespace(&self, spec: &NamespaceSpec) -> Result<(), RemoteError>;

    async fn use_namespace(&mut self, name: &str) -> Result<(), RemoteError>;

    /// Returns [`RemoteError::AlreadyExists`] if the collection exists.
    async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), RemoteError>;

    async fn insert(&self, collection: &str, record: Record) -> Result<(), RemoteError>;

    /// Unloads a collection from the remote's serving memory.
    async fn release_collection(&self, collection: &str) -> Result<(), RemoteError>;

    async fn close(&mut self) -> Result<(), RemoteError>;
}

/// Opens new clients for a pool.
#[async_trait]
pub trait ClientFactory: Send + Sync + 'static {
    type Client: RemoteClient + 'static;

    async fn connect(&self, config: &ConnectConfig) -> Result<Self::Client, RemoteError>;
}

/// In-memory client for testing. Every call is appended to a shared journal.
pub mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    /// A recorded client call.
    #[derive(Debug, Clone, PartialEq)]
    pub enum Call {
        Connect { client: u64, uri: String },
        CreateNamespace(String),
        UseNamespace(String),
        CreateCollection(CollectionSpec),
        Insert { collection: String, record: Record },
        ReleaseCollection(String),
        Close { client: u64 },
    }

    /// Shared, ordered call log.
    #[derive(Debug, Clone, Default)]
    pub struct Journal(Arc<Mutex<Vec<Call>>>);

    impl Journal {
        fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
            self.0.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn push(&self, call: Call) {
            self.lock().push(call);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.lock().clone()
        }

        pub fn connects(&self) -> usize {
            self.count(|c| matches!(c, Call::Connect { .. }))
        }

        pub fn closes(&self) -> usize {
            self.count(|c| matches!(c, Call::Close { .. }))
        }

        pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
            self.lock().iter().filter(|c| predicate(c)).count()
        }
    }

    /// Toggles that make the next calls fail.
    #[derive(Debug, Default)]
    pub struct Faults {
        pub refuse_connect: AtomicBool,
        /// Connection attempts never complete.
        pub hang_connect: AtomicBool,
        pub reject_collection: AtomicBool,
        pub reject_insert: AtomicBool,
        pub reject_release: AtomicBool,
        pub reject_close: AtomicBool,
        /// Each close takes [`SLOW_CLOSE`].
        pub slow_close: AtomicBool,
    }

    pub const SLOW_CLOSE: std::time::Duration = std::time::Duration::from_secs(2);

    impl Faults {
        pub fn set(flag: &AtomicBool) {
            flag.store(true, Ordering::SeqCst);
        }
    }

    #[derive(Debug, Default)]
    struct Remote {
        namespaces: HashSet<String>,
        collections: HashSet<String>,
    }

    pub struct MockClient {
        id: u64,
        journal: Journal,
        faults: Arc<Faults>,
        remote: Arc<Mutex<Remote>>,
        closed: bool,
    }

    impl MockClient {
        pub fn id(&self) -> u64 {
            self.id
        }

        fn remote(&self) -> MutexGuard<'_, Remote> {
            self.remote.lock().unwrap_or_else(PoisonError::into_inner)
        }

        fn ensure_open(&self) -> Result<(), RemoteError> {
            if self.closed {
                return Err(RemoteError::Closed);
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RemoteClient for MockClient {
        async fn create_namespace(&self, spec: &NamespaceSpec) -> Result<(), RemoteError> {
            self.ensure_open()?;
            self.journal.push(Call::CreateNamespace(spec.name.clone()));
            if !self.remote().namespaces.insert(spec.name.clone()) {
                return Err(RemoteError::AlreadyExists(spec.name.clone()));
            }
            Ok(())
        }

        async fn use_namespace(&mut self, name: &str) -> Result<(), RemoteError> {
            self.ensure_open()?;
            self.journal.push(Call::UseNamespace(name.to_string()));
            Ok(())
        }

        async fn create_collection(&self, spec: &CollectionSpec) -> Result<(), RemoteError> {
            self.ensure_open()?;
            self.journal.push(Call::CreateCollection(spec.clone()));
            if self.faults.reject_collection.load(Ordering::SeqCst) {
                return Err(RemoteError::Rejected("collection schema refused".into()));
            }
            if !self.remote().collections.insert(spec.name.clone()) {
                return Err(RemoteError::AlreadyExists(spec.name.clone()));
            }
            Ok(())
        }

        async fn insert(&self, collection: &str, record: Record) -> Result<(), RemoteError> {
            self.ensure_open()?;
            self.journal.push(Call::Insert {
                collection: collection.to_string(),
                record,
            });
            if self.faults.reject_insert.load(Ordering::SeqCst) {
                return Err(RemoteError::Rejected("insert refused".into()));
            }
            Ok(())
        }

        async fn release_collection(&self, collection: &str) -> Result<(), RemoteError> {
            self.ensure_open()?;
            self.journal.push(Call::ReleaseCollection(collection.to_string()));
            if self.faults.reject_release.load(Ordering::SeqCst) {
                return Err(RemoteError::Rejected("release refused".into()));
            }
            Ok(())
        }

        async fn close(&mut self) -> Result<(), RemoteError> {
            if self.faults.slow_close.load(Ordering::SeqCst) {
                tokio::time::sleep(SLOW_CLOSE).await;
            }
            self.journal.push(Call::Close { client: self.id });
            self.closed = true;
            if self.faults.reject_close.load(Ordering::SeqCst) {
                return Err(RemoteError::Rejected("close refused".into()));
            }
            Ok(())
        }
    }

    /// Factory handing out [`MockClient`]s that share one simulated remote.
    #[derive(Default)]
    pub struct MockFactory {
        journal: Journal,
        faults: Arc<Faults>,
        remote: Arc<Mutex<Remote>>,
        next_id: AtomicU64,
    }

    impl MockFactory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn journal(&self) -> Journal {
            self.journal.clone()
        }

        pub fn faults(&self) -> &Faults {
            &self.faults
        }
    }

    #[async_trait]
    impl ClientFactory for MockFactory {
        type Client = MockClient;

        async fn connect(&self, config: &ConnectConfig) -> Result<MockClient, RemoteError> {
            let id = self.next_id.fetch_add(1, Ordering::SeqCst);
            self.journal.push(Call::Connect {
                client: id,
                uri: config.uri.clone(),
            });
            if self.faults.hang_connect.load(Ordering::SeqCst) {
                return std::future::pending().await;
            }
            if self.faults.refuse_connect.load(Ordering::SeqCst) {
                return Err(RemoteError::Unreachable(config.uri.clone()));
            }
            Ok(MockClient {
                id,
                journal: self.journal.clone(),
                faults: Arc::clone(&self.faults),
                remote: Arc::clone(&self.remote),
                closed: false,
            })
        }
    }
}
