use super::collection::{CollectionData, InMemoryCollection};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::store::{
    DocumentCollection, StoreClient, StoreClientProvider, StoreDatabase, StoreDatabaseProvider,
    StoreDriver, StoreUrl,
};
use dashmap::DashMap;
use std::sync::Arc;

pub const MEMORY_SCHEME: &str = "memory";

type DatabaseData = Arc<DashMap<String, CollectionData>>;
type ServerData = Arc<DashMap<String, DatabaseData>>;

/// Driver for `memory://` connection strings.
///
/// Clients connecting to the same host list share one server, so repositories built from
/// the same connection string see the same data. Clones of a driver share its servers.
///
/// ```rust,ignore
/// let driver = InMemoryDriver::new();
/// let url = StoreUrl::parse("memory://localhost/app")?;
/// let collection = driver.connect(&url)?.database(url.database())?.collection("people")?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryDriver {
    servers: Arc<DashMap<String, ServerData>>,
}

impl InMemoryDriver {
    pub fn new() -> InMemoryDriver {
        InMemoryDriver::default()
    }
}

impl StoreDriver for InMemoryDriver {
    fn connect(&self, url: &StoreUrl) -> RepoResult<StoreClient> {
        if url.scheme() != MEMORY_SCHEME {
            log::error!("In-memory driver cannot open scheme {}", url.scheme());
            return Err(RepoError::new(
                &format!("Unsupported scheme '{}', expected '{}'", url.scheme(), MEMORY_SCHEME),
                ErrorKind::InvalidUrl,
            ));
        }

        let host_key = url.host_key();
        let server = self
            .servers
            .entry(host_key.clone())
            .or_insert_with(|| {
                log::debug!("Starting in-memory server for {}", host_key);
                Arc::new(DashMap::new())
            })
            .clone();

        Ok(StoreClient::new(InMemoryClient {
            server,
            acknowledged: url.is_acknowledged(),
        }))
    }
}

struct InMemoryClient {
    server: ServerData,
    acknowledged: bool,
}

impl StoreClientProvider for InMemoryClient {
    fn database(&self, name: &str) -> RepoResult<StoreDatabase> {
        let collections = self
            .server
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(DashMap::new()))
            .clone();

        Ok(StoreDatabase::new(InMemoryDatabase {
            name: name.to_string(),
            collections,
            acknowledged: self.acknowledged,
        }))
    }

    fn database_names(&self) -> RepoResult<Vec<String>> {
        let mut names: Vec<String> = self.server.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    fn drop_database(&self, name: &str) -> RepoResult<()> {
        self.server.remove(name);
        Ok(())
    }
}

struct InMemoryDatabase {
    name: String,
    collections: DatabaseData,
    acknowledged: bool,
}

impl StoreDatabaseProvider for InMemoryDatabase {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn collection(&self, name: &str) -> RepoResult<DocumentCollection> {
        if name.trim().is_empty() {
            log::error!("Collection name cannot be empty");
            return Err(RepoError::new(
                "Collection name cannot be empty",
                ErrorKind::ServerRejected,
            ));
        }

        let data = self
            .collections
            .entry(name.to_string())
            .or_insert_with(CollectionData::default)
            .clone();

        Ok(DocumentCollection::new(InMemoryCollection::new(
            format!("{}.{}", self.name, name),
            data,
            self.acknowledged,
        )))
    }

    fn collection_names(&self) -> RepoResult<Vec<String>> {
        let mut names: Vec<String> = self.collections.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    fn drop_collection(&self, name: &str) -> RepoResult<()> {
        // clear in place so open handles observe the drop
        if let Some((_, data)) = self.collections.remove(name) {
            data.write().clear();
        }
        Ok(())
    }
}
