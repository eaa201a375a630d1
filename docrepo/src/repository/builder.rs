use crate::config::ConfigurationSource;
use crate::entity::{Entity, EntityMetadata, ResolvedNames};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::repository::{open_collection, open_collection_str, open_configured_collection, Repository};
use crate::retry::{RetryConfig, RetryPolicy};
use crate::store::{StoreDriver, StoreUrl};
use std::marker::PhantomData;

enum ConnectionSource<'a> {
    Url(StoreUrl),
    ConnectionString(String),
    Configuration(&'a dyn ConfigurationSource),
}

/// Step-by-step construction of a [`Repository`].
///
/// A driver and exactly one connection source are required. The last connection source
/// set wins.
///
/// ```rust,ignore
/// let repo = Repository::<Invoice>::builder()
///     .driver(&driver)
///     .configuration(&config)
///     .metadata(EntityMetadata::new().connection_name(ConnectionName::new("billing")?))
///     .retry_config(RetryConfig::new().max_retries(5))
///     .build()?;
/// ```
pub struct RepositoryBuilder<'a, T: Entity> {
    driver: Option<&'a dyn StoreDriver>,
    source: Option<ConnectionSource<'a>>,
    collection_name: Option<String>,
    metadata: Option<EntityMetadata>,
    retry_config: RetryConfig,
    _phantom: PhantomData<fn() -> T>,
}

impl<'a, T: Entity> RepositoryBuilder<'a, T> {
    pub fn new() -> Self {
        RepositoryBuilder {
            driver: None,
            source: None,
            collection_name: None,
            metadata: None,
            retry_config: RetryConfig::default(),
            _phantom: PhantomData,
        }
    }

    pub fn driver(mut self, driver: &'a dyn StoreDriver) -> Self {
        self.driver = Some(driver);
        self
    }

    /// Looks the connection string up by `T`'s resolved connection name.
    pub fn configuration(mut self, config: &'a dyn ConfigurationSource) -> Self {
        self.source = Some(ConnectionSource::Configuration(config));
        self
    }

    pub fn connection_string(mut self, connection_string: &str) -> Self {
        self.source = Some(ConnectionSource::ConnectionString(connection_string.to_string()));
        self
    }

    pub fn url(mut self, url: StoreUrl) -> Self {
        self.source = Some(ConnectionSource::Url(url));
        self
    }

    /// Uses `collection_name` as given, bypassing name resolution for the collection.
    pub fn collection_name(mut self, collection_name: &str) -> Self {
        self.collection_name = Some(collection_name.to_string());
        self
    }

    /// Naming overrides that take precedence over `T`'s own declarations.
    pub fn metadata(mut self, metadata: EntityMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn build(self) -> RepoResult<Repository<T>> {
        let driver = self.driver.ok_or_else(|| {
            log::error!("No store driver given for repository of {}", T::entity_name());
            RepoError::new("A store driver is required", ErrorKind::ConfigurationMissing)
        })?;

        let names = ResolvedNames::resolve::<T>(self.metadata.as_ref())?;
        let collection_name = self.collection_name.unwrap_or(names.collection_name);

        let collection = match self.source {
            Some(ConnectionSource::Url(url)) => open_collection(driver, &url, &collection_name)?,
            Some(ConnectionSource::ConnectionString(value)) => {
                open_collection_str(driver, &value, &collection_name)?
            }
            Some(ConnectionSource::Configuration(config)) => {
                open_configured_collection(driver, config, &names.connection_name, &collection_name)?
            }
            None => {
                log::error!("No connection source given for repository of {}", T::entity_name());
                return Err(RepoError::new(
                    "A connection string, URL or configuration source is required",
                    ErrorKind::ConfigurationMissing,
                ));
            }
        };

        Ok(Repository::bind(
            collection,
            collection_name,
            names.connection_name,
            RetryPolicy::new(self.retry_config),
        ))
    }
}

impl<'a, T: Entity> Default for RepositoryBuilder<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}
