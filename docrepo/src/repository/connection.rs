use crate::config::ConfigurationSource;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::store::{DocumentCollection, StoreDriver, StoreUrl};

/// Opens `collection_name` in the database named by `url`.
///
/// Every call goes to the driver; pooling is the driver's own concern.
pub fn open_collection(
    driver: &dyn StoreDriver,
    url: &StoreUrl,
    collection_name: &str,
) -> RepoResult<DocumentCollection> {
    let client = driver.connect(url)?;
    let database = client.database(url.database())?;
    let collection = database.collection(collection_name)?;
    log::debug!("Opened collection {} on {}", collection_name, url);
    Ok(collection)
}

/// Parses `connection_string` and opens `collection_name` in its database.
pub fn open_collection_str(
    driver: &dyn StoreDriver,
    connection_string: &str,
    collection_name: &str,
) -> RepoResult<DocumentCollection> {
    let url = StoreUrl::parse(connection_string)?;
    open_collection(driver, &url, collection_name)
}

/// Looks up the connection string registered for `connection_name`.
///
/// A missing or blank entry is a `ConfigurationMissing` error.
pub fn lookup_connection_string(
    config: &dyn ConfigurationSource,
    connection_name: &str,
) -> RepoResult<String> {
    match config.connection_string(connection_name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => {
            log::error!("No connection string configured for {}", connection_name);
            Err(RepoError::new(
                &format!("No connection string configured for '{}'", connection_name),
                ErrorKind::ConfigurationMissing,
            ))
        }
    }
}

/// Opens `collection_name` through the connection string configured for
/// `connection_name`.
pub fn open_configured_collection(
    driver: &dyn StoreDriver,
    config: &dyn ConfigurationSource,
    connection_name: &str,
    collection_name: &str,
) -> RepoResult<DocumentCollection> {
    let connection_string = lookup_connection_string(config, connection_name)?;
    open_collection_str(driver, &connection_string, collection_name)
}
