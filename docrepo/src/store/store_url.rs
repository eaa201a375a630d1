use crate::common::{UNACKNOWLEDGED_WRITE_CONCERN, URL_SCHEME_SEPARATOR, WRITE_CONCERN_OPTION};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use indexmap::IndexMap;
use percent_encoding::percent_decode_str;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A host and optional port in a connection string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreHost {
    pub host: String,
    pub port: Option<u16>,
}

impl Display for StoreHost {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.port {
            Some(port) => write!(f, "{}:{}", self.host, port),
            None => write!(f, "{}", self.host),
        }
    }
}

/// A parsed connection string.
///
/// Format: `scheme://[user[:password]@]host[:port][,host[:port]...]/database[?key=value&...]`
///
/// The database name is mandatory. The `w=0` option requests unacknowledged writes;
/// every other option is kept verbatim for the driver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreUrl {
    scheme: String,
    username: Option<String>,
    password: Option<String>,
    hosts: Vec<StoreHost>,
    database: String,
    options: IndexMap<String, String>,
}

impl StoreUrl {
    pub fn parse(value: &str) -> RepoResult<StoreUrl> {
        let (scheme, rest) = value
            .split_once(URL_SCHEME_SEPARATOR)
            .ok_or_else(|| invalid_url(value, "missing scheme separator '://'"))?;
        if scheme.is_empty() {
            return Err(invalid_url(value, "missing scheme"));
        }

        let (location, query) = match rest.split_once('?') {
            Some((location, query)) => (location, Some(query)),
            None => (rest, None),
        };

        let (authority, database) = location
            .split_once('/')
            .ok_or_else(|| invalid_url(value, "missing database name"))?;
        if database.trim().is_empty() {
            return Err(invalid_url(value, "missing database name"));
        }

        let (credentials, host_list) = match authority.rsplit_once('@') {
            Some((credentials, hosts)) => (Some(credentials), hosts),
            None => (None, authority),
        };

        let (username, password) = match credentials {
            Some(credentials) => {
                let (user, password) = match credentials.split_once(':') {
                    Some((user, password)) => (user, Some(decode_credential(value, password)?)),
                    None => (credentials, None),
                };
                if user.is_empty() {
                    return Err(invalid_url(value, "empty user name"));
                }
                (Some(decode_credential(value, user)?), password)
            }
            None => (None, None),
        };

        let mut hosts = Vec::new();
        for entry in host_list.split(',') {
            hosts.push(parse_host(value, entry)?);
        }

        let mut options = IndexMap::new();
        if let Some(query) = query {
            for pair in query.split('&').filter(|p| !p.is_empty()) {
                let (key, option) = pair.split_once('=').unwrap_or((pair, ""));
                options.insert(key.to_string(), option.to_string());
            }
        }

        Ok(StoreUrl {
            scheme: scheme.to_string(),
            username,
            password,
            hosts,
            database: database.to_string(),
            options,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn hosts(&self) -> &[StoreHost] {
        &self.hosts
    }

    /// The host list in its textual form, for keying connection pools.
    pub fn host_key(&self) -> String {
        self.hosts
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(|v| v.as_str())
    }

    pub fn options(&self) -> &IndexMap<String, String> {
        &self.options
    }

    pub fn is_acknowledged(&self) -> bool {
        self.option(WRITE_CONCERN_OPTION) != Some(UNACKNOWLEDGED_WRITE_CONCERN)
    }
}

// reserved characters in user names and passwords arrive percent-encoded
fn decode_credential(url: &str, encoded: &str) -> RepoResult<String> {
    percent_decode_str(encoded)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| invalid_url(url, "credentials are not valid percent-encoded UTF-8"))
}

fn parse_host(url: &str, entry: &str) -> RepoResult<StoreHost> {
    if entry.trim().is_empty() {
        return Err(invalid_url(url, "empty host"));
    }

    match entry.rsplit_once(':') {
        Some((host, port)) => {
            if host.is_empty() {
                return Err(invalid_url(url, "empty host"));
            }
            let port = port
                .parse::<u16>()
                .map_err(|_| invalid_url(url, &format!("invalid port '{}'", port)))?;
            Ok(StoreHost {
                host: host.to_string(),
                port: Some(port),
            })
        }
        None => Ok(StoreHost {
            host: entry.to_string(),
            port: None,
        }),
    }
}

fn invalid_url(url: &str, reason: &str) -> RepoError {
    log::error!("Invalid connection string: {}", reason);
    RepoError::new(
        &format!("Invalid connection string '{}': {}", redact(url), reason),
        ErrorKind::InvalidUrl,
    )
}

// Masks the password in a raw connection string before it reaches a log or an error.
fn redact(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once(URL_SCHEME_SEPARATOR) else {
        return url.to_string();
    };
    let authority_end = rest.find('/').unwrap_or(rest.len());
    let Some(at) = rest[..authority_end].rfind('@') else {
        return url.to_string();
    };
    match rest[..at].split_once(':') {
        Some((user, _)) => format!("{}://{}:***{}", scheme, user, &rest[at..]),
        None => url.to_string(),
    }
}

impl FromStr for StoreUrl {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StoreUrl::parse(s)
    }
}

impl Display for StoreUrl {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://", self.scheme)?;
        if let Some(user) = &self.username {
            match self.password {
                Some(_) => write!(f, "{}:***@", user)?,
                None => write!(f, "{}@", user)?,
            }
        }
        write!(f, "{}/{}", self.host_key(), self.database)?;
        if !self.options.is_empty() {
            let query: Vec<String> = self
                .options
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "?{}", query.join("&"))?;
        }
        Ok(())
    }
}
