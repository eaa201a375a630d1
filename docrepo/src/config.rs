use std::collections::HashMap;

/// Source of connection strings keyed by connection name.
///
/// Injected into a repository at construction. The repository asks for the connection
/// string of its resolved connection name exactly once.
pub trait ConfigurationSource: Send + Sync {
    fn connection_string(&self, name: &str) -> Option<String>;
}

/// A case-insensitive map of connection names to connection strings.
///
/// ```rust,ignore
/// let config = ConnectionStrings::new()
///     .with("person", "memory://localhost/people")
///     .with("CRM", "memory://crm-host/crm");
/// assert!(config.connection_string("crm").is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct ConnectionStrings {
    entries: HashMap<String, String>,
}

impl ConnectionStrings {
    pub fn new() -> ConnectionStrings {
        ConnectionStrings::default()
    }

    pub fn with(mut self, name: &str, connection_string: &str) -> Self {
        self.insert(name, connection_string);
        self
    }

    pub fn insert(&mut self, name: &str, connection_string: &str) {
        self.entries
            .insert(name.to_lowercase(), connection_string.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigurationSource for ConnectionStrings {
    fn connection_string(&self, name: &str) -> Option<String> {
        self.entries.get(&name.to_lowercase()).cloned()
    }
}

impl<K: AsRef<str>, V: AsRef<str>> FromIterator<(K, V)> for ConnectionStrings {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut strings = ConnectionStrings::new();
        for (name, value) in iter {
            strings.insert(name.as_ref(), value.as_ref());
        }
        strings
    }
}

impl ConfigurationSource for HashMap<String, String> {
    fn connection_string(&self, name: &str) -> Option<String> {
        self.get(name).cloned().or_else(|| {
            self.iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.clone())
        })
    }
}
