use backtrace::Backtrace;
use parking_lot::Mutex;
use serde::{de, ser};
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

/// Error kinds for repository and store operations.
///
/// Every failure surfaced by the crate carries exactly one kind. Drivers normalise
/// their native failures into these kinds so that retry classification never has to
/// know about a particular driver's error types.
///
/// # Examples
///
/// ```rust,ignore
/// use docrepo::errors::{RepoError, ErrorKind, RepoResult};
///
/// fn example() -> RepoResult<()> {
///     Err(RepoError::new("No connection string for 'people'", ErrorKind::ConfigurationMissing))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    // Declaration errors
    /// A naming declaration was constructed with an empty or blank value
    ValidationError,

    // Resolution errors, raised while a repository is being constructed
    /// No connection string exists for the resolved connection name
    ConfigurationMissing,
    /// The connection string could not be parsed or does not name a database
    InvalidUrl,

    // Connection errors, the only family that can be transient
    /// A connection-level failure; transient when caused by `NetworkIo` or `SocketFailure`
    ConnectionFailure,
    /// Network I/O failure underneath a connection failure
    NetworkIo,
    /// Socket failure underneath a connection failure
    SocketFailure,

    // Store-reported errors, never retried
    /// A document with the same `_id` already exists
    DuplicateKey,
    /// The filter or update expression is malformed for the stored data
    InvalidQuery,
    /// The store refused the operation
    ServerRejected,

    // Mapping errors
    /// Error mapping an entity to or from a document
    ObjectMappingError,
    /// The provided identifier is not a valid object id
    InvalidId,
    /// Invalid field name or path
    InvalidFieldName,

    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::ConfigurationMissing => write!(f, "Configuration missing"),
            ErrorKind::InvalidUrl => write!(f, "Invalid URL"),
            ErrorKind::ConnectionFailure => write!(f, "Connection failure"),
            ErrorKind::NetworkIo => write!(f, "Network IO error"),
            ErrorKind::SocketFailure => write!(f, "Socket failure"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::InvalidQuery => write!(f, "Invalid query"),
            ErrorKind::ServerRejected => write!(f, "Server rejected"),
            ErrorKind::ObjectMappingError => write!(f, "Object mapping error"),
            ErrorKind::InvalidId => write!(f, "Invalid ID"),
            ErrorKind::InvalidFieldName => write!(f, "Invalid field name"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Error type for every fallible operation in the crate.
///
/// `RepoError` carries a message, a kind and an optional cause. The cause matters for
/// retry classification: a `ConnectionFailure` is only transient when its immediate
/// cause is a `NetworkIo` or `SocketFailure` error.
///
/// A backtrace is captured unresolved when the error is created and symbolised only
/// when the error is debug-printed.
#[derive(Clone)]
pub struct RepoError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<RepoError>>,
    backtrace: Arc<Mutex<Backtrace>>,
}

impl RepoError {
    /// Creates a new `RepoError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        RepoError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates a new `RepoError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for debugging
    /// and for transient-failure classification.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: RepoError) -> Self {
        RepoError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// A connection failure caused by a network I/O error.
    pub fn network_io(message: &str) -> Self {
        RepoError::new_with_cause(
            &format!("Connection failure: {}", message),
            ErrorKind::ConnectionFailure,
            RepoError::new(message, ErrorKind::NetworkIo),
        )
    }

    /// A connection failure caused by a socket error.
    pub fn socket_failure(message: &str) -> Self {
        RepoError::new_with_cause(
            &format!("Connection failure: {}", message),
            ErrorKind::ConnectionFailure,
            RepoError::new(message, ErrorKind::SocketFailure),
        )
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&RepoError> {
        self.cause.as_deref()
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => {
                let mut backtrace = self.backtrace.lock();
                backtrace.resolve();
                write!(f, "{}\n{:?}", self.message, *backtrace)
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for repository operations.
pub type RepoResult<T> = Result<T, RepoError>;

impl de::Error for RepoError {
    fn custom<T: Display>(msg: T) -> Self {
        RepoError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

impl ser::Error for RepoError {
    fn custom<T: Display>(msg: T) -> Self {
        RepoError::new(&msg.to_string(), ErrorKind::ObjectMappingError)
    }
}

// Socket-level io errors keep their own cause kind; everything else is plain network IO.
// Both end up as transient connection failures.
impl From<std::io::Error> for RepoError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind as IoKind;
        match err.kind() {
            IoKind::ConnectionRefused
            | IoKind::ConnectionReset
            | IoKind::ConnectionAborted
            | IoKind::NotConnected
            | IoKind::AddrInUse
            | IoKind::AddrNotAvailable
            | IoKind::BrokenPipe => RepoError::socket_failure(&err.to_string()),
            _ => RepoError::network_io(&err.to_string()),
        }
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(err: serde_json::Error) -> Self {
        RepoError::new(
            &format!("Object mapping error: {}", err),
            ErrorKind::ObjectMappingError,
        )
    }
}

impl From<regex::Error> for RepoError {
    fn from(err: regex::Error) -> Self {
        RepoError::new(&format!("Invalid regex: {}", err), ErrorKind::InvalidQuery)
    }
}

impl From<String> for RepoError {
    fn from(msg: String) -> Self {
        RepoError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for RepoError {
    fn from(msg: &str) -> Self {
        RepoError::new(msg, ErrorKind::InternalError)
    }
}
