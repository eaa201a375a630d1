use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::ID_GENERATOR;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

const COUNTER_MASK: u32 = 0x00FF_FFFF;

/// A 12-byte, time-ordered document identifier.
///
/// Layout: 4 bytes of big-endian seconds since the Unix epoch, 5 bytes of per-process
/// random value, 3 bytes of big-endian counter. The textual form is 24 lower-case hex
/// characters, so identifiers sort by creation time both as bytes and as strings.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    bytes: [u8; 12],
}

impl ObjectId {
    /// Generates a new identifier stamped with the current time.
    pub fn new() -> ObjectId {
        ID_GENERATOR.generate()
    }

    pub fn from_bytes(bytes: [u8; 12]) -> ObjectId {
        ObjectId { bytes }
    }

    /// Parses a 24-character hex string.
    pub fn parse_str(value: &str) -> RepoResult<ObjectId> {
        if value.len() != 24 || !value.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid_id(value));
        }

        let mut bytes = [0u8; 12];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&value[i * 2..i * 2 + 2], 16)
                .map_err(|_| invalid_id(value))?;
        }
        Ok(ObjectId { bytes })
    }

    pub fn to_hex(&self) -> String {
        self.bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// The creation time embedded in the identifier, at second precision.
    pub fn timestamp(&self) -> DateTime<Utc> {
        let seconds = u32::from_be_bytes([self.bytes[0], self.bytes[1], self.bytes[2], self.bytes[3]]);
        DateTime::from_timestamp(seconds as i64, 0).unwrap_or_default()
    }

    pub fn bytes(&self) -> [u8; 12] {
        self.bytes
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        ObjectId::new()
    }
}

fn invalid_id(value: &str) -> RepoError {
    log::error!("'{}' is not a valid object id", value);
    RepoError::new(
        &format!("'{}' is not a valid 24-character hex object id", value),
        ErrorKind::InvalidId,
    )
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl std::fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = RepoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        ObjectId::parse_str(&value).map_err(|e| serde::de::Error::custom(e.message()))
    }
}

/// Process-wide identifier generator.
pub struct ObjectIdGenerator {
    process_unique: [u8; 5],
    counter: AtomicU32,
}

impl ObjectIdGenerator {
    pub fn new() -> Self {
        let process_unique: [u8; 5] = OsRng.gen();
        let counter = OsRng.gen_range(0..=COUNTER_MASK);
        debug!("Initialized object id generator with counter seed {}", counter);

        ObjectIdGenerator {
            process_unique,
            counter: AtomicU32::new(counter),
        }
    }

    pub fn generate(&self) -> ObjectId {
        let seconds = Utc::now().timestamp();
        let seconds = u32::try_from(seconds).unwrap_or_else(|_| {
            warn!("System clock {} is outside the object id range", seconds);
            0
        });
        let counter = self.counter.fetch_add(1, Ordering::Relaxed) & COUNTER_MASK;

        let mut bytes = [0u8; 12];
        bytes[0..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(&self.process_unique);
        bytes[9..12].copy_from_slice(&counter.to_be_bytes()[1..4]);
        ObjectId { bytes }
    }
}

impl Default for ObjectIdGenerator {
    fn default() -> Self {
        ObjectIdGenerator::new()
    }
}
