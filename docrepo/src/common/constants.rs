// doc constants
pub const DOC_ID: &str = "_id";
pub const DOC_CREATED: &str = "_c";
pub const DOC_MODIFIED: &str = "_m";

// document path separator
pub const FIELD_SEPARATOR: &str = ".";

// retry constants
pub const DEFAULT_MAX_RETRIES: u32 = 3;

// store url constants
pub const URL_SCHEME_SEPARATOR: &str = "://";
pub const WRITE_CONCERN_OPTION: &str = "w";
pub const UNACKNOWLEDGED_WRITE_CONCERN: &str = "0";
