pub const APP_NAME: &str = "incscan";

/// Environment variable overriding how many actions are scanned at once.
pub const PARALLELISM_ENV: &str = "INCSCAN_PARALLELISM";

/// Task name attached to the scan span when the caller supplies none.
pub const DEFAULT_TASK_NAME: &str = "include scanning";

/// Current scan request format version.
pub const REQUEST_VERSION: u32 = 1;
