/// Chain used when neither the configuration nor the request names one (Ethereum mainnet)
pub const DEFAULT_CHAIN_ID: u64 = 1;
/// Pending-context bound; creation fails once this many contexts are alive
pub const DEFAULT_MAX_PENDING: usize = 0xFFFF;
/// Per-call transport timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
/// Maximum number of advance/transport rounds a driver runs for one request
pub const DEFAULT_MAX_ROUNDS: usize = 64;
/// Number of transport calls in flight at once
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
/// First id handed out to requests without an explicit integer id
pub const FIRST_REQUEST_ID: u64 = 1;
