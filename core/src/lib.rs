pub mod counters;
pub mod credential;
pub mod digest;
pub mod engine;
pub mod error;
pub mod prehash;
pub mod progress;

pub use counters::{AuditCounters, CounterSnapshot};
pub use credential::{CrackedCredential, User};
pub use digest::{self_check, HexDigester};
pub use engine::{default_thread_count, worker_pool, CrackingEngine};
pub use error::{AuditError, AuditResult};
pub use prehash::{build_index, PrehashedDictionary, ShardedDigestMap};
pub use progress::{ConsoleSink, MemorySink, ProgressReporter, ProgressTicker, ReportSink};

// the CLI drives both phases on a pool it owns
pub use rayon::ThreadPool;

/// The default progress milestone interval, in checked users.
pub const DEFAULT_MILESTONE_INTERVAL: u64 = 1000;
