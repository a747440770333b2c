use std::sync::atomic::{AtomicU64, Ordering};

/// The shared run counters, updated with lock-free increments.
///
/// Every counter is monotonically non-decreasing and bumped exactly once per
/// unit of work, so readers never need a lock on the main data structures.
#[derive(Debug, Default)]
pub struct AuditCounters {
    hashes_computed: AtomicU64,
    users_checked: AtomicU64,
    passwords_found: AtomicU64,
}

impl AuditCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_hash_computed(&self) {
        self.hashes_computed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_user_checked(&self) {
        self.users_checked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_password_found(&self) {
        self.passwords_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hashes_computed(&self) -> u64 {
        self.hashes_computed.load(Ordering::Relaxed)
    }

    pub fn users_checked(&self) -> u64 {
        self.users_checked.load(Ordering::Relaxed)
    }

    pub fn passwords_found(&self) -> u64 {
        self.passwords_found.load(Ordering::Relaxed)
    }

    /// Takes a point-in-time copy of all three counters.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            hashes_computed: self.hashes_computed(),
            users_checked: self.users_checked(),
            passwords_found: self.passwords_found(),
        }
    }
}

/// A point-in-time copy of the run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub hashes_computed: u64,
    pub users_checked: u64,
    pub passwords_found: u64,
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;
    use std::thread;

    use super::*;

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let counters = AuditCounters::new();
        let barrier = Barrier::new(8);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    barrier.wait();
                    for _ in 0..1000 {
                        counters.add_user_checked();
                    }
                });
            }
        });

        assert_eq!(8000, counters.users_checked());
    }

    #[test]
    fn test_snapshot_copies_all_counters() {
        let counters = AuditCounters::new();
        counters.add_hash_computed();
        counters.add_hash_computed();
        counters.add_user_checked();
        counters.add_password_found();

        let snapshot = counters.snapshot();
        assert_eq!(2, snapshot.hashes_computed);
        assert_eq!(1, snapshot.users_checked);
        assert_eq!(1, snapshot.passwords_found);
    }
}
