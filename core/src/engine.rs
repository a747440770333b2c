use std::{num::NonZeroUsize, thread};

use crossbeam_channel::unbounded;
use rayon::{prelude::*, ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::{
    counters::AuditCounters,
    credential::{CrackedCredential, User},
    error::AuditResult,
    prehash::PrehashedDictionary,
    progress::ProgressReporter,
};

/// Builds the bounded worker pool used for both phases.
pub fn worker_pool(threads: usize) -> AuditResult<ThreadPool> {
    Ok(ThreadPoolBuilder::new().num_threads(threads).build()?)
}

/// The default worker count: `max(8, cores + cores / 4)`.
pub fn default_thread_count() -> usize {
    let cores = thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1);
    (cores + cores / 4).max(8)
}

/// The lookup phase (phase 2).
///
/// Checks every user against the frozen dictionary exactly once, in any
/// worker, with no ordering between users. At quiescence the cracked set has
/// exactly `passwords_found` entries and `users_checked` equals the user
/// count, for any pool size.
///
/// There is no internal cancellation: if the surrounding pool is interrupted
/// from outside, the counters remain internally consistent (nothing is
/// double-counted) but the cracked set is only a partial, best-effort
/// snapshot.
pub struct CrackingEngine<'a> {
    users: &'a [User],
    dictionary: &'a PrehashedDictionary,
    counters: &'a AuditCounters,
    reporter: &'a ProgressReporter,
}

impl<'a> CrackingEngine<'a> {
    pub fn new(
        users: &'a [User],
        dictionary: &'a PrehashedDictionary,
        counters: &'a AuditCounters,
        reporter: &'a ProgressReporter,
    ) -> Self {
        Self {
            users,
            dictionary,
            counters,
            reporter,
        }
    }

    /// Runs the lookup over every user on the calling rayon pool and returns
    /// the cracked credentials, in no particular order.
    pub fn run(&self) -> Vec<CrackedCredential> {
        let (sender, receiver) = unbounded();

        self.users.par_iter().for_each_with(sender, |sender, user| {
            if let Some(plain_password) = self.dictionary.get(&user.hashed_password) {
                // the CAS can only lose if the same user were checked twice,
                // which the single pass rules out
                if user.mark_found() {
                    sender
                        .send(CrackedCredential::new(user, plain_password))
                        .unwrap();
                    self.counters.add_password_found();
                }
            }

            self.counters.add_user_checked();
            self.reporter.check_and_report();
        });

        self.reporter.report_final();

        debug!(
            users = self.users.len(),
            found = self.counters.passwords_found(),
            "lookup phase complete"
        );

        // all senders dropped when the parallel loop joined
        receiver.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use itertools::Itertools;

    use super::*;
    use crate::{
        counters::CounterSnapshot,
        digest::HexDigester,
        prehash::build_index,
        progress::MemorySink,
    };

    const PASSWORD_SHA256: &str =
        "5e884898da28047151d0e56f8dc6292773603d0d6aabbdd62a11ef721d1542d8";
    const HUNTER2_SHA256: &str =
        "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7";

    fn run_audit(
        threads: usize,
        users: &[User],
        word_list: &[&str],
    ) -> (Vec<CrackedCredential>, CounterSnapshot) {
        let words: Vec<String> = word_list.iter().map(|w| w.to_string()).collect();
        let pool = worker_pool(threads).unwrap();
        let counters = Arc::new(AuditCounters::new());
        let dictionary = pool.install(|| build_index(&words, &counters));
        let reporter = ProgressReporter::new(
            users.len() as u64,
            1000,
            counters.clone(),
            Box::new(MemorySink::new()),
        );

        let engine = CrackingEngine::new(users, &dictionary, &counters, &reporter);
        let cracked = pool.install(|| engine.run());
        (cracked, counters.snapshot())
    }

    #[test]
    fn test_end_to_end_scenario() {
        let users = [
            User::new("alice", PASSWORD_SHA256),
            User::new("bob", HUNTER2_SHA256),
        ];

        let (cracked, snapshot) = run_audit(4, &users, &["password", "letmein", "password"]);

        assert_eq!(1, cracked.len());
        assert_eq!("alice", cracked[0].username);
        assert_eq!(PASSWORD_SHA256, cracked[0].hashed_password);
        assert_eq!("password", cracked[0].plain_password);

        assert!(users[0].is_found());
        assert!(!users[1].is_found());

        assert_eq!(1, snapshot.passwords_found);
        assert_eq!(2, snapshot.users_checked);
        assert_eq!(3, snapshot.hashes_computed);
    }

    #[test]
    fn test_counters_consistent_across_pool_sizes() {
        // every other user's password is in the dictionary
        let word_list: Vec<String> = (0..500).step_by(2).map(|i| format!("pw{i}")).collect();
        let word_refs: Vec<&str> = word_list.iter().map(String::as_str).collect();

        for threads in [1, 4, 64] {
            let mut digester = HexDigester::new();
            let users: Vec<User> = (0..500)
                .map(|i| User::new(format!("user{i}"), digester.digest_hex(&format!("pw{i}"))))
                .collect();

            let (cracked, snapshot) = run_audit(threads, &users, &word_refs);

            assert_eq!(users.len() as u64, snapshot.users_checked);
            assert_eq!(cracked.len() as u64, snapshot.passwords_found);
            assert_eq!(250, cracked.len());

            // the matched set is deterministic even though emission order is not
            let names = cracked
                .iter()
                .map(|c| c.username.as_str())
                .sorted()
                .collect_vec();
            let expected: Vec<String> = (0..500).step_by(2).map(|i| format!("user{i}")).collect();
            assert_eq!(expected.iter().map(String::as_str).sorted().collect_vec(), names);
        }
    }

    #[test]
    fn test_no_false_positives() {
        let users = [User::new("carol", HUNTER2_SHA256)];

        let (cracked, snapshot) = run_audit(4, &users, &["password", "letmein"]);

        assert!(cracked.is_empty());
        assert!(!users[0].is_found());
        assert_eq!(0, snapshot.passwords_found);
        assert_eq!(1, snapshot.users_checked);
    }

    #[test]
    fn test_empty_dictionary() {
        let users = [User::new("alice", PASSWORD_SHA256)];

        let (cracked, snapshot) = run_audit(4, &users, &[]);

        assert!(cracked.is_empty());
        assert_eq!(0, snapshot.hashes_computed);
        assert_eq!(1, snapshot.users_checked);
    }

    #[test]
    fn test_empty_user_set() {
        let (cracked, snapshot) = run_audit(4, &[], &["password"]);

        assert!(cracked.is_empty());
        assert_eq!(0, snapshot.users_checked);
        assert_eq!(0, snapshot.passwords_found);
    }

    #[test]
    fn test_default_thread_count_floor() {
        assert!(default_thread_count() >= 8);
    }
}
