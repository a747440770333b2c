use std::sync::atomic::{AtomicBool, Ordering};

/// A user record loaded from the users file.
///
/// The identity fields are immutable; `found` is the only mutable state and
/// makes a single one-way `false -> true` transition, guarded by
/// compare-and-swap so at most one thread ever wins it.
#[derive(Debug)]
pub struct User {
    pub username: String,
    pub hashed_password: String,
    found: AtomicBool,
}

impl User {
    pub fn new(username: impl Into<String>, hashed_password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            hashed_password: hashed_password.into(),
            found: AtomicBool::new(false),
        }
    }

    /// Attempts the one-way `found` transition.
    /// Returns true for the single caller that wins it.
    ///
    /// The engine only looks each user up once, so the CAS is a defensive
    /// guard rather than a load-bearing one; a failed swap is simply ignored.
    pub fn mark_found(&self) -> bool {
        self.found
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_found(&self) -> bool {
        self.found.load(Ordering::Acquire)
    }
}

/// A successfully cracked credential.
/// Produced exactly once per user that transitions to found.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CrackedCredential {
    pub username: String,
    pub hashed_password: String,
    pub plain_password: String,
}

impl CrackedCredential {
    pub fn new(user: &User, plain_password: impl Into<String>) -> Self {
        Self {
            username: user.username.clone(),
            hashed_password: user.hashed_password.clone(),
            plain_password: plain_password.into(),
        }
    }
}
