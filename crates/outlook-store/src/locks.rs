//! Per-email write serialization (§4.1: "no torn updates across concurrent
//! refreshes"). Grounded on the teacher's per-account locking idiom in the
//! sync engine, generalized from account id to [`Email`].

use std::sync::Arc;

use dashmap::DashMap;
use outlook_core::domain::Email;
use tokio::sync::Mutex;

/// Lazily creates and hands out one mutex per email, so writers for
/// different users never block each other.
#[derive(Default)]
pub struct EmailLockTable {
    locks: DashMap<Email, Arc<Mutex<()>>>,
}

impl EmailLockTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_for(&self, email: &Email) -> Arc<Mutex<()>> {
        self.locks
            .entry(email.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_email_reuses_the_same_mutex() {
        let table = EmailLockTable::new();
        let email = Email::new("user@example.com").unwrap();
        let a = table.lock_for(&email);
        let b = table.lock_for(&email);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
