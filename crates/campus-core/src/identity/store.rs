// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Identity store trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::password::CredentialHasher;
use super::subject::Subject;
use super::types::{Role, UserId};
use crate::error::{StoreError, StoreResult};

// =============================================================================
// IdentityStore Trait
// =============================================================================

/// Persistent owner of subject identity.
///
/// Implementations must be safe to share between request handlers.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Looks a subject up by login email.
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Subject>>;

    /// Looks a subject up by id.
    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<Subject>>;

    /// Inserts or replaces a subject, keyed by id.
    async fn save(&self, subject: Subject) -> StoreResult<Subject>;
}

// =============================================================================
// MemoryIdentityStore
// =============================================================================

#[derive(Default)]
struct Inner {
    subjects: HashMap<UserId, Subject>,
    by_email: HashMap<String, UserId>,
}

/// In-memory identity store.
pub struct MemoryIdentityStore {
    inner: RwLock<Inner>,
    next_id: AtomicI64,
}

impl MemoryIdentityStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Creates a store holding the demo accounts.
    ///
    /// | id | email              | password | role    |
    /// |----|--------------------|----------|---------|
    /// | 1  | admin@user.com     | admin    | Admin   |
    /// | 2  | teacher1@user.com  | teacher1 | Teacher |
    /// | 3  | teacher2@user.com  | teacher2 | Teacher |
    /// | 4  | student1@user.com  | student1 | Student |
    pub fn seed_demo(hasher: &CredentialHasher) -> StoreResult<Self> {
        let store = Self::new();
        let accounts = [
            ("Admin User", "admin@user.com", "admin", Role::Admin),
            ("Teacher User1", "teacher1@user.com", "teacher1", Role::Teacher),
            ("Teacher User2", "teacher2@user.com", "teacher2", Role::Teacher),
            ("Student User1", "student1@user.com", "student1", Role::Student),
        ];

        for (name, email, password, role) in accounts {
            let subject = Subject::builder(store.next_id(), name, email)
                .role(role)
                .password_hash(hasher.hash(password)?)
                .build();
            store.insert(subject)?;
        }

        tracing::debug!(count = store.len(), "Seeded demo identities");
        Ok(store)
    }

    /// Allocates the next unused id.
    pub fn next_id(&self) -> UserId {
        UserId::new(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Returns the number of stored subjects.
    pub fn len(&self) -> usize {
        self.inner.read().subjects.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, subject: Subject) -> StoreResult<Subject> {
        let email = normalize_email(&subject.email);
        let mut inner = self.inner.write();

        if let Some(owner) = inner.by_email.get(&email) {
            if *owner != subject.id {
                return Err(StoreError::DuplicateEmail { email });
            }
        }

        if let Some(previous) = inner.subjects.get(&subject.id) {
            let previous_email = normalize_email(&previous.email);
            if previous_email != email {
                inner.by_email.remove(&previous_email);
            }
        }

        self.next_id
            .fetch_max(subject.id.get() + 1, Ordering::SeqCst);
        inner.by_email.insert(email, subject.id);
        inner.subjects.insert(subject.id, subject.clone());
        Ok(subject)
    }
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Subject>> {
        let inner = self.inner.read();
        Ok(inner
            .by_email
            .get(&normalize_email(email))
            .and_then(|id| inner.subjects.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: UserId) -> StoreResult<Option<Subject>> {
        Ok(self.inner.read().subjects.get(&id).cloned())
    }

    async fn save(&self, subject: Subject) -> StoreResult<Subject> {
        self.insert(subject)
    }
}

impl std::fmt::Debug for MemoryIdentityStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryIdentityStore")
            .field("subjects", &self.len())
            .finish()
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ability::{actions, resources, Grant};

    fn fast() -> CredentialHasher {
        CredentialHasher::with_cost(8, 1, 1).unwrap()
    }

    #[tokio::test]
    async fn test_seed_demo() {
        let store = MemoryIdentityStore::seed_demo(&fast()).unwrap();
        assert_eq!(store.len(), 4);

        let teacher = store.find_by_email("teacher1@user.com").await.unwrap().unwrap();
        assert_eq!(teacher.id, UserId::new(2));
        assert!(teacher.has_role(Role::Teacher));
        assert!(teacher.verify_password("teacher1"));
        assert!(!teacher.verify_password("teacher2"));
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let store = MemoryIdentityStore::seed_demo(&fast()).unwrap();
        let admin = store.find_by_email("  Admin@User.com ").await.unwrap();
        assert_eq!(admin.map(|s| s.id), Some(UserId::new(1)));
        assert!(store.find_by_email("nobody@user.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_updates_grants() {
        let store = MemoryIdentityStore::seed_demo(&fast()).unwrap();
        let mut student = store.find_by_id(UserId::new(4)).await.unwrap().unwrap();
        student
            .grants
            .push(Grant::new(actions::CREATE, resources::COURSE));
        store.save(student).await.unwrap();

        let reloaded = store.find_by_id(UserId::new(4)).await.unwrap().unwrap();
        assert_eq!(reloaded.grants.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryIdentityStore::seed_demo(&fast()).unwrap();
        let clash = Subject::builder(store.next_id(), "Clash", "ADMIN@user.com").build();
        let err = store.save(clash).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail { .. }));
    }

    #[tokio::test]
    async fn test_email_change_frees_old_address() {
        let store = MemoryIdentityStore::new();
        let id = store.next_id();
        store
            .save(Subject::builder(id, "A", "old@user.com").build())
            .await
            .unwrap();
        store
            .save(Subject::builder(id, "A", "new@user.com").build())
            .await
            .unwrap();

        assert!(store.find_by_email("old@user.com").await.unwrap().is_none());
        assert!(store.find_by_email("new@user.com").await.unwrap().is_some());
        assert_ne!(store.next_id(), id);
    }

    #[test]
    fn test_default_ids_start_at_one() {
        let store = MemoryIdentityStore::default();
        assert_eq!(store.next_id(), UserId::new(1));
        assert_eq!(store.next_id(), UserId::new(2));
    }
}
