//! User profile mirroring.

use std::sync::Arc;

use prep_core::Clock;
use prep_core::model::{UserId, UserProfile};
use prep_storage::repository::UserRepository;

use crate::error::UserDeskError;

/// Mirrors profiles of the upstream identity provider's users.
///
/// Authentication itself happens upstream; this desk only makes sure a
/// profile row exists for every id that shows up.
#[derive(Clone)]
pub struct UserDesk {
    clock: Clock,
    users: Arc<dyn UserRepository>,
}

impl UserDesk {
    #[must_use]
    pub fn new(clock: Clock, users: Arc<dyn UserRepository>) -> Self {
        Self { clock, users }
    }

    /// Fetch the profile for an authenticated id, creating a bare one on
    /// first sight.
    ///
    /// # Errors
    ///
    /// Returns `UserDeskError::Storage` when repository access fails.
    pub async fn ensure_user(&self, id: &UserId) -> Result<UserProfile, UserDeskError> {
        if let Some(profile) = self.users.get_user(id).await? {
            return Ok(profile);
        }
        let profile = UserProfile::bare(id.clone(), self.clock.now());
        self.users.upsert_user(&profile).await?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::time::{fixed_clock, fixed_now};
    use prep_storage::repository::InMemoryRepository;

    #[tokio::test]
    async fn first_sight_creates_a_bare_profile() {
        let repo = InMemoryRepository::new();
        let desk = UserDesk::new(fixed_clock(), Arc::new(repo.clone()));
        let id = UserId::from("provider|123");

        let created = desk.ensure_user(&id).await.unwrap();
        assert_eq!(created.id, id);
        assert_eq!(created.created_at, fixed_now());
        assert!(created.email.is_none());

        // Second sight returns the stored profile, including enrichments.
        let mut enriched = created.clone();
        enriched.email = Some("student@example.com".into());
        repo.upsert_user(&enriched).await.unwrap();

        let fetched = desk.ensure_user(&id).await.unwrap();
        assert_eq!(fetched.email.as_deref(), Some("student@example.com"));
    }
}
