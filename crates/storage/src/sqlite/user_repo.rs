use prep_core::model::{UserId, UserProfile};

use super::{SqliteRepository, mapping::map_user_row};
use crate::repository::{StorageError, UserRepository};

#[async_trait::async_trait]
impl UserRepository for SqliteRepository {
    async fn upsert_user(&self, profile: &UserProfile) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO users (id, email, first_name, last_name, profile_image_url, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(id) DO UPDATE SET
                    email = excluded.email,
                    first_name = excluded.first_name,
                    last_name = excluded.last_name,
                    profile_image_url = excluded.profile_image_url
            ",
        )
        .bind(profile.id.as_str())
        .bind(profile.email.as_deref())
        .bind(profile.first_name.as_deref())
        .bind(profile.last_name.as_deref())
        .bind(profile.profile_image_url.as_deref())
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT id, email, first_name, last_name, profile_image_url, created_at
                FROM users
                WHERE id = ?1
            ",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        row.as_ref().map(map_user_row).transpose()
    }
}
