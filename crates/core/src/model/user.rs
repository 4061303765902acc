use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::UserId;

/// Profile of an authenticated user, mirrored from the external identity
/// provider on first sight. This service never authenticates anyone itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// Bare profile carrying only the provider-assigned id.
    #[must_use]
    pub fn bare(id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id,
            email: None,
            first_name: None,
            last_name: None,
            profile_image_url: None,
            created_at: now,
        }
    }
}
