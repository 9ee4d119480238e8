//! Projects as seen by this crate: an owner and a scope boundary

use super::ids::{ProjectId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Project {
    pub fn new(owner_id: UserId, title: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(),
            owner_id,
            title: title.into(),
            created_at: Utc::now(),
        }
    }

    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.owner_id == user
    }
}
