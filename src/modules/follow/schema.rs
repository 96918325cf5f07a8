use serde::Serialize;
use sqlx::prelude::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FollowEntity {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FollowRequestEntity {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}
