use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use uuid::Uuid;

use crate::modules::{follow::state::PairState, user::model::profile_pic_url};

/// A user on the other end of an edge, joined with the edge timestamp.
#[derive(FromRow)]
pub struct FollowUserRow {
    pub id: Uuid,
    pub username: String,
    pub privacy: bool,
    pub profile_pic: String,
    pub since: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUserResponse {
    pub id: Uuid,
    pub username: String,
    pub privacy: bool,
    pub profile_pic_url: String,
    pub since: chrono::DateTime<chrono::Utc>,
}

impl From<FollowUserRow> for FollowUserResponse {
    fn from(row: FollowUserRow) -> Self {
        FollowUserResponse {
            id: row.id,
            profile_pic_url: profile_pic_url(&row.profile_pic),
            username: row.username,
            privacy: row.privacy,
            since: row.since,
        }
    }
}

/// Edges between an actor and another user, read together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct PairEdges {
    pub following: bool,
    pub followed_by: bool,
    pub requested: bool,
}

#[derive(Debug, Serialize)]
pub struct RelationshipResponse {
    pub is_following: bool,
    pub is_followed_by: bool,
    pub requested_to_follow: bool,
    pub state: PairState,
}

#[derive(Debug, Serialize)]
pub struct FollowStateResponse {
    pub username: String,
    pub state: PairState,
}

#[derive(Debug, Serialize)]
pub struct UnfollowResponse {
    pub username: String,
    pub removed: bool,
}
