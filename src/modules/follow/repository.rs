use uuid::Uuid;

use crate::api::error;
use crate::modules::follow::{
    model::{FollowUserResponse, PairEdges},
    schema::{FollowEntity, FollowRequestEntity},
    state::{FollowAction, Transition},
};

#[async_trait::async_trait]
pub trait FollowRepository {
    async fn find_follow(
        &self,
        follower_id: &Uuid,
        followed_id: &Uuid,
    ) -> Result<Option<FollowEntity>, error::SystemError>;

    /// Follows in both directions and the pending request `actor_id ->
    /// other_id`, all from one snapshot.
    async fn find_pair_edges(
        &self,
        actor_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<PairEdges, error::SystemError>;

    /// Users following `user_id`, newest first.
    async fn find_followers(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError>;

    /// Users `user_id` follows, newest first.
    async fn find_following(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FollowRequestRepository {
    async fn find_follow_request(
        &self,
        follower_id: &Uuid,
        followed_id: &Uuid,
    ) -> Result<Option<FollowRequestEntity>, error::SystemError>;

    async fn find_follow_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError>;

    async fn find_follow_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError>;
}

#[async_trait::async_trait]
pub trait FollowRepo: FollowRepository + FollowRequestRepository + Send + Sync {
    /// Applies `action` to the pair `follower_id -> followed_id` in one
    /// transaction. Both users are locked for its duration, so concurrent
    /// transitions on the same pair are serialised.
    async fn transition_atomic(
        &self,
        follower_id: &Uuid,
        followed_id: &Uuid,
        action: FollowAction,
    ) -> Result<Transition, error::SystemError>;
}
