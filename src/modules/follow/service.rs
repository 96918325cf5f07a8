use std::sync::Arc;

use log::info;
use uuid::Uuid;

use crate::{
    api::error,
    modules::{
        follow::{
            model::{FollowUserResponse, RelationshipResponse},
            repository::FollowRepo,
            state::{FollowAction, PairState},
        },
        user::repository::UserRepository,
    },
};

/// The social graph manager. Every operation names all of its participants
/// explicitly; nothing here knows who is signed in.
#[derive(Clone)]
pub struct FollowService<R, U>
where
    R: FollowRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    follow_repo: Arc<R>,
    user_repo: Arc<U>,
}

fn ensure_distinct(actor_id: &Uuid, target_id: &Uuid) -> Result<(), error::SystemError> {
    if actor_id == target_id {
        return Err(error::SystemError::invalid_actor("You cannot follow yourself!"));
    }
    Ok(())
}

impl<R, U> FollowService<R, U>
where
    R: FollowRepo + Send + Sync,
    U: UserRepository + Send + Sync,
{
    pub fn with_dependencies(follow_repo: Arc<R>, user_repo: Arc<U>) -> Self {
        info!("FollowService initialized with dependencies");
        FollowService { follow_repo, user_repo }
    }

    pub async fn resolve_username(&self, username: &str) -> Result<Uuid, error::SystemError> {
        self.user_repo
            .find_by_username(username)
            .await?
            .map(|user| user.id)
            .ok_or_else(|| error::SystemError::not_found(format!("User {username} not found.")))
    }

    pub async fn is_following(&self, a: Uuid, b: Uuid) -> Result<bool, error::SystemError> {
        Ok(self.follow_repo.find_follow(&a, &b).await?.is_some())
    }

    pub async fn is_followed_by(&self, a: Uuid, b: Uuid) -> Result<bool, error::SystemError> {
        Ok(self.follow_repo.find_follow(&b, &a).await?.is_some())
    }

    pub async fn requested_to_follow(&self, a: Uuid, b: Uuid) -> Result<bool, error::SystemError> {
        Ok(self.follow_repo.find_follow_request(&a, &b).await?.is_some())
    }

    pub async fn relationship(
        &self,
        actor_id: Uuid,
        other_id: Uuid,
    ) -> Result<RelationshipResponse, error::SystemError> {
        let edges = self.follow_repo.find_pair_edges(&actor_id, &other_id).await?;

        Ok(RelationshipResponse {
            is_following: edges.following,
            is_followed_by: edges.followed_by,
            requested_to_follow: edges.requested,
            state: PairState::observed(edges.following, edges.requested),
        })
    }

    /// Follows a public account directly and asks a private one for approval.
    pub async fn request(
        &self,
        follower_id: Uuid,
        target_id: Uuid,
    ) -> Result<PairState, error::SystemError> {
        ensure_distinct(&follower_id, &target_id)?;

        let transition = self
            .follow_repo
            .transition_atomic(&follower_id, &target_id, FollowAction::Request)
            .await?;

        if transition.changed() {
            info!("{} -> {}: {:?} to {:?}", follower_id, target_id, transition.from, transition.to);
        }
        Ok(transition.to)
    }

    /// `target_id` answers the pending request sent by `requester_id`.
    pub async fn respond(
        &self,
        target_id: Uuid,
        requester_id: Uuid,
        accept: bool,
    ) -> Result<PairState, error::SystemError> {
        ensure_distinct(&target_id, &requester_id)?;

        let transition = self
            .follow_repo
            .transition_atomic(&requester_id, &target_id, FollowAction::Respond { accept })
            .await?;

        info!(
            "{} {} follow request from {}",
            target_id,
            if accept { "accepted" } else { "declined" },
            requester_id
        );
        Ok(transition.to)
    }

    /// Returns whether a pending request was withdrawn.
    pub async fn cancel_request(
        &self,
        requester_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, error::SystemError> {
        ensure_distinct(&requester_id, &target_id)?;

        let transition = self
            .follow_repo
            .transition_atomic(&requester_id, &target_id, FollowAction::CancelRequest)
            .await?;

        Ok(transition.changed())
    }

    /// Returns whether a confirmed follow was removed.
    pub async fn unfollow(
        &self,
        follower_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, error::SystemError> {
        ensure_distinct(&follower_id, &target_id)?;

        let transition = self
            .follow_repo
            .transition_atomic(&follower_id, &target_id, FollowAction::Unfollow)
            .await?;

        if transition.changed() {
            info!("{} unfollowed {}", follower_id, target_id);
        }
        Ok(transition.changed())
    }

    /// Unfollows, or withdraws the pending request when there is no follow yet.
    pub async fn withdraw(
        &self,
        follower_id: Uuid,
        target_id: Uuid,
    ) -> Result<bool, error::SystemError> {
        if self.unfollow(follower_id, target_id).await? {
            return Ok(true);
        }
        self.cancel_request(follower_id, target_id).await
    }

    pub async fn followers(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        self.follow_repo.find_followers(&user_id).await
    }

    pub async fn following(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        self.follow_repo.find_following(&user_id).await
    }

    pub async fn incoming_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        self.follow_repo.find_follow_requests_to_user(&user_id).await
    }

    pub async fn outgoing_requests(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        self.follow_repo.find_follow_requests_from_user(&user_id).await
    }
}
