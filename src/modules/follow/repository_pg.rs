use uuid::Uuid;

use crate::{
    api::error,
    modules::follow::{
        model::{FollowUserResponse, FollowUserRow, PairEdges},
        repository::{FollowRepo, FollowRepository, FollowRequestRepository},
        schema::{FollowEntity, FollowRequestEntity},
        state::{self, FollowAction, PairState, Transition},
    },
};

#[derive(Clone)]
pub struct FollowRepositoryPg {
    pool: sqlx::PgPool,
}

impl FollowRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_users(
        &self,
        sql: &'static str,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        let rows = sqlx::query_as::<_, FollowUserRow>(sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(FollowUserResponse::from).collect())
    }
}

#[async_trait::async_trait]
impl FollowRepository for FollowRepositoryPg {
    async fn find_follow(
        &self,
        follower_id: &Uuid,
        followed_id: &Uuid,
    ) -> Result<Option<FollowEntity>, error::SystemError> {
        let follow = sqlx::query_as::<_, FollowEntity>(
            "SELECT * FROM follows WHERE follower_id = $1 AND followed_id = $2",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(follow)
    }

    async fn find_pair_edges(
        &self,
        actor_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<PairEdges, error::SystemError> {
        let edges = sqlx::query_as::<_, PairEdges>(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2)
                    AS following,
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $2 AND followed_id = $1)
                    AS followed_by,
                EXISTS (SELECT 1 FROM follow_requests WHERE follower_id = $1 AND followed_id = $2)
                    AS requested
            "#,
        )
        .bind(actor_id)
        .bind(other_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(edges)
    }

    async fn find_followers(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        self.fetch_users(
            r#"
            SELECT
                u.id,
                u.username,
                u.privacy,
                u.profile_pic,
                f.created_at AS since
            FROM follows f
            JOIN users u
                ON u.id = f.follower_id
            WHERE f.followed_id = $1
            ORDER BY f.created_at DESC
            "#,
            user_id,
        )
        .await
    }

    async fn find_following(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        self.fetch_users(
            r#"
            SELECT
                u.id,
                u.username,
                u.privacy,
                u.profile_pic,
                f.created_at AS since
            FROM follows f
            JOIN users u
                ON u.id = f.followed_id
            WHERE f.follower_id = $1
            ORDER BY f.created_at DESC
            "#,
            user_id,
        )
        .await
    }
}

#[async_trait::async_trait]
impl FollowRequestRepository for FollowRepositoryPg {
    async fn find_follow_request(
        &self,
        follower_id: &Uuid,
        followed_id: &Uuid,
    ) -> Result<Option<FollowRequestEntity>, error::SystemError> {
        let request = sqlx::query_as::<_, FollowRequestEntity>(
            "SELECT * FROM follow_requests WHERE follower_id = $1 AND followed_id = $2",
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(request)
    }

    async fn find_follow_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        self.fetch_users(
            r#"
            SELECT
                u.id,
                u.username,
                u.privacy,
                u.profile_pic,
                fr.created_at AS since
            FROM follow_requests fr
            JOIN users u
                ON u.id = fr.follower_id
            WHERE fr.followed_id = $1
            ORDER BY fr.created_at DESC
            "#,
            user_id,
        )
        .await
    }

    async fn find_follow_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        self.fetch_users(
            r#"
            SELECT
                u.id,
                u.username,
                u.privacy,
                u.profile_pic,
                fr.created_at AS since
            FROM follow_requests fr
            JOIN users u
                ON u.id = fr.followed_id
            WHERE fr.follower_id = $1
            ORDER BY fr.created_at DESC
            "#,
            user_id,
        )
        .await
    }
}

#[async_trait::async_trait]
impl FollowRepo for FollowRepositoryPg {
    async fn transition_atomic(
        &self,
        follower_id: &Uuid,
        followed_id: &Uuid,
        action: FollowAction,
    ) -> Result<Transition, error::SystemError> {
        let mut tx = self.pool.begin().await?;

        // lock in id order so two transitions on the same pair cannot deadlock
        let users = sqlx::query_as::<_, (Uuid, bool)>(
            "SELECT id, privacy FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(vec![*follower_id, *followed_id])
        .fetch_all(&mut *tx)
        .await?;

        if !users.iter().any(|(id, _)| id == follower_id) {
            return Err(error::SystemError::not_found("User not found"));
        }
        let target_private = users
            .iter()
            .find(|(id, _)| id == followed_id)
            .map(|(_, privacy)| *privacy)
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        let (confirmed, pending) = sqlx::query_as::<_, (bool, bool)>(
            r#"
            SELECT
                EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND followed_id = $2),
                EXISTS (SELECT 1 FROM follow_requests WHERE follower_id = $1 AND followed_id = $2)
            "#,
        )
        .bind(follower_id)
        .bind(followed_id)
        .fetch_one(&mut *tx)
        .await?;

        let transition =
            state::transition(PairState::from_edges(confirmed, pending)?, action, target_private)?;
        let changes = transition.edge_changes();

        if changes.delete_follow {
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND followed_id = $2")
                .bind(follower_id)
                .bind(followed_id)
                .execute(&mut *tx)
                .await?;
        }

        if changes.delete_request {
            sqlx::query("DELETE FROM follow_requests WHERE follower_id = $1 AND followed_id = $2")
                .bind(follower_id)
                .bind(followed_id)
                .execute(&mut *tx)
                .await?;
        }

        // no ON CONFLICT: a duplicate edge surfaces as a conflict
        if changes.insert_follow {
            sqlx::query("INSERT INTO follows (follower_id, followed_id) VALUES ($1, $2)")
                .bind(follower_id)
                .bind(followed_id)
                .execute(&mut *tx)
                .await?;
        }

        if changes.insert_request {
            sqlx::query("INSERT INTO follow_requests (follower_id, followed_id) VALUES ($1, $2)")
                .bind(follower_id)
                .bind(followed_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(transition)
    }
}
