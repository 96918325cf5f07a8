use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::{InsertUser, UpdateUser},
        repository::UserRepository,
        schema::UserEntity,
    },
};

#[derive(Clone)]
pub struct UserRepositoryPg {
    pool: sqlx::PgPool,
}

impl UserRepositoryPg {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UserRepository for UserRepositoryPg {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            "SELECT * FROM users WHERE lower(username) = lower($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError> {
        let id = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));
        sqlx::query("INSERT INTO users (id, username, email, hash_password) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.hash_password)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError> {
        let user = sqlx::query_as::<_, UserEntity>(
            r#"
        UPDATE users
        SET
            username   = COALESCE($2, username),
            email      = COALESCE($3, email),
            privacy    = COALESCE($4, privacy),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
        )
        .bind(id)
        .bind(&user.username) // $2: Option<String>
        .bind(&user.email) // $3: Option<String>
        .bind(user.privacy) // $4: Option<bool>
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        Ok(user)
    }

    async fn replace_profile_pic(
        &self,
        id: &Uuid,
        profile_pic: &str,
    ) -> Result<String, error::SystemError> {
        let previous = sqlx::query_scalar::<_, String>(
            r#"
            UPDATE users u
            SET profile_pic = $2, updated_at = NOW()
            FROM (SELECT id, profile_pic FROM users WHERE id = $1 FOR UPDATE) old
            WHERE u.id = old.id
            RETURNING old.profile_pic
            "#,
        )
        .bind(id)
        .bind(profile_pic)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        Ok(previous)
    }

    async fn delete(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        // follows and follow_requests reference users with ON DELETE CASCADE
        let user = sqlx::query_as::<_, UserEntity>("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}
