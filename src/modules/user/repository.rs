use uuid::Uuid;

use crate::{
    api::error,
    modules::user::{
        model::{InsertUser, UpdateUser},
        schema::UserEntity,
    },
};

#[async_trait::async_trait]
pub trait UserRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError>;
    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError>;
    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError>;

    /// Swaps the stored picture and returns the one it replaced.
    async fn replace_profile_pic(
        &self,
        id: &Uuid,
        profile_pic: &str,
    ) -> Result<String, error::SystemError>;

    /// Removes the user together with every follow edge and request touching it.
    async fn delete(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError>;
}
