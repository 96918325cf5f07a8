use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{constants::PROFILE_PIC_ROUTE, modules::user::schema::UserEntity, ENV};

#[derive(Deserialize, Validate)]
pub struct SignUpModel {
    #[validate(length(min = 3, max = 64, message = "Username must be 3 to 64 characters long"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct SignInModel {
    #[validate(length(min = 3, message = "Username must be at least 3 characters long"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
}

#[derive(Deserialize, Validate)]
pub struct UpdateAccountModel {
    #[validate(length(min = 3, max = 64, message = "Username must be 3 to 64 characters long"))]
    pub username: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
    pub privacy: Option<bool>,
}

impl UpdateAccountModel {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.privacy.is_none()
    }
}

/// Token lifetimes and the signing secret, plus where account pictures live.
#[derive(Clone)]
pub struct AccountConfig {
    pub jwt_secret: String,
    pub access_token_expiration: u64,
    pub refresh_token_expiration: u64,
    pub upload_dir: String,
}

impl AccountConfig {
    pub fn from_env() -> Self {
        AccountConfig {
            jwt_secret: ENV.jwt_secret.clone(),
            access_token_expiration: ENV.access_token_expiration,
            refresh_token_expiration: ENV.refresh_token_expiration,
            upload_dir: ENV.upload_dir.clone(),
        }
    }
}

pub struct InsertUser {
    pub username: String,
    pub email: String,
    pub hash_password: String,
}

pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub privacy: Option<bool>,
}

#[derive(Serialize)]
pub struct SignUpResponse {
    pub id: Uuid,
}

#[derive(Serialize)]
pub struct SignInResponse {
    pub access_token: String,
}

pub fn profile_pic_url(profile_pic: &str) -> String {
    format!("{PROFILE_PIC_ROUTE}/{profile_pic}")
}

/// The account as seen by its owner.
#[derive(Debug, Deserialize, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub privacy: bool,
    pub profile_pic_url: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserEntity> for UserResponse {
    fn from(entity: UserEntity) -> Self {
        UserResponse {
            id: entity.id,
            profile_pic_url: profile_pic_url(&entity.profile_pic),
            username: entity.username,
            email: entity.email,
            privacy: entity.privacy,
            joined_at: entity.joined_at,
        }
    }
}

/// The account as seen by everybody else.
#[derive(Debug, Deserialize, Serialize)]
pub struct PublicUserResponse {
    pub id: Uuid,
    pub username: String,
    pub privacy: bool,
    pub profile_pic_url: String,
    pub joined_at: chrono::DateTime<chrono::Utc>,
}

impl From<UserEntity> for PublicUserResponse {
    fn from(entity: UserEntity) -> Self {
        PublicUserResponse {
            id: entity.id,
            profile_pic_url: profile_pic_url(&entity.profile_pic),
            username: entity.username,
            privacy: entity.privacy,
            joined_at: entity.joined_at,
        }
    }
}
