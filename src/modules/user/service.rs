use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error;
use crate::configs::Cache;
use crate::constants::USER_CACHE_TTL;
use crate::modules::profile_pic::service::remove_stored_picture;
use crate::modules::user::model::{
    AccountConfig, InsertUser, PublicUserResponse, SignInModel, SignUpModel, UpdateAccountModel,
    UpdateUser, UserResponse,
};
use crate::modules::user::repository::UserRepository;
use crate::utils::{hash_password, verify_password, Claims, TypeClaims};

fn user_key(id: &Uuid) -> String {
    format!("user:{id}")
}

fn refresh_key(jti: &Uuid) -> String {
    format!("refresh_token:{jti}")
}

#[derive(Clone)]
pub struct UserService {
    repo: Arc<dyn UserRepository + Send + Sync>,
    cache: Arc<dyn Cache>,
    config: AccountConfig,
}

impl UserService {
    pub fn with_dependencies(
        repo: Arc<dyn UserRepository + Send + Sync>,
        cache: Arc<dyn Cache>,
        config: AccountConfig,
    ) -> Self {
        info!("UserService initialized with dependencies");
        UserService { repo, cache, config }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<UserResponse, error::SystemError> {
        let key = user_key(&id);
        if let Some(cached_user) = self.cache.get::<UserResponse>(&key).await? {
            info!("User {} found in cache", id);
            return Ok(cached_user);
        }
        let entity = self
            .repo
            .find_by_id(&id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        let user = UserResponse::from(entity);
        self.cache.set(&key, &user, USER_CACHE_TTL).await?;
        info!("User {} cached", id);
        Ok(user)
    }

    pub async fn get_by_username(
        &self,
        username: &str,
    ) -> Result<PublicUserResponse, error::SystemError> {
        self.repo
            .find_by_username(username)
            .await?
            .map(PublicUserResponse::from)
            .ok_or_else(|| error::SystemError::not_found(format!("User {username} not found")))
    }

    pub async fn update_account(
        &self,
        id: Uuid,
        user: UpdateAccountModel,
    ) -> Result<UserResponse, error::SystemError> {
        if user.is_empty() {
            return Err(error::SystemError::bad_request("No fields to update"));
        }

        let update_user =
            UpdateUser { username: user.username, email: user.email, privacy: user.privacy };

        let updated = self.repo.update(&id, &update_user).await?;
        self.evict(&id).await;
        Ok(UserResponse::from(updated))
    }

    pub async fn delete_account(&self, id: Uuid) -> Result<(), error::SystemError> {
        let user = self
            .repo
            .delete(&id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        info!("User {} deleted with all follow edges", id);
        self.evict(&id).await;
        remove_stored_picture(&self.config.upload_dir, &user.profile_pic).await;
        Ok(())
    }

    pub async fn sign_up(&self, user: SignUpModel) -> Result<Uuid, error::SystemError> {
        let hash_password = hash_password(&user.password)?;

        let new_user =
            InsertUser { username: user.username, email: user.email, hash_password };

        let user_id = self.repo.create(&new_user).await?;
        info!("User {} signed up", user_id);
        Ok(user_id)
    }

    pub async fn sign_in(&self, user: SignInModel) -> Result<(String, String), error::SystemError> {
        let user_entity = self
            .repo
            .find_by_username(&user.username)
            .await?
            .ok_or_else(|| error::SystemError::unauthorized("Invalid username or password"))?;

        let valid = verify_password(&user_entity.hash_password, &user.password)?;
        if !valid {
            return Err(error::SystemError::unauthorized("Invalid username or password"));
        }

        self.issue_tokens(&user_entity.id).await
    }

    pub async fn refresh(
        &self,
        refresh_token: Option<String>,
    ) -> Result<(String, String), error::SystemError> {
        let token = refresh_token
            .ok_or_else(|| error::SystemError::unauthorized("Missing refresh token"))?;

        let claims = Claims::decode(&token, self.config.jwt_secret.as_ref())
            .map_err(|_| error::SystemError::unauthorized("Refresh token invalid or expired"))?;

        let jti = match (&claims._type, claims.jti) {
            (Some(TypeClaims::RefreshToken), Some(jti)) => jti,
            _ => return Err(error::SystemError::unauthorized("Refresh token invalid or expired")),
        };

        // one-shot: a revoked or already rotated token is gone from the cache
        if !self.cache.delete(&refresh_key(&jti)).await? {
            return Err(error::SystemError::unauthorized("Refresh token invalid or expired"));
        }

        // tokens outlive a deleted account until they expire
        if self.repo.find_by_id(&claims.sub).await?.is_none() {
            return Err(error::SystemError::unauthorized("Refresh token invalid or expired"));
        }

        self.issue_tokens(&claims.sub).await
    }

    pub async fn sign_out(&self, refresh_token: Option<String>) -> Result<(), error::SystemError> {
        let Some(token) = refresh_token else {
            return Ok(());
        };

        if let Ok(Claims { jti: Some(jti), .. }) =
            Claims::decode(&token, self.config.jwt_secret.as_ref())
        {
            self.cache.delete(&refresh_key(&jti)).await?;
        }
        Ok(())
    }

    async fn issue_tokens(&self, user_id: &Uuid) -> Result<(String, String), error::SystemError> {
        let access_token = Claims::new(user_id, self.config.access_token_expiration)
            .with_type(TypeClaims::AccessToken)
            .encode(self.config.jwt_secret.as_ref())?;

        let jti = Uuid::new_v7(uuid::Timestamp::now(uuid::NoContext));

        let refresh_token = Claims::new(user_id, self.config.refresh_token_expiration)
            .with_jti(jti)
            .with_type(TypeClaims::RefreshToken)
            .encode(self.config.jwt_secret.as_ref())?;

        self.cache
            .set(&refresh_key(&jti), user_id, self.config.refresh_token_expiration as usize)
            .await?;

        Ok((access_token, refresh_token))
    }

    pub async fn evict(&self, id: &Uuid) {
        if let Err(e) = self.cache.delete(&user_key(id)).await {
            warn!("Failed to evict cached user {}: {}", id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::Error;
    use crate::test::{MemoryCache, MemoryUsers};

    struct Fixture {
        users: Arc<MemoryUsers>,
        cache: Arc<MemoryCache>,
        service: UserService,
    }

    fn fixture() -> Fixture {
        let users = Arc::new(MemoryUsers::default());
        let cache = Arc::new(MemoryCache::default());
        let config = AccountConfig {
            jwt_secret: "account-tests-secret".to_string(),
            access_token_expiration: 900,
            refresh_token_expiration: 3600,
            upload_dir: std::env::temp_dir().join("account-tests").display().to_string(),
        };
        let service = UserService::with_dependencies(users.clone(), cache.clone(), config);
        Fixture { users, cache, service }
    }

    fn sign_up_model(username: &str) -> SignUpModel {
        SignUpModel {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "correct horse".to_string(),
        }
    }

    fn sign_in_model(username: &str, password: &str) -> SignInModel {
        SignInModel { username: username.to_string(), password: password.to_string() }
    }

    #[actix_web::test]
    async fn sign_up_creates_a_private_account() {
        let f = fixture();
        let id = f.service.sign_up(sign_up_model("alice")).await.unwrap();

        let profile = f.service.get_by_id(id).await.unwrap();
        assert_eq!(profile.username, "alice");
        assert!(profile.privacy);
    }

    #[actix_web::test]
    async fn duplicate_sign_up_is_a_conflict() {
        let f = fixture();
        f.service.sign_up(sign_up_model("alice")).await.unwrap();

        let err = f.service.sign_up(sign_up_model("alice")).await.unwrap_err();
        let Error::Conflict(msg) = Error::from(err) else {
            panic!("expected conflict");
        };
        assert_eq!(msg, "Username already exists");
    }

    #[actix_web::test]
    async fn sign_in_does_not_reveal_which_credential_was_wrong() {
        let f = fixture();
        f.service.sign_up(sign_up_model("alice")).await.unwrap();

        let unknown = f.service.sign_in(sign_in_model("mallory", "correct horse")).await;
        let wrong = f.service.sign_in(sign_in_model("alice", "battery staple")).await;

        let (Err(error::SystemError::Unauthorized(a)), Err(error::SystemError::Unauthorized(b))) =
            (unknown, wrong)
        else {
            panic!("expected both sign-ins to be unauthorized");
        };
        assert_eq!(a, b);
    }

    #[actix_web::test]
    async fn empty_update_is_rejected() {
        let f = fixture();
        let id = f.users.add("alice", true);

        let empty = UpdateAccountModel { username: None, email: None, privacy: None };
        let err = f.service.update_account(id, empty).await.unwrap_err();
        assert!(matches!(err, error::SystemError::BadRequest(_)));
    }

    #[actix_web::test]
    async fn update_evicts_the_cached_profile() {
        let f = fixture();
        let id = f.users.add("alice", true);
        assert!(f.service.get_by_id(id).await.unwrap().privacy);

        let public = UpdateAccountModel { username: None, email: None, privacy: Some(false) };
        f.service.update_account(id, public).await.unwrap();

        assert!(!f.service.get_by_id(id).await.unwrap().privacy);
    }

    #[actix_web::test]
    async fn refresh_tokens_are_single_use() {
        let f = fixture();
        f.service.sign_up(sign_up_model("alice")).await.unwrap();
        let (_, refresh) =
            f.service.sign_in(sign_in_model("alice", "correct horse")).await.unwrap();

        let (_, rotated) = f.service.refresh(Some(refresh.clone())).await.unwrap();
        assert_ne!(rotated, refresh);

        let replay = f.service.refresh(Some(refresh)).await.unwrap_err();
        assert!(matches!(replay, error::SystemError::Unauthorized(_)));

        assert!(f.service.refresh(Some(rotated)).await.is_ok());
    }

    #[actix_web::test]
    async fn sign_out_revokes_the_refresh_token() {
        let f = fixture();
        f.service.sign_up(sign_up_model("alice")).await.unwrap();
        let (_, refresh) =
            f.service.sign_in(sign_in_model("alice", "correct horse")).await.unwrap();

        f.service.sign_out(Some(refresh.clone())).await.unwrap();

        let err = f.service.refresh(Some(refresh)).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Unauthorized(_)));
    }

    #[actix_web::test]
    async fn access_token_is_not_a_refresh_token() {
        let f = fixture();
        f.service.sign_up(sign_up_model("alice")).await.unwrap();
        let (access, _) = f.service.sign_in(sign_in_model("alice", "correct horse")).await.unwrap();

        let err = f.service.refresh(Some(access)).await.unwrap_err();
        assert!(matches!(err, error::SystemError::Unauthorized(_)));
        assert!(matches!(
            f.service.refresh(None).await,
            Err(error::SystemError::Unauthorized(_))
        ));
    }

    #[actix_web::test]
    async fn delete_account_evicts_cache_and_stops_refresh() {
        let f = fixture();
        let id = f.service.sign_up(sign_up_model("alice")).await.unwrap();
        let (_, refresh) =
            f.service.sign_in(sign_in_model("alice", "correct horse")).await.unwrap();
        f.service.get_by_id(id).await.unwrap();
        assert!(f.cache.contains(&user_key(&id)));

        f.service.delete_account(id).await.unwrap();

        assert!(!f.cache.contains(&user_key(&id)));
        assert!(matches!(
            f.service.get_by_id(id).await,
            Err(error::SystemError::NotFound(_))
        ));
        assert!(matches!(
            f.service.refresh(Some(refresh)).await,
            Err(error::SystemError::Unauthorized(_))
        ));
        assert!(matches!(
            f.service.delete_account(id).await,
            Err(error::SystemError::NotFound(_))
        ));
    }

    #[actix_web::test]
    async fn public_lookup_is_case_insensitive_and_404s() {
        let f = fixture();
        f.users.add("alice", true);

        assert_eq!(f.service.get_by_username("ALICE").await.unwrap().username, "alice");
        assert!(matches!(
            f.service.get_by_username("nobody").await,
            Err(error::SystemError::NotFound(_))
        ));
    }
}
