//! In-memory repositories for service tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    api::error,
    configs::Cache,
    constants::DEFAULT_PROFILE_PIC,
    modules::{
        follow::{
            model::{FollowUserResponse, PairEdges},
            repository::{FollowRepo, FollowRepository, FollowRequestRepository},
            schema::{FollowEntity, FollowRequestEntity},
            state::{self, FollowAction, PairState, Transition},
        },
        user::{
            model::{profile_pic_url, InsertUser, UpdateUser},
            repository::UserRepository,
            schema::UserEntity,
        },
    },
};

#[derive(Default)]
pub struct MemoryUsers {
    users: Mutex<Vec<UserEntity>>,
}

impl MemoryUsers {
    pub fn add(&self, username: &str, privacy: bool) -> Uuid {
        let now = Utc::now();
        let id = Uuid::now_v7();
        self.users.lock().unwrap().push(UserEntity {
            id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            hash_password: String::new(),
            privacy,
            profile_pic: DEFAULT_PROFILE_PIC.to_string(),
            joined_at: now,
            updated_at: now,
        });
        id
    }

    pub fn set_privacy(&self, id: &Uuid, privacy: bool) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == *id) {
            user.privacy = privacy;
        }
    }

    fn get(&self, id: &Uuid) -> Option<UserEntity> {
        self.users.lock().unwrap().iter().find(|u| u.id == *id).cloned()
    }
}

#[async_trait::async_trait]
impl UserRepository for MemoryUsers {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        Ok(self.get(id))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserEntity>, error::SystemError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.username.eq_ignore_ascii_case(username)).cloned())
    }

    async fn create(&self, user: &InsertUser) -> Result<Uuid, error::SystemError> {
        if self.find_by_username(&user.username).await?.is_some() {
            return Err(error::SystemError::conflict("users_username"));
        }
        let now = Utc::now();
        let id = Uuid::now_v7();
        self.users.lock().unwrap().push(UserEntity {
            id,
            username: user.username.clone(),
            email: user.email.clone(),
            hash_password: user.hash_password.clone(),
            privacy: true,
            profile_pic: DEFAULT_PROFILE_PIC.to_string(),
            joined_at: now,
            updated_at: now,
        });
        Ok(id)
    }

    async fn update(&self, id: &Uuid, user: &UpdateUser) -> Result<UserEntity, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        let entity = users
            .iter_mut()
            .find(|u| u.id == *id)
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;
        if let Some(username) = &user.username {
            entity.username = username.clone();
        }
        if let Some(email) = &user.email {
            entity.email = email.clone();
        }
        if let Some(privacy) = user.privacy {
            entity.privacy = privacy;
        }
        Ok(entity.clone())
    }

    async fn replace_profile_pic(
        &self,
        id: &Uuid,
        profile_pic: &str,
    ) -> Result<String, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        let entity = users
            .iter_mut()
            .find(|u| u.id == *id)
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;
        Ok(std::mem::replace(&mut entity.profile_pic, profile_pic.to_string()))
    }

    async fn delete(&self, id: &Uuid) -> Result<Option<UserEntity>, error::SystemError> {
        let mut users = self.users.lock().unwrap();
        let position = users.iter().position(|u| u.id == *id);
        Ok(position.map(|i| users.remove(i)))
    }
}

/// Cache without expiry.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap().contains_key(key)
    }
}

#[async_trait::async_trait]
impl Cache for MemoryCache {
    async fn get_bytes(&self, key: &str) -> Result<Option<Vec<u8>>, error::SystemError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set_bytes(
        &self,
        key: &str,
        value: Vec<u8>,
        _expiration: usize,
    ) -> Result<(), error::SystemError> {
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, error::SystemError> {
        Ok(self.entries.lock().unwrap().remove(key).is_some())
    }
}

type Pair = (Uuid, Uuid);

#[derive(Default)]
struct Edges {
    follows: HashMap<Pair, DateTime<Utc>>,
    requests: HashMap<Pair, DateTime<Utc>>,
}

/// Follow relations keyed by ordered pair. A single lock plays the part of
/// the database transaction.
pub struct MemoryGraph {
    users: Arc<MemoryUsers>,
    edges: Mutex<Edges>,
}

impl MemoryGraph {
    pub fn new(users: Arc<MemoryUsers>) -> Self {
        Self { users, edges: Mutex::new(Edges::default()) }
    }

    /// Writes edges directly, bypassing the state machine.
    pub fn seed(&self, follower_id: Uuid, followed_id: Uuid, follow: bool, request: bool) {
        let mut edges = self.edges.lock().unwrap();
        let pair = (follower_id, followed_id);
        if follow {
            edges.follows.insert(pair, Utc::now());
        }
        if request {
            edges.requests.insert(pair, Utc::now());
        }
    }

    pub fn edge_count(&self) -> (usize, usize) {
        let edges = self.edges.lock().unwrap();
        (edges.follows.len(), edges.requests.len())
    }

    fn list(
        &self,
        pick: impl Fn(&Edges) -> Vec<(Uuid, DateTime<Utc>)>,
    ) -> Vec<FollowUserResponse> {
        let mut rows = pick(&self.edges.lock().unwrap());
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows.into_iter()
            .filter_map(|(id, since)| {
                self.users.get(&id).map(|u| FollowUserResponse {
                    id: u.id,
                    username: u.username,
                    privacy: u.privacy,
                    profile_pic_url: profile_pic_url(&u.profile_pic),
                    since,
                })
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl FollowRepository for MemoryGraph {
    async fn find_follow(
        &self,
        follower_id: &Uuid,
        followed_id: &Uuid,
    ) -> Result<Option<FollowEntity>, error::SystemError> {
        let edges = self.edges.lock().unwrap();
        Ok(edges.follows.get(&(*follower_id, *followed_id)).map(|created_at| FollowEntity {
            follower_id: *follower_id,
            followed_id: *followed_id,
            created_at: *created_at,
        }))
    }

    async fn find_pair_edges(
        &self,
        actor_id: &Uuid,
        other_id: &Uuid,
    ) -> Result<PairEdges, error::SystemError> {
        let edges = self.edges.lock().unwrap();
        Ok(PairEdges {
            following: edges.follows.contains_key(&(*actor_id, *other_id)),
            followed_by: edges.follows.contains_key(&(*other_id, *actor_id)),
            requested: edges.requests.contains_key(&(*actor_id, *other_id)),
        })
    }

    async fn find_followers(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        Ok(self.list(|e| {
            e.follows.iter().filter(|((_, b), _)| b == user_id).map(|((a, _), t)| (*a, *t)).collect()
        }))
    }

    async fn find_following(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        Ok(self.list(|e| {
            e.follows.iter().filter(|((a, _), _)| a == user_id).map(|((_, b), t)| (*b, *t)).collect()
        }))
    }
}

#[async_trait::async_trait]
impl FollowRequestRepository for MemoryGraph {
    async fn find_follow_request(
        &self,
        follower_id: &Uuid,
        followed_id: &Uuid,
    ) -> Result<Option<FollowRequestEntity>, error::SystemError> {
        let edges = self.edges.lock().unwrap();
        Ok(edges.requests.get(&(*follower_id, *followed_id)).map(|created_at| {
            FollowRequestEntity {
                follower_id: *follower_id,
                followed_id: *followed_id,
                created_at: *created_at,
            }
        }))
    }

    async fn find_follow_requests_to_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        Ok(self.list(|e| {
            e.requests.iter().filter(|((_, b), _)| b == user_id).map(|((a, _), t)| (*a, *t)).collect()
        }))
    }

    async fn find_follow_requests_from_user(
        &self,
        user_id: &Uuid,
    ) -> Result<Vec<FollowUserResponse>, error::SystemError> {
        Ok(self.list(|e| {
            e.requests.iter().filter(|((a, _), _)| a == user_id).map(|((_, b), t)| (*b, *t)).collect()
        }))
    }
}

#[async_trait::async_trait]
impl FollowRepo for MemoryGraph {
    async fn transition_atomic(
        &self,
        follower_id: &Uuid,
        followed_id: &Uuid,
        action: FollowAction,
    ) -> Result<Transition, error::SystemError> {
        let mut edges = self.edges.lock().unwrap();

        if self.users.get(follower_id).is_none() {
            return Err(error::SystemError::not_found("User not found"));
        }
        let target = self
            .users
            .get(followed_id)
            .ok_or_else(|| error::SystemError::not_found("User not found"))?;

        let pair = (*follower_id, *followed_id);
        let from =
            PairState::from_edges(edges.follows.contains_key(&pair), edges.requests.contains_key(&pair))?;
        let transition = state::transition(from, action, target.privacy)?;
        let changes = transition.edge_changes();

        if changes.delete_follow {
            edges.follows.remove(&pair);
        }
        if changes.delete_request {
            edges.requests.remove(&pair);
        }
        if changes.insert_follow && edges.follows.insert(pair, Utc::now()).is_some() {
            return Err(error::SystemError::conflict("follows_pkey"));
        }
        if changes.insert_request && edges.requests.insert(pair, Utc::now()).is_some() {
            return Err(error::SystemError::conflict("follow_requests_pkey"));
        }

        Ok(transition)
    }
}
