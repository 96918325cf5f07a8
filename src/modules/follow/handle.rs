use actix_web::{delete, get, post, web, HttpRequest};

use crate::{
    api::{error, success},
    middlewares::get_extensions,
    modules::{
        follow::{
            model::{FollowStateResponse, FollowUserResponse, RelationshipResponse, UnfollowResponse},
            repository_pg::FollowRepositoryPg,
            service::FollowService,
            state::PairState,
        },
        user::repository_pg::UserRepositoryPg,
    },
    utils::Claims,
};

pub type FollowSvc = FollowService<FollowRepositoryPg, UserRepositoryPg>;

#[post("/{username}")]
pub async fn follow_user(
    follow_service: web::Data<FollowSvc>,
    username: web::Path<String>,
    req: HttpRequest,
) -> Result<success::Success<FollowStateResponse>, error::Error> {
    let follower_id = get_extensions::<Claims>(&req)?.sub;
    let username = username.into_inner();
    let target_id = follow_service.resolve_username(&username).await?;
    let state = follow_service.request(follower_id, target_id).await?;

    let message = match state {
        PairState::Pending => format!("Follow request sent to {username}."),
        _ => format!("You are following {username}!"),
    };
    Ok(success::Success::ok(Some(FollowStateResponse { username, state })).message(message))
}

#[delete("/{username}")]
pub async fn unfollow_user(
    follow_service: web::Data<FollowSvc>,
    username: web::Path<String>,
    req: HttpRequest,
) -> Result<success::Success<UnfollowResponse>, error::Error> {
    let follower_id = get_extensions::<Claims>(&req)?.sub;
    let username = username.into_inner();
    let target_id = follow_service.resolve_username(&username).await?;
    let removed = follow_service.withdraw(follower_id, target_id).await?;

    let message = format!("You are not following {username}.");
    Ok(success::Success::ok(Some(UnfollowResponse { username, removed })).message(message))
}

#[delete("/{username}/request")]
pub async fn cancel_follow_request(
    follow_service: web::Data<FollowSvc>,
    username: web::Path<String>,
    req: HttpRequest,
) -> Result<success::Success<UnfollowResponse>, error::Error> {
    let requester_id = get_extensions::<Claims>(&req)?.sub;
    let username = username.into_inner();
    let target_id = follow_service.resolve_username(&username).await?;
    let removed = follow_service.cancel_request(requester_id, target_id).await?;

    Ok(success::Success::ok(Some(UnfollowResponse { username, removed }))
        .message("Follow request cancelled"))
}

#[get("/{username}/relationship")]
pub async fn get_relationship(
    follow_service: web::Data<FollowSvc>,
    username: web::Path<String>,
    req: HttpRequest,
) -> Result<success::Success<RelationshipResponse>, error::Error> {
    let actor_id = get_extensions::<Claims>(&req)?.sub;
    let other_id = follow_service.resolve_username(&username).await?;
    let relationship = follow_service.relationship(actor_id, other_id).await?;

    Ok(success::Success::ok(Some(relationship)))
}

async fn respond(
    follow_service: web::Data<FollowSvc>,
    username: String,
    req: HttpRequest,
    accept: bool,
) -> Result<FollowStateResponse, error::Error> {
    let target_id = get_extensions::<Claims>(&req)?.sub;
    let requester_id = follow_service.resolve_username(&username).await?;
    let state = follow_service.respond(target_id, requester_id, accept).await?;
    Ok(FollowStateResponse { username, state })
}

#[post("/requests/{username}/accept")]
pub async fn accept_follow_request(
    follow_service: web::Data<FollowSvc>,
    username: web::Path<String>,
    req: HttpRequest,
) -> Result<success::Success<FollowStateResponse>, error::Error> {
    let response = respond(follow_service, username.into_inner(), req, true).await?;
    Ok(success::Success::ok(Some(response)).message("Follow request accepted"))
}

#[post("/requests/{username}/decline")]
pub async fn decline_follow_request(
    follow_service: web::Data<FollowSvc>,
    username: web::Path<String>,
    req: HttpRequest,
) -> Result<success::Success<FollowStateResponse>, error::Error> {
    let response = respond(follow_service, username.into_inner(), req, false).await?;
    Ok(success::Success::ok(Some(response)).message("Follow request declined"))
}

#[get("/requests")]
pub async fn list_follow_requests(
    follow_service: web::Data<FollowSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FollowUserResponse>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let requests = follow_service.incoming_requests(user_id).await?;

    Ok(success::Success::ok(Some(requests)).message("Follow requests retrieved successfully"))
}

#[get("/requests/outgoing")]
pub async fn list_sent_follow_requests(
    follow_service: web::Data<FollowSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FollowUserResponse>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let requests = follow_service.outgoing_requests(user_id).await?;

    Ok(success::Success::ok(Some(requests)).message("Sent follow requests retrieved successfully"))
}

#[get("/followers")]
pub async fn list_followers(
    follow_service: web::Data<FollowSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FollowUserResponse>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let followers = follow_service.followers(user_id).await?;

    Ok(success::Success::ok(Some(followers)).message("Followers retrieved successfully"))
}

#[get("/following")]
pub async fn list_following(
    follow_service: web::Data<FollowSvc>,
    req: HttpRequest,
) -> Result<success::Success<Vec<FollowUserResponse>>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let following = follow_service.following(user_id).await?;

    Ok(success::Success::ok(Some(following)).message("Following retrieved successfully"))
}
