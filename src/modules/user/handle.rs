use actix_web::{
    cookie::{time, Cookie},
    delete, get, patch, post, web, HttpRequest,
};

use crate::modules::user::{model, service::UserService};
use crate::{
    api::{error, success},
    middlewares::get_extensions,
    utils::{Claims, ValidatedJson},
    ENV,
};

fn refresh_cookie(value: String, max_age: i64) -> Cookie<'static> {
    Cookie::build("refresh_token", value)
        .path("/")
        .http_only(true)
        .max_age(time::Duration::seconds(max_age))
        .finish()
}

#[get("/profile")]
pub async fn get_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_extensions::<Claims>(&req)?.sub;
    let user = user_service.get_by_id(id).await?;
    Ok(success::Success::ok(Some(user)).message("Profile retrieved successfully"))
}

#[patch("/profile")]
pub async fn update_profile(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::UpdateAccountModel>,
    req: HttpRequest,
) -> Result<success::Success<model::UserResponse>, error::Error> {
    let id = get_extensions::<Claims>(&req)?.sub;
    let user = user_service.update_account(id, user_data.0).await?;
    Ok(success::Success::ok(Some(user)).message("Account updated successfully"))
}

#[delete("/profile")]
pub async fn delete_profile(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let id = get_extensions::<Claims>(&req)?.sub;
    user_service.delete_account(id).await?;
    Ok(success::Success::no_content().cookies(vec![expired_refresh_cookie()]))
}

#[get("/{username}")]
pub async fn get_user(
    user_service: web::Data<UserService>,
    username: web::Path<String>,
) -> Result<success::Success<model::PublicUserResponse>, error::Error> {
    let user = user_service.get_by_username(&username).await?;
    Ok(success::Success::ok(Some(user)).message("User retrieved successfully"))
}

#[post("/signup")]
pub async fn sign_up(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignUpModel>,
) -> Result<success::Success<model::SignUpResponse>, error::Error> {
    let user_id = user_service.sign_up(user_data.0).await?;
    Ok(success::Success::created(Some(model::SignUpResponse { id: user_id }))
        .message("Congratulations, you are now a registered user!"))
}

#[post("/signin")]
pub async fn sign_in(
    user_service: web::Data<UserService>,
    user_data: ValidatedJson<model::SignInModel>,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let (access_token, refresh_token) = user_service.sign_in(user_data.0).await?;
    let response = model::SignInResponse { access_token };

    Ok(success::Success::ok(Some(response))
        .message("Signin successful")
        .cookies(vec![refresh_cookie(refresh_token, ENV.refresh_token_expiration as i64)]))
}

fn expired_refresh_cookie() -> Cookie<'static> {
    let mut cookie = refresh_cookie(String::new(), 0);
    cookie.set_expires(time::OffsetDateTime::UNIX_EPOCH);
    cookie
}

#[get("/signout")]
pub async fn sign_out(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<()>, error::Error> {
    let refresh_token = req.cookie("refresh_token").map(|c| c.value().to_string());
    user_service.sign_out(refresh_token).await?;

    Ok(success::Success::no_content().cookies(vec![expired_refresh_cookie()]))
}

#[post("/refresh")]
pub async fn refresh(
    user_service: web::Data<UserService>,
    req: HttpRequest,
) -> Result<success::Success<model::SignInResponse>, error::Error> {
    let refresh_token = req.cookie("refresh_token").map(|c| c.value().to_string());
    let (access_token, refresh_token) = user_service.refresh(refresh_token).await?;
    let response = model::SignInResponse { access_token };

    Ok(success::Success::ok(Some(response))
        .message("Refresh successful")
        .cookies(vec![refresh_cookie(refresh_token, ENV.refresh_token_expiration as i64)]))
}
