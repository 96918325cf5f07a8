use actix_cors::Cors;
use actix_web::{
    self, http::header, middleware::{from_fn, Logger}, web, App, HttpServer,
};
use std::sync::{Arc, LazyLock};

use crate::{
    configs::{connect_database, RedisCache},
    middlewares::authentication,
    modules::{
        follow::{repository_pg::FollowRepositoryPg, service::FollowService},
        profile_pic::{model::UploadConfig, service::ProfilePicService},
        user::{model::AccountConfig, repository_pg::UserRepositoryPg, service::UserService},
    },
};

mod api;
mod configs;
mod constants;
mod middlewares;
mod modules;
#[cfg(test)]
mod test;
mod utils;

pub static ENV: LazyLock<constants::Env> = LazyLock::new(|| {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Environment variables loaded from .env file");
    constants::Env::default()
});

#[actix_web::get("/")]
async fn health_check() -> &'static str {
    "Server is running"
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let db_pool = connect_database().await.map_err(|e| {
        log::error!("Database connection error: {e}");
        std::io::Error::other("Database connection error")
    })?;

    let redis_pool = RedisCache::new().await.map_err(|e| {
        log::error!("Redis connection error: {e}");
        std::io::Error::other("Redis connection error")
    })?;

    let user_repo = Arc::new(UserRepositoryPg::new(db_pool.clone()));
    let follow_repo = Arc::new(FollowRepositoryPg::new(db_pool));

    let user_service = UserService::with_dependencies(
        user_repo.clone(),
        Arc::new(redis_pool),
        AccountConfig::from_env(),
    );
    let follow_service = FollowService::with_dependencies(follow_repo, user_repo.clone());
    let profile_pic_service = ProfilePicService::new(user_repo, UploadConfig::from_env());

    log::info!("Starting server at http://{}:{}", ENV.ip.as_str(), ENV.port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(ENV.frontend_url.as_str())
            .allowed_methods(vec!["GET", "POST", "PATCH", "DELETE"])
            .allowed_headers(vec![header::AUTHORIZATION, header::CONTENT_TYPE])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(follow_service.clone()))
            .app_data(web::Data::new(profile_pic_service.clone()))
            .service(health_check)
            .configure(modules::profile_pic::route::static_configure)
            .service(
                web::scope("/api").configure(modules::user::route::public_api_configure).service(
                    web::scope("")
                        .wrap(from_fn(authentication))
                        .configure(modules::user::route::configure)
                        .configure(modules::follow::route::configure),
                ),
            )
    })
    .bind((ENV.ip.as_str(), ENV.port))?
    .workers(2)
    .run()
    .await
}
