use crate::modules::follow::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/follows")
            .service(list_followers)
            .service(list_following)
            .service(list_follow_requests)
            .service(list_sent_follow_requests)
            .service(accept_follow_request)
            .service(decline_follow_request)
            .service(get_relationship)
            .service(cancel_follow_request)
            .service(follow_user)
            .service(unfollow_user),
    );
}
