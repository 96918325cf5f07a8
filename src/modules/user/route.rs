use crate::modules::user::handle::*;
use actix_web::web::{scope, ServiceConfig};

pub fn public_api_configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/auth").service(sign_up).service(sign_in).service(refresh).service(sign_out),
    );
}

// profile routes go first so "/profile" never resolves as a username
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(
        scope("/users")
            .service(get_profile)
            .service(update_profile)
            .service(delete_profile)
            .configure(crate::modules::profile_pic::route::configure)
            .service(get_user),
    );
}
