use actix_web::web::{scope, ServiceConfig};

use crate::constants::PROFILE_PIC_ROUTE;
use crate::modules::profile_pic::handle::*;

/// Mounted inside the authenticated `/users` scope.
pub fn configure(cfg: &mut ServiceConfig) {
    cfg.service(upload_profile_pic);
}

pub fn static_configure(cfg: &mut ServiceConfig) {
    cfg.service(scope(PROFILE_PIC_ROUTE).service(serve_profile_pic));
}
