use actix_multipart::Multipart;
use actix_web::{get, http::header, post, web, HttpRequest, HttpResponse};
use futures_util::TryStreamExt;
use std::path::Path;

use crate::{
    api::{error, success},
    middlewares::get_extensions,
    modules::{
        profile_pic::{
            model::ProfilePicResponse,
            service::{is_stored_name, ProfilePicService},
        },
        user::{repository_pg::UserRepositoryPg, service::UserService},
    },
    utils::Claims,
};

pub type ProfilePicSvc = ProfilePicService<UserRepositoryPg>;

#[post("/profile/picture")]
pub async fn upload_profile_pic(
    mut payload: Multipart,
    req: HttpRequest,
    service: web::Data<ProfilePicSvc>,
    user_service: web::Data<UserService>,
) -> Result<success::Success<ProfilePicResponse>, error::Error> {
    let user_id = get_extensions::<Claims>(&req)?.sub;
    let max_size = service.config().max_file_size;

    let Some(mut field) =
        payload.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    else {
        return Err(error::Error::bad_request("No file found in request"));
    };

    let filename = field
        .content_disposition()
        .and_then(|cd| cd.get_filename())
        .map(str::to_string)
        .ok_or_else(|| error::Error::bad_request("Missing filename"))?;

    // trust the part's content type unless the client left it generic
    let mime_type = match field.content_type() {
        Some(m) if m.essence_str() != "application/octet-stream" => m.essence_str().to_string(),
        _ => mime_guess::from_path(&filename).first_or_octet_stream().essence_str().to_string(),
    };

    let mut bytes = Vec::new();
    while let Some(chunk) =
        field.try_next().await.map_err(|e| error::Error::bad_request(e.to_string()))?
    {
        if bytes.len() + chunk.len() > max_size {
            return Err(error::Error::PayloadTooLarge(
                format!("File size exceeds maximum allowed size of {max_size} bytes").into(),
            ));
        }
        bytes.extend_from_slice(&chunk);
    }

    let result = service.upload(user_id, bytes, mime_type).await?;
    user_service.evict(&user_id).await;

    Ok(success::Success::ok(Some(result)).message("Your profile picture has been updated"))
}

#[get("/{filename}")]
pub async fn serve_profile_pic(
    filename: web::Path<String>,
    service: web::Data<ProfilePicSvc>,
) -> Result<HttpResponse, error::Error> {
    if !is_stored_name(&filename) {
        return Err(error::Error::not_found("Picture not found"));
    }

    let path = Path::new(&service.config().upload_dir).join(filename.as_str());
    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => error::Error::not_found("Picture not found"),
        _ => error::Error::from(error::SystemError::from(e)),
    })?;

    let mime = mime_guess::from_path(&path).first_or_octet_stream();
    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, mime.essence_str().to_string()))
        .insert_header((header::CACHE_CONTROL, "public, max-age=86400"))
        .body(bytes))
}
