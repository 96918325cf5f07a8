use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    Error, HttpMessage, HttpRequest,
};

use crate::{
    api::error,
    utils::{Claims, TypeClaims},
    ENV,
};

pub async fn authentication<B>(
    req: ServiceRequest,
    next: Next<B>,
) -> Result<ServiceResponse<B>, Error>
where
    B: MessageBody + 'static,
{
    let auth = req.headers().get("Authorization").and_then(|h| h.to_str().ok());
    let token = match auth.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(t) => t,
        None => {
            return Err(error::Error::unauthorized("Token Invalid or Expired").into());
        }
    };

    let claims = Claims::decode(token, ENV.jwt_secret.as_ref())
        .map_err(|_| error::Error::forbidden("Token Invalid or Expired"))?;

    if claims._type != Some(TypeClaims::AccessToken) {
        return Err(error::Error::forbidden("Token Invalid or Expired").into());
    }

    req.extensions_mut().insert(claims);

    next.call(req).await
}

pub fn get_extensions<T>(req: &HttpRequest) -> Result<T, error::Error>
where
    T: Clone + 'static,
{
    req.extensions()
        .get::<T>()
        .cloned()
        .ok_or_else(|| error::Error::unauthorized("Unauthorized"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn claims_are_read_back_from_extensions() {
        let req = TestRequest::default().to_http_request();
        assert!(get_extensions::<Claims>(&req).is_err());

        let sub = uuid::Uuid::now_v7();
        req.extensions_mut().insert(Claims::new(&sub, 60));
        assert_eq!(get_extensions::<Claims>(&req).unwrap().sub, sub);
    }
}
