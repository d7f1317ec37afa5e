use actix_web::{
    dev::Payload,
    error::ResponseError,
    http::StatusCode,
    web::{self, Bytes},
    FromRequest, HttpRequest, HttpResponse,
};
use futures::future::{self, FutureExt, LocalBoxFuture};

use crate::gatekeeper::{self, Delivery, Gatekeeper, Rejection};

/// A delivery the gatekeeper let through, with the body decoded as `T`.
///
/// Handlers taking this extractor only run for authentic deliveries that
/// passed every filter. The gatekeeper is looked up in `app_data`, see
/// [`Gatekeeper::resource`].
#[derive(Debug, Clone)]
pub struct Webhook<T> {
    pub delivery: Delivery,
    pub payload: T,
}

impl<T> Webhook<T> {
    pub fn into_inner(self) -> T {
        self.payload
    }
}

impl ResponseError for Rejection {
    fn status_code(&self) -> StatusCode {
        match self {
            Rejection::InvalidMethod
            | Rejection::MissingUserAgent
            | Rejection::InvalidUserAgent
            | Rejection::MissingSignature
            | Rejection::MissingEvent
            | Rejection::MissingBody
            | Rejection::InvalidBody(_) => StatusCode::BAD_REQUEST,
            Rejection::Ignored(_) => StatusCode::OK,
            Rejection::InvalidSignature(_) => StatusCode::UNAUTHORIZED,
            Rejection::Payload(err) => err.as_response_error().status_code(),
            Rejection::NoGatekeeper => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            // Not interested is not a failure, GitHub shouldn't retry it.
            Rejection::Ignored(_) => HttpResponse::Ok().finish(),
            Rejection::Payload(err) => err.as_response_error().error_response(),
            _ => HttpResponse::build(self.status_code())
                .content_type("text/plain; charset=utf-8")
                .body(self.to_string()),
        }
    }
}

impl Gatekeeper {
    /// A resource at `path` guarded by this gatekeeper. Handlers should be
    /// registered for every method (`.to(..)`), so that a wrong method gets
    /// the gatekeeper's `400` instead of the router's `405`.
    pub fn resource(&self, path: &str) -> actix_web::Resource {
        web::resource(path).app_data(self.clone())
    }
}

impl<T> FromRequest for Webhook<T>
where
    T: serde::de::DeserializeOwned + 'static,
{
    type Error = Rejection;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;
    type Config = Gatekeeper;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let gatekeeper = match req.app_data::<Self::Config>() {
            Some(gatekeeper) => gatekeeper.clone(),
            None => {
                tracing::error!(
                    path = req.path(),
                    "No gatekeeper registered for {}, rejecting delivery",
                    req.path()
                );
                return future::err(Rejection::NoGatekeeper).boxed_local();
            }
        };

        // Headers first, so a malformed request never has its body read.
        let delivery = match gatekeeper::check_headers(req.method(), req.headers()) {
            Ok(delivery) => delivery,
            Err(rejection) => return future::err(rejection).boxed_local(),
        };

        Box::pin(Bytes::from_request(req, payload).map(
            move |bytes| -> Result<Self, Self::Error> {
                let bytes = bytes?;
                let accepted = gatekeeper.inspect_delivery(delivery, &bytes)?;

                Ok(Self {
                    delivery: accepted.delivery,
                    payload: serde_json::from_slice(&bytes)?,
                })
            },
        ))
    }
}
