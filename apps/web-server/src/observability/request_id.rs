//! Request ID middleware - generates unique IDs for each request.

use actix_web::{
    Error, HttpResponse, ResponseError,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{HeaderName, HeaderValue},
};
use std::future::{Future, Ready, ready};
use std::pin::Pin;
use tracing::Instrument;
use uuid::Uuid;

use crate::middleware::error::AppError;

/// Header name for request ID.
pub static REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Middleware that generates a unique request ID for each request.
///
/// The ID is added to response headers, recorded on the request span and
/// stamped into problem pages rendered from [`AppError`].
pub struct RequestIdMiddleware;

impl<S, B> Transform<S, ServiceRequest> for RequestIdMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RequestIdService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdService { service }))
    }
}

pub struct RequestIdService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for RequestIdService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Check if request already has an ID (from client or load balancer)
        let request_id = req
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let span = tracing::info_span!("request", request_id = %request_id);
        let fut = self.service.call(req).instrument(span);

        Box::pin(async move {
            let res = fut.await?;

            let problem = res
                .response()
                .error()
                .and_then(|e| e.as_error::<AppError>())
                .and_then(|e| e.problem().map(|p| (e.status_code(), p)));

            let mut res = match problem {
                Some((status, problem)) => {
                    let path = res.request().path().to_string();
                    let body = problem
                        .with_instance(path)
                        .with_request_id(request_id.clone());
                    res.into_response(HttpResponse::build(status).json(body))
                        .map_into_right_body()
                }
                None => res.map_into_left_body(),
            };

            res.headers_mut().insert(
                HeaderName::from_static("x-request-id"),
                HeaderValue::from_str(&request_id)
                    .unwrap_or_else(|_| HeaderValue::from_static("unknown")),
            );

            Ok(res)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, test, web};

    async fn missing() -> Result<HttpResponse, AppError> {
        Err(AppError::NotFound("post 42 not found".to_string()))
    }

    #[actix_web::test]
    async fn test_problem_pages_carry_request_id() {
        let app = test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .route("/missing", web::get().to(missing)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/missing")
            .insert_header((REQUEST_ID_HEADER, "req-1"))
            .to_request();
        let res = test::call_service(&app, req).await;

        assert_eq!(res.status(), 404);
        assert_eq!(res.headers().get("x-request-id").unwrap(), "req-1");

        let body: serde_json::Value = test::read_body_json(res).await;
        assert_eq!(body["request_id"], "req-1");
        assert_eq!(body["instance"], "/missing");
        assert_eq!(body["detail"], "post 42 not found");
    }

    #[actix_web::test]
    async fn test_generates_id_when_absent() {
        let app = test::init_service(
            App::new()
                .wrap(RequestIdMiddleware)
                .route("/ok", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let res = test::call_service(&app, test::TestRequest::get().uri("/ok").to_request()).await;
        let header = res.headers().get("x-request-id").unwrap().to_str().unwrap();

        assert_eq!(res.status(), 200);
        assert!(Uuid::parse_str(header).is_ok());
    }
}
