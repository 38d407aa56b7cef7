use crate::error::{ApiError, ApiResult};
use crate::http::{self, envelope, rate_limit};
use actix_web::{middleware::from_fn, web, HttpResponse};

/// Mount every HTTP sub-module under `/api`, rate limited per client.
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(envelope::json_config())
        .app_data(envelope::query_config())
        .app_data(envelope::path_config())
        .service(
            web::scope("/api")
                .wrap(from_fn(rate_limit::limit))
                .configure(http::health::init_routes)
                .configure(http::auth::init_routes)
                .configure(http::players::init_routes)
                .configure(http::decks::init_routes)
                .configure(http::games::init_routes)
                .configure(http::stats::init_routes),
        );
}

/// Unknown routes answer with the JSON envelope instead of an empty 404.
pub async fn not_found() -> ApiResult<HttpResponse> {
    Err(ApiError::NotFound("route not found".into()))
}
