//! Liveness / readiness probe

use actix_web::{get, web, HttpResponse};
use serde_json::json;
use sqlx::PgPool;

#[get("/healthz")]
pub async fn healthz(db: web::Data<PgPool>) -> HttpResponse {
    if let Err(e) = sqlx::query("SELECT 1").execute(&**db).await {
        log::error!("health check failed: {e}");
        return HttpResponse::ServiceUnavailable()
            .json(json!({ "success": false, "message": "database unavailable" }));
    }
    HttpResponse::Ok().json(json!({ "success": true, "message": "ok" }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(healthz);
}
