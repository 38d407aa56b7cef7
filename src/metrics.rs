//! Prometheus metrics & middleware helper.
//!
//! HTTP request metrics come from `actix-web-prom` at `/metrics`; domain
//! counters live in their own registry, rendered at `/metrics/app`.

use actix_web::{get, web, HttpResponse};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use once_cell::sync::Lazy;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

/// Global Prometheus handle reused in tests.
pub static METRICS: Lazy<PrometheusMetrics> = Lazy::new(|| {
    PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics") // exposed URL
        .build()
        .expect("metrics builder")
});

pub static REGISTRY: Lazy<Registry> =
    Lazy::new(|| Registry::new_custom(Some("commander".into()), None).expect("app registry"));

/// Successful writes, by entity (`player`, `deck`, `game`) and action.
pub static WRITES: Lazy<IntCounterVec> = Lazy::new(|| {
    let counter = IntCounterVec::new(
        Opts::new("writes_total", "Successful writes by entity and action"),
        &["entity", "action"],
    )
    .expect("writes counter");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("register writes counter");
    counter
});

pub fn record_write(entity: &str, action: &str) {
    WRITES.with_label_values(&[entity, action]).inc();
}

/// Text exposition of the domain registry.
pub fn render() -> Result<String, prometheus::Error> {
    Lazy::force(&WRITES);
    let mut buf = Vec::new();
    TextEncoder::new().encode(&REGISTRY.gather(), &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

#[get("/metrics/app")]
pub async fn app_metrics() -> HttpResponse {
    match render() {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            log::error!("encoding metrics failed: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(app_metrics);
}
