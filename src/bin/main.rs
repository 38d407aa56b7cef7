use actix_web::{middleware::Logger, web, App, HttpServer};
use commander_tracker_server::{config::settings, http, metrics};
use sqlx::postgres::PgPoolOptions;
use std::{env, io};

fn io_err(context: &str, e: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {e}"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Configuration
    let database_url = env::var("DATABASE_URL").map_err(|e| io_err("DATABASE_URL", e))?;
    let cfg = settings();

    // Postgres pool + schema
    let db_pool = PgPoolOptions::new()
        .max_connections(cfg.db_max_connections)
        .connect(&database_url)
        .await
        .map_err(|e| io_err("connecting to Postgres", e))?;
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| io_err("running migrations", e))?;

    log::info!("listening on {}", cfg.server_addr);
    HttpServer::new(move || {
        App::new()
            .wrap(http::security::headers())
            .wrap(http::cors::cors())
            .wrap(metrics::METRICS.clone())
            .wrap(Logger::default())
            .app_data(web::Data::new(db_pool.clone()))
            .configure(metrics::init_routes)
            .configure(http::routes::init_routes)
            .default_service(web::to(http::routes::not_found))
    })
    .bind(&cfg.server_addr)?
    .run()
    .await
}
