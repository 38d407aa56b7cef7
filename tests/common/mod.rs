//! Postgres harness for the tests that need a real database. Each test runs
//! in a fresh schema of the database named by `TEST_DATABASE_URL`; when the
//! variable is unset those tests return early.

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Executor, PgPool};
use uuid::Uuid;

pub struct TestDb {
    pub pool: PgPool,
    root: PgPool,
    schema: String,
}

pub async fn test_db() -> Option<TestDb> {
    dotenvy::dotenv().ok();
    let Ok(url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return None;
    };

    let root = PgPoolOptions::new()
        .max_connections(1)
        .connect(&url)
        .await
        .expect("connecting to TEST_DATABASE_URL");
    let schema = format!("test_{}", Uuid::new_v4().simple());
    root.execute(format!("CREATE SCHEMA {schema}").as_str())
        .await
        .expect("creating test schema");

    let options: PgConnectOptions = url.parse().expect("parsing TEST_DATABASE_URL");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect_with(options.options([("search_path", schema.as_str())]))
        .await
        .expect("connecting to test schema");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("running migrations");

    Some(TestDb { pool, root, schema })
}

impl TestDb {
    pub async fn cleanup(self) {
        self.pool.close().await;
        let drop = format!("DROP SCHEMA {} CASCADE", self.schema);
        if let Err(e) = self.root.execute(drop.as_str()).await {
            eprintln!("leaving schema {} behind: {e}", self.schema);
        }
    }
}
