//! PostgreSQL access. Repositories return `anyhow::Result`; the HTTP layer
//! turns failures into `ApiError::Internal`.

pub mod deck_repo;
pub mod game_repo;
pub mod models;
pub mod player_repo;
