use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use super::models::DeckRow;
use super::player_repo::like_pattern;
use crate::stats::overview::DeckRef;

const SELECT_DECK: &str = r#"
    SELECT d.id, d.owner_id, d.name, d.commander, d.decklist_url, d.image_url,
           d.colors, d.tags, d.created_at
      FROM decks d
"#;

const DECK_FILTER: &str = r#"
    WHERE ($1::uuid IS NULL OR d.owner_id = $1)
      AND ($2::text IS NULL OR $2 = ANY(d.colors))
      AND ($3::text IS NULL OR d.name ILIKE $3 OR d.commander ILIKE $3)
"#;

#[derive(Debug, Default)]
pub struct DeckFilter {
    pub owner: Option<Uuid>,
    /// Single color code, already canonical (`"G"`).
    pub color: Option<String>,
    pub search: Option<String>,
}

/// Everything a deck is written with; colors and tags already normalised.
pub struct DeckFields<'a> {
    pub name: &'a str,
    pub commander: &'a str,
    pub decklist_url: Option<&'a str>,
    pub image_url: Option<&'a str>,
    pub colors: &'a [String],
    pub tags: &'a [String],
}

/// Deck name and commander, for labelling game participants and stats.
#[derive(Debug, Clone, Serialize)]
pub struct DeckLabel {
    pub name: String,
    pub commander: String,
}

pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<DeckRow>> {
    sqlx::query_as::<_, DeckRow>(&format!("{SELECT_DECK} WHERE d.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("fetching deck")
}

pub async fn list(
    db: &PgPool,
    filter: &DeckFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<DeckRow>, i64)> {
    let pattern = filter.search.as_deref().map(like_pattern);

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM decks d {DECK_FILTER}"))
        .bind(filter.owner)
        .bind(filter.color.as_deref())
        .bind(pattern.as_deref())
        .fetch_one(db)
        .await
        .context("counting decks")?;

    let rows = sqlx::query_as::<_, DeckRow>(&format!(
        "{SELECT_DECK} {DECK_FILTER} ORDER BY LOWER(d.name), d.id LIMIT $4 OFFSET $5"
    ))
    .bind(filter.owner)
    .bind(filter.color.as_deref())
    .bind(pattern.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("listing decks")?;

    Ok((rows, total))
}

pub async fn for_owner(db: &PgPool, owner: Uuid) -> Result<Vec<DeckRow>> {
    sqlx::query_as::<_, DeckRow>(&format!(
        "{SELECT_DECK} WHERE d.owner_id = $1 ORDER BY d.created_at"
    ))
    .bind(owner)
    .fetch_all(db)
    .await
    .context("listing decks of owner")
}

pub async fn insert(db: &PgPool, owner: Uuid, fields: &DeckFields<'_>) -> Result<DeckRow> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"INSERT INTO decks (id, owner_id, name, commander, decklist_url, image_url, colors, tags)
           VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"#,
    )
    .bind(id)
    .bind(owner)
    .bind(fields.name)
    .bind(fields.commander)
    .bind(fields.decklist_url)
    .bind(fields.image_url)
    .bind(fields.colors)
    .bind(fields.tags)
    .execute(db)
    .await
    .context("inserting deck")?;

    find(db, id).await?.context("deck vanished after insert")
}

/// Overwrites every editable column of a deck.
pub async fn update(db: &PgPool, id: Uuid, fields: &DeckFields<'_>) -> Result<Option<DeckRow>> {
    let res = sqlx::query(
        r#"UPDATE decks
              SET name         = $2,
                  commander    = $3,
                  decklist_url = $4,
                  image_url    = $5,
                  colors       = $6,
                  tags         = $7
            WHERE id = $1"#,
    )
    .bind(id)
    .bind(fields.name)
    .bind(fields.commander)
    .bind(fields.decklist_url)
    .bind(fields.image_url)
    .bind(fields.colors)
    .bind(fields.tags)
    .execute(db)
    .await
    .context("updating deck")?;

    if res.rows_affected() == 0 {
        return Ok(None);
    }
    find(db, id).await
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool> {
    let res = sqlx::query("DELETE FROM decks WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("deleting deck")?;
    Ok(res.rows_affected() > 0)
}

pub async fn count(db: &PgPool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM decks")
        .fetch_one(db)
        .await
        .context("counting decks")
}

/// deck id → owner id for the decks among `ids` that exist.
pub async fn owners_of(db: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, Uuid>> {
    let rows: Vec<(Uuid, Uuid)> = sqlx::query_as("SELECT id, owner_id FROM decks WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(db)
        .await
        .context("resolving deck owners")?;
    Ok(rows.into_iter().collect())
}

pub async fn labels(db: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, DeckLabel>> {
    let rows: Vec<(Uuid, String, String)> =
        sqlx::query_as("SELECT id, name, commander FROM decks WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(db)
            .await
            .context("resolving deck labels")?;
    Ok(rows
        .into_iter()
        .map(|(id, name, commander)| (id, DeckLabel { name, commander }))
        .collect())
}

/// Commander and colors of every deck, for the dashboard.
pub async fn all_refs(db: &PgPool) -> Result<HashMap<Uuid, DeckRef>> {
    let rows = sqlx::query_as::<_, DeckRow>(SELECT_DECK)
        .fetch_all(db)
        .await
        .context("loading decks")?;
    Ok(rows
        .into_iter()
        .map(|d| {
            let colors = d.color_identity();
            (
                d.id,
                DeckRef {
                    commander: d.commander,
                    colors,
                },
            )
        })
        .collect())
}
