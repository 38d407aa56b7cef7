use anyhow::{Context, Result};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use super::models::{GameRow, ParticipantRow};
use crate::game::types::{GameRecord, NewGame, Participant};

const SELECT_GAME: &str = r#"
    SELECT g.id, g.created_by, g.played_at, g.duration_minutes, g.notes,
           g.created_at, g.updated_at
      FROM games g
"#;

const GAME_FILTER: &str = r#"
    WHERE ($1::uuid IS NULL OR EXISTS (
              SELECT 1 FROM game_participants gp WHERE gp.game_id = g.id AND gp.player_id = $1))
      AND ($2::uuid IS NULL OR EXISTS (
              SELECT 1 FROM game_participants gp WHERE gp.game_id = g.id AND gp.deck_id = $2))
"#;

#[derive(Debug, Default)]
pub struct GameFilter {
    pub player: Option<Uuid>,
    pub deck: Option<Uuid>,
}

/// Loads the participants of `rows` in one query and stitches them on,
/// preserving the order of `rows`.
async fn attach_participants(db: &PgPool, rows: Vec<GameRow>) -> Result<Vec<GameRecord>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<Uuid> = rows.iter().map(|g| g.id).collect();
    let seats = sqlx::query_as::<_, ParticipantRow>(
        r#"SELECT game_id, player_id, deck_id, placement, eliminated_by, borrowed_from
             FROM game_participants
            WHERE game_id = ANY($1)
            ORDER BY game_id, placement"#,
    )
    .bind(&ids)
    .fetch_all(db)
    .await
    .context("loading participants")?;

    let mut by_game: HashMap<Uuid, Vec<Participant>> = HashMap::new();
    for seat in seats {
        let game_id = seat.game_id;
        by_game
            .entry(game_id)
            .or_default()
            .push(seat.into_participant()?);
    }

    Ok(rows
        .into_iter()
        .map(|g| {
            let participants = by_game.remove(&g.id).unwrap_or_default();
            g.with_participants(participants)
        })
        .collect())
}

async fn insert_participants(
    tx: &mut Transaction<'_, Postgres>,
    game_id: Uuid,
    participants: &[Participant],
) -> Result<()> {
    for p in participants {
        sqlx::query(
            r#"INSERT INTO game_participants
                   (game_id, player_id, deck_id, placement, eliminated_by, borrowed_from)
               VALUES ($1, $2, $3, $4, $5, $6)"#,
        )
        .bind(game_id)
        .bind(p.player_id)
        .bind(p.deck_id)
        .bind(i16::from(p.placement))
        .bind(p.eliminated_by)
        .bind(p.borrowed_from)
        .execute(&mut **tx)
        .await
        .context("inserting participant")?;
    }
    Ok(())
}

pub async fn find(db: &PgPool, id: Uuid) -> Result<Option<GameRecord>> {
    let row = sqlx::query_as::<_, GameRow>(&format!("{SELECT_GAME} WHERE g.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("fetching game")?;
    match row {
        Some(row) => Ok(attach_participants(db, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

/// Game row and all participants are written in one transaction.
pub async fn insert(db: &PgPool, created_by: Uuid, game: &NewGame) -> Result<GameRecord> {
    let id = Uuid::new_v4();
    let mut tx = db.begin().await.context("starting transaction")?;

    sqlx::query(
        r#"INSERT INTO games (id, created_by, played_at, duration_minutes, notes)
           VALUES ($1, $2, $3, $4, $5)"#,
    )
    .bind(id)
    .bind(created_by)
    .bind(game.played_at)
    .bind(game.duration_minutes)
    .bind(game.notes.as_deref())
    .execute(&mut *tx)
    .await
    .context("inserting game")?;

    insert_participants(&mut tx, id, &game.participants).await?;
    tx.commit().await.context("committing game")?;

    find(db, id).await?.context("game vanished after insert")
}

/// Replaces metadata and the whole participant list of an existing game.
pub async fn replace(db: &PgPool, id: Uuid, game: &NewGame) -> Result<Option<GameRecord>> {
    let mut tx = db.begin().await.context("starting transaction")?;

    let res = sqlx::query(
        r#"UPDATE games
              SET played_at        = $2,
                  duration_minutes = $3,
                  notes            = $4,
                  updated_at       = NOW()
            WHERE id = $1"#,
    )
    .bind(id)
    .bind(game.played_at)
    .bind(game.duration_minutes)
    .bind(game.notes.as_deref())
    .execute(&mut *tx)
    .await
    .context("updating game")?;
    if res.rows_affected() == 0 {
        return Ok(None);
    }

    sqlx::query("DELETE FROM game_participants WHERE game_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("clearing participants")?;
    insert_participants(&mut tx, id, &game.participants).await?;
    tx.commit().await.context("committing game")?;

    find(db, id).await
}

pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool> {
    let res = sqlx::query("DELETE FROM games WHERE id = $1")
        .bind(id)
        .execute(db)
        .await
        .context("deleting game")?;
    Ok(res.rows_affected() > 0)
}

/// One page of games, newest first, plus the total matching count.
pub async fn list(
    db: &PgPool,
    filter: &GameFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<GameRecord>, i64)> {
    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM games g {GAME_FILTER}"))
        .bind(filter.player)
        .bind(filter.deck)
        .fetch_one(db)
        .await
        .context("counting games")?;

    let rows = sqlx::query_as::<_, GameRow>(&format!(
        "{SELECT_GAME} {GAME_FILTER} ORDER BY g.played_at DESC, g.created_at DESC LIMIT $3 OFFSET $4"
    ))
    .bind(filter.player)
    .bind(filter.deck)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("listing games")?;

    Ok((attach_participants(db, rows).await?, total))
}

/// Every game the filter matches, newest first. Statistics run over these.
pub async fn matching(db: &PgPool, filter: &GameFilter) -> Result<Vec<GameRecord>> {
    let rows = sqlx::query_as::<_, GameRow>(&format!(
        "{SELECT_GAME} {GAME_FILTER} ORDER BY g.played_at DESC, g.created_at DESC"
    ))
    .bind(filter.player)
    .bind(filter.deck)
    .fetch_all(db)
    .await
    .context("loading games")?;
    attach_participants(db, rows).await
}

pub async fn all(db: &PgPool) -> Result<Vec<GameRecord>> {
    matching(db, &GameFilter::default()).await
}

/// (games, seats) over the whole history; the ratio is the chance that a
/// random seat wins.
pub async fn participation_totals(db: &PgPool) -> Result<(i64, i64)> {
    sqlx::query_as("SELECT COUNT(DISTINCT game_id), COUNT(*) FROM game_participants")
        .fetch_one(db)
        .await
        .context("counting participations")
}
