use anyhow::{Context, Result};
use sqlx::{PgExecutor, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use super::models::PlayerRow;

const SELECT_PLAYER: &str = r#"
    SELECT p.id, p.name, p.nickname, p.email, p.password_hash, p.profile_image,
           p.is_admin, p.is_guest, p.created_at,
           ARRAY(SELECT d.id FROM decks d WHERE d.owner_id = p.id ORDER BY d.created_at) AS deck_ids
      FROM players p
"#;

pub struct NewPlayer<'a> {
    pub name: &'a str,
    pub nickname: &'a str,
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub profile_image: Option<&'a str>,
    pub is_guest: bool,
}

/// Fields a profile edit may change; `None` keeps the stored value.
#[derive(Default)]
pub struct ProfileChanges<'a> {
    pub name: Option<&'a str>,
    pub nickname: Option<&'a str>,
    pub profile_image: Option<&'a str>,
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> Result<Option<PlayerRow>> {
    sqlx::query_as::<_, PlayerRow>(&format!("{SELECT_PLAYER} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
        .context("fetching player")
}

pub async fn find_by_email(db: &PgPool, email: &str) -> Result<Option<PlayerRow>> {
    sqlx::query_as::<_, PlayerRow>(&format!("{SELECT_PLAYER} WHERE LOWER(p.email) = LOWER($1)"))
        .bind(email)
        .fetch_optional(db)
        .await
        .context("fetching player by email")
}

pub async fn find_by_nickname(db: &PgPool, nickname: &str) -> Result<Option<PlayerRow>> {
    sqlx::query_as::<_, PlayerRow>(&format!(
        "{SELECT_PLAYER} WHERE LOWER(p.nickname) = LOWER($1)"
    ))
    .bind(nickname)
    .fetch_optional(db)
    .await
    .context("fetching player by nickname")
}

/// One page of players ordered by nickname, plus the total matching count.
/// `search` matches name or nickname, case-insensitively.
pub async fn list(
    db: &PgPool,
    search: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<(Vec<PlayerRow>, i64)> {
    let pattern = search.map(like_pattern);

    let total: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM players p
            WHERE $1::text IS NULL OR p.name ILIKE $1 OR p.nickname ILIKE $1"#,
    )
    .bind(pattern.as_deref())
    .fetch_one(db)
    .await
    .context("counting players")?;

    let rows = sqlx::query_as::<_, PlayerRow>(&format!(
        r#"{SELECT_PLAYER}
            WHERE $1::text IS NULL OR p.name ILIKE $1 OR p.nickname ILIKE $1
            ORDER BY LOWER(p.nickname)
            LIMIT $2 OFFSET $3"#
    ))
    .bind(pattern.as_deref())
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("listing players")?;

    Ok((rows, total))
}

/// `%term%` with LIKE metacharacters escaped.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Inserts a player. A registered (non-guest) player becomes admin when no
/// admin exists yet.
pub async fn insert(db: &PgPool, new: &NewPlayer<'_>) -> Result<PlayerRow> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"INSERT INTO players (id, name, nickname, email, password_hash, profile_image, is_guest, is_admin)
           VALUES ($1, $2, $3, $4, $5, $6, $7,
                   NOT $7 AND NOT EXISTS (SELECT 1 FROM players WHERE is_admin))"#,
    )
    .bind(id)
    .bind(new.name)
    .bind(new.nickname)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.profile_image)
    .bind(new.is_guest)
    .execute(db)
    .await
    .context("inserting player")?;

    find_by_id(db, id)
        .await?
        .context("player vanished after insert")
}

/// Turns a guest into a registered account, keeping its id (and therefore its
/// games and decks). Returns `None` if `guest_id` is not a guest any more.
pub async fn claim_guest(
    db: &PgPool,
    guest_id: Uuid,
    new: &NewPlayer<'_>,
) -> Result<Option<PlayerRow>> {
    let res = sqlx::query(
        r#"UPDATE players
              SET name          = $2,
                  nickname      = $3,
                  email         = $4,
                  password_hash = $5,
                  profile_image = COALESCE($6, profile_image),
                  is_guest      = FALSE,
                  is_admin      = is_admin OR NOT EXISTS (SELECT 1 FROM players WHERE is_admin)
            WHERE id = $1
              AND is_guest"#,
    )
    .bind(guest_id)
    .bind(new.name)
    .bind(new.nickname)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.profile_image)
    .execute(db)
    .await
    .context("claiming guest player")?;

    if res.rows_affected() == 0 {
        return Ok(None);
    }
    find_by_id(db, guest_id).await
}

async fn apply_profile<'e>(
    db: impl PgExecutor<'e>,
    id: Uuid,
    changes: &ProfileChanges<'_>,
) -> Result<bool> {
    let res = sqlx::query(
        r#"UPDATE players
              SET name          = COALESCE($2, name),
                  nickname      = COALESCE($3, nickname),
                  profile_image = COALESCE($4, profile_image)
            WHERE id = $1"#,
    )
    .bind(id)
    .bind(changes.name)
    .bind(changes.nickname)
    .bind(changes.profile_image)
    .execute(db)
    .await
    .context("updating player profile")?;
    Ok(res.rows_affected() > 0)
}

pub async fn update_profile(
    db: &PgPool,
    id: Uuid,
    changes: &ProfileChanges<'_>,
) -> Result<Option<PlayerRow>> {
    if !apply_profile(db, id, changes).await? {
        return Ok(None);
    }
    find_by_id(db, id).await
}

pub enum AccountUpdate {
    Updated(PlayerRow),
    NotFound,
    /// Revoking admin would have left nobody with admin rights.
    LastAdmin,
}

/// Profile edit plus an optional admin flag change, applied together or not
/// at all.
pub async fn update_account(
    db: &PgPool,
    id: Uuid,
    changes: &ProfileChanges<'_>,
    is_admin: Option<bool>,
) -> Result<AccountUpdate> {
    let mut tx = db.begin().await.context("starting transaction")?;
    if let Some(flag) = is_admin {
        if !set_admin(&mut *tx, id, flag).await? {
            return Ok(AccountUpdate::LastAdmin);
        }
    }
    if !apply_profile(&mut *tx, id, changes).await? {
        return Ok(AccountUpdate::NotFound);
    }
    tx.commit().await.context("committing player update")?;

    Ok(find_by_id(db, id)
        .await?
        .map_or(AccountUpdate::NotFound, AccountUpdate::Updated))
}

pub async fn update_password(db: &PgPool, id: Uuid, password_hash: &str) -> Result<()> {
    sqlx::query("UPDATE players SET password_hash = $2 WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(db)
        .await
        .context("updating password")?;
    Ok(())
}

/// Grants or revokes admin. Revoking is refused (returns `false`) when it
/// would leave the system without an admin.
async fn set_admin<'e>(db: impl PgExecutor<'e>, id: Uuid, is_admin: bool) -> Result<bool> {
    let res = sqlx::query(
        r#"UPDATE players
              SET is_admin = $2
            WHERE id = $1
              AND NOT is_guest
              AND ($2 OR NOT is_admin
                   OR (SELECT COUNT(*) FROM players WHERE is_admin) > 1)"#,
    )
    .bind(id)
    .bind(is_admin)
    .execute(db)
    .await
    .context("changing admin flag")?;
    Ok(res.rows_affected() > 0)
}

pub async fn count_admins(db: &PgPool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM players WHERE is_admin")
        .fetch_one(db)
        .await
        .context("counting admins")
}

pub async fn count(db: &PgPool) -> Result<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM players")
        .fetch_one(db)
        .await
        .context("counting players")
}

/// Deletes a player and, through the foreign key, their decks. The last
/// admin is never deleted; returns whether a row was removed.
pub async fn delete(db: &PgPool, id: Uuid) -> Result<bool> {
    let res = sqlx::query(
        r#"DELETE FROM players
            WHERE id = $1
              AND (NOT is_admin OR (SELECT COUNT(*) FROM players WHERE is_admin) > 1)"#,
    )
    .bind(id)
    .execute(db)
    .await
    .context("deleting player")?;
    Ok(res.rows_affected() > 0)
}

/// id → nickname for the players among `ids` that still exist.
pub async fn nicknames(db: &PgPool, ids: &[Uuid]) -> Result<HashMap<Uuid, String>> {
    let rows: Vec<(Uuid, String)> =
        sqlx::query_as("SELECT id, nickname FROM players WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(db)
            .await
            .context("resolving nicknames")?;
    Ok(rows.into_iter().collect())
}

pub async fn all_nicknames(db: &PgPool) -> Result<HashMap<Uuid, String>> {
    let rows: Vec<(Uuid, String)> = sqlx::query_as("SELECT id, nickname FROM players")
        .fetch_all(db)
        .await
        .context("loading nicknames")?;
    Ok(rows.into_iter().collect())
}
