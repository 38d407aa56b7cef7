//! Game records: listing, detail with resolved names, create / replace /
//! delete

use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;

use crate::db::game_repo::{self, GameFilter};
use crate::db::{deck_repo, player_repo};
use crate::error::{ApiError, ApiResult};
use crate::game::types::{GameRecord, NewGame, Participant};
use crate::game::validation::{resolve_references, validate_game};
use crate::http::auth::{require_owner_or_admin, CurrentPlayer};
use crate::http::envelope::{self, PageParams};
use crate::metrics;

//////////////////////////////////////////////////
// Views
//////////////////////////////////////////////////

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantView {
    #[serde(flatten)]
    pub seat: Participant,
    /// `None` once the player or deck has been deleted.
    pub nickname: Option<String>,
    pub deck_name: Option<String>,
    pub commander: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub id: Uuid,
    pub created_by: Uuid,
    pub played_at: DateTime<Utc>,
    pub duration: Option<i32>,
    pub notes: Option<String>,
    pub participants: Vec<ParticipantView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Resolves nicknames and deck labels for every seat in one query each.
pub async fn resolve_views(db: &PgPool, games: Vec<GameRecord>) -> ApiResult<Vec<GameView>> {
    let players: Vec<Uuid> = games
        .iter()
        .flat_map(|g| g.participants.iter().map(|p| p.player_id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let decks: Vec<Uuid> = games
        .iter()
        .flat_map(|g| g.participants.iter().map(|p| p.deck_id))
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let nicknames = player_repo::nicknames(db, &players).await?;
    let labels = deck_repo::labels(db, &decks).await?;

    Ok(games
        .into_iter()
        .map(|g| GameView {
            id: g.id,
            created_by: g.created_by,
            played_at: g.played_at,
            duration: g.duration_minutes,
            notes: g.notes,
            participants: g
                .participants
                .into_iter()
                .map(|seat| {
                    let label = labels.get(&seat.deck_id);
                    ParticipantView {
                        nickname: nicknames.get(&seat.player_id).cloned(),
                        deck_name: label.map(|l| l.name.clone()),
                        commander: label.map(|l| l.commander.clone()),
                        seat,
                    }
                })
                .collect(),
            created_at: g.created_at,
            updated_at: g.updated_at,
        })
        .collect())
}

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Debug, Default, Deserialize)]
pub struct GameQuery {
    pub player: Option<Uuid>,
    pub deck: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameReq {
    /// Defaults to now.
    pub played_at: Option<DateTime<Utc>>,
    pub duration: Option<i32>,
    pub notes: Option<String>,
    #[serde(default)]
    pub participants: Vec<Participant>,
}

/// Runs every write-time rule and returns the game ready to store. `stored`
/// holds the seats of the game being replaced, empty for a new game.
async fn checked_game(db: &PgPool, body: GameReq, stored: &[Participant]) -> ApiResult<NewGame> {
    let notes = body
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    validate_game(body.duration, notes.as_deref(), &body.participants)
        .map_err(ApiError::Validation)?;

    let mut participants = body.participants;
    let player_ids: Vec<Uuid> = participants.iter().map(|p| p.player_id).collect();
    let deck_ids: Vec<Uuid> = participants.iter().map(|p| p.deck_id).collect();
    let known_players: HashSet<Uuid> = player_repo::nicknames(db, &player_ids)
        .await?
        .into_keys()
        .collect();
    let deck_owners = deck_repo::owners_of(db, &deck_ids).await?;
    resolve_references(&mut participants, &known_players, &deck_owners, stored)
        .map_err(ApiError::Validation)?;

    participants.sort_by_key(|p| p.placement);
    Ok(NewGame {
        played_at: body.played_at.unwrap_or_else(Utc::now),
        duration_minutes: body.duration,
        notes,
        participants,
    })
}

async fn load(db: &PgPool, id: Uuid) -> ApiResult<GameRecord> {
    game_repo::find(db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("game"))
}

async fn single_view(db: &PgPool, game: GameRecord) -> ApiResult<GameView> {
    resolve_views(db, vec![game])
        .await?
        .pop()
        .ok_or_else(|| ApiError::not_found("game"))
}

//////////////////////////////////////////////////
// GET /api/games
//////////////////////////////////////////////////
#[get("/games")]
pub async fn list_games(
    db: web::Data<PgPool>,
    web::Query(params): web::Query<PageParams>,
    web::Query(query): web::Query<GameQuery>,
) -> ApiResult<HttpResponse> {
    let page = params.resolve();
    let filter = GameFilter {
        player: query.player,
        deck: query.deck,
    };
    let (games, total) = game_repo::list(&db, &filter, page.limit(), page.offset()).await?;
    let views = resolve_views(&db, games).await?;
    Ok(envelope::paged(views, page, total))
}

//////////////////////////////////////////////////
// GET /api/games/{id}
//////////////////////////////////////////////////
#[get("/games/{id}")]
pub async fn get_game(db: web::Data<PgPool>, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let game = load(&db, path.into_inner()).await?;
    Ok(envelope::ok(single_view(&db, game).await?))
}

//////////////////////////////////////////////////
// POST /api/games
//////////////////////////////////////////////////
#[post("/games")]
pub async fn create_game(
    db: web::Data<PgPool>,
    CurrentPlayer(actor): CurrentPlayer,
    web::Json(body): web::Json<GameReq>,
) -> ApiResult<HttpResponse> {
    let new = checked_game(&db, body, &[]).await?;
    let game = game_repo::insert(&db, actor.id, &new).await?;
    log::info!(
        "player {} recorded game {} ({} players)",
        actor.id,
        game.id,
        game.pod_size()
    );
    metrics::record_write("game", "create");
    Ok(envelope::created(single_view(&db, game).await?))
}

//////////////////////////////////////////////////
// PUT /api/games/{id}
//////////////////////////////////////////////////
/// Full replacement; the new participant list is validated like a new game,
/// except that unchanged seats may point at deleted players or decks.
#[put("/games/{id}")]
pub async fn update_game(
    db: web::Data<PgPool>,
    CurrentPlayer(actor): CurrentPlayer,
    path: web::Path<Uuid>,
    web::Json(body): web::Json<GameReq>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let existing = load(&db, id).await?;
    require_owner_or_admin(&actor, existing.created_by)?;

    let new = checked_game(&db, body, &existing.participants).await?;
    let game = game_repo::replace(&db, id, &new)
        .await?
        .ok_or_else(|| ApiError::not_found("game"))?;
    metrics::record_write("game", "update");
    Ok(envelope::ok(single_view(&db, game).await?))
}

//////////////////////////////////////////////////
// DELETE /api/games/{id}
//////////////////////////////////////////////////
#[delete("/games/{id}")]
pub async fn delete_game(
    db: web::Data<PgPool>,
    CurrentPlayer(actor): CurrentPlayer,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let existing = load(&db, id).await?;
    require_owner_or_admin(&actor, existing.created_by)?;

    if !game_repo::delete(&db, id).await? {
        return Err(ApiError::not_found("game"));
    }
    log::info!("player {} deleted game {id}", actor.id);
    metrics::record_write("game", "delete");
    Ok(envelope::message("game deleted"))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_games)
        .service(get_game)
        .service(create_game)
        .service(update_game)
        .service(delete_game);
}
