//! Read-only statistics endpoints. Every handler loads the relevant games and
//! hands them to `crate::stats`; ids in the result come with a name lookup.

use actix_web::{get, web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::config::settings;
use crate::db::deck_repo::{self, DeckLabel};
use crate::db::game_repo::{self, GameFilter};
use crate::db::models::{DeckRow, PlayerProfile};
use crate::db::player_repo;
use crate::error::{ApiError, ApiResult};
use crate::http::envelope;
use crate::http::games::{resolve_views, GameView};
use crate::stats::advanced::win_probability;
use crate::stats::eliminations::{elimination_table, eliminations_for};
use crate::stats::leaderboard::{deck_leaderboard, player_leaderboard};
use crate::stats::matchups::matchups;
use crate::stats::overview::{overview, Overview};
use crate::stats::profile::{deck_stats, player_stats};
use crate::stats::Subject;

pub const DASHBOARD_RECENT_GAMES: usize = 5;

/// Statistics plus display names for the ids they mention.
#[derive(Serialize)]
struct Labelled<T> {
    stats: T,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    players: HashMap<Uuid, String>,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    decks: HashMap<Uuid, DeckLabel>,
}

impl<T> Labelled<T> {
    fn new(stats: T) -> Self {
        Labelled {
            stats,
            players: HashMap::new(),
            decks: HashMap::new(),
        }
    }

    fn players(mut self, players: HashMap<Uuid, String>) -> Self {
        self.players = players;
        self
    }

    fn decks(mut self, decks: HashMap<Uuid, DeckLabel>) -> Self {
        self.decks = decks;
        self
    }
}

#[derive(Serialize)]
struct Subjected<S, T> {
    subject: S,
    #[serde(flatten)]
    body: Labelled<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardQuery {
    pub min_games: Option<u32>,
}

async fn player_or_404(db: &PgPool, id: Uuid) -> ApiResult<PlayerProfile> {
    Ok(player_repo::find_by_id(db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("player"))?
        .profile(false))
}

async fn deck_or_404(db: &PgPool, id: Uuid) -> ApiResult<DeckRow> {
    deck_repo::find(db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("deck"))
}

fn player_games(id: Uuid) -> GameFilter {
    GameFilter {
        player: Some(id),
        deck: None,
    }
}

fn deck_games(id: Uuid) -> GameFilter {
    GameFilter {
        player: None,
        deck: Some(id),
    }
}

//////////////////////////////////////////////////
// GET /api/stats/player/{id}
//////////////////////////////////////////////////
#[get("/stats/player/{id}")]
pub async fn player(db: web::Data<PgPool>, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let subject = player_or_404(&db, id).await?;
    let games = game_repo::matching(&db, &player_games(id)).await?;
    let stats = player_stats(&games, id);

    let deck_ids: Vec<Uuid> = stats.decks.iter().map(|u| u.id).collect();
    let decks = deck_repo::labels(&db, &deck_ids).await?;
    Ok(envelope::ok(Subjected {
        subject,
        body: Labelled::new(stats).decks(decks),
    }))
}

//////////////////////////////////////////////////
// GET /api/stats/deck/{id}
//////////////////////////////////////////////////
#[get("/stats/deck/{id}")]
pub async fn deck(db: web::Data<PgPool>, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let subject = deck_or_404(&db, id).await?;
    let games = game_repo::matching(&db, &deck_games(id)).await?;

    let (total_games, total_seats) = game_repo::participation_totals(&db).await?;
    let prior = win_probability(total_games.max(0) as u64, total_seats.max(0) as u64);
    let stats = deck_stats(&games, id, prior, settings().bayes_prior_weight);

    let pilot_ids: Vec<Uuid> = stats.pilots.iter().map(|u| u.id).collect();
    let players = player_repo::nicknames(&db, &pilot_ids).await?;
    Ok(envelope::ok(Subjected {
        subject,
        body: Labelled::new(stats).players(players),
    }))
}

//////////////////////////////////////////////////
// GET /api/stats/matchups/player/{id}
//////////////////////////////////////////////////
#[get("/stats/matchups/player/{id}")]
pub async fn player_matchups(
    db: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let subject = player_or_404(&db, id).await?;
    let games = game_repo::matching(&db, &player_games(id)).await?;
    let rows = matchups(&games, Subject::Player(id));

    let ids: Vec<Uuid> = rows.iter().map(|m| m.opponent_id).collect();
    let players = player_repo::nicknames(&db, &ids).await?;
    Ok(envelope::ok(Subjected {
        subject,
        body: Labelled::new(rows).players(players),
    }))
}

//////////////////////////////////////////////////
// GET /api/stats/matchups/deck/{id}
//////////////////////////////////////////////////
#[get("/stats/matchups/deck/{id}")]
pub async fn deck_matchups(db: web::Data<PgPool>, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let subject = deck_or_404(&db, id).await?;
    let games = game_repo::matching(&db, &deck_games(id)).await?;
    let rows = matchups(&games, Subject::Deck(id));

    let ids: Vec<Uuid> = rows.iter().map(|m| m.opponent_id).collect();
    let decks = deck_repo::labels(&db, &ids).await?;
    Ok(envelope::ok(Subjected {
        subject,
        body: Labelled::new(rows).decks(decks),
    }))
}

//////////////////////////////////////////////////
// GET /api/stats/eliminations
//////////////////////////////////////////////////
#[get("/stats/eliminations")]
pub async fn eliminations(db: web::Data<PgPool>) -> ApiResult<HttpResponse> {
    let games = game_repo::all(&db).await?;
    let table = elimination_table(&games);
    let players = player_repo::all_nicknames(&db).await?;
    Ok(envelope::ok(Labelled::new(table).players(players)))
}

//////////////////////////////////////////////////
// GET /api/stats/eliminations/{playerId}
//////////////////////////////////////////////////
#[get("/stats/eliminations/{player_id}")]
pub async fn player_eliminations(
    db: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let subject = player_or_404(&db, id).await?;
    let games = game_repo::matching(&db, &player_games(id)).await?;
    let record = eliminations_for(&games, id);

    let ids: Vec<Uuid> = record
        .victims
        .iter()
        .chain(&record.eliminated_by)
        .map(|t| t.player_id)
        .collect();
    let players = player_repo::nicknames(&db, &ids).await?;
    Ok(envelope::ok(Subjected {
        subject,
        body: Labelled::new(record).players(players),
    }))
}

//////////////////////////////////////////////////
// GET /api/stats/leaderboard/players
//////////////////////////////////////////////////
#[get("/stats/leaderboard/players")]
pub async fn player_board(
    db: web::Data<PgPool>,
    web::Query(query): web::Query<LeaderboardQuery>,
) -> ApiResult<HttpResponse> {
    let min_games = query.min_games.unwrap_or(settings().leaderboard_min_games);
    let games = game_repo::all(&db).await?;
    let board = player_leaderboard(&games, min_games);

    let ids: Vec<Uuid> = board.iter().map(|s| s.player_id).collect();
    let players = player_repo::nicknames(&db, &ids).await?;
    Ok(envelope::ok(Labelled::new(board).players(players)))
}

//////////////////////////////////////////////////
// GET /api/stats/leaderboard/decks
//////////////////////////////////////////////////
#[get("/stats/leaderboard/decks")]
pub async fn deck_board(
    db: web::Data<PgPool>,
    web::Query(query): web::Query<LeaderboardQuery>,
) -> ApiResult<HttpResponse> {
    let min_games = query.min_games.unwrap_or(settings().leaderboard_min_games);
    let games = game_repo::all(&db).await?;
    let board = deck_leaderboard(&games, min_games, settings().bayes_prior_weight);

    let ids: Vec<Uuid> = board.iter().map(|s| s.deck_id).collect();
    let decks = deck_repo::labels(&db, &ids).await?;
    Ok(envelope::ok(Labelled::new(board).decks(decks)))
}

//////////////////////////////////////////////////
// GET /api/stats/dashboard
//////////////////////////////////////////////////

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Totals {
    players: i64,
    decks: i64,
    games: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Dashboard {
    totals: Totals,
    #[serde(flatten)]
    overview: Overview,
    recent_games: Vec<GameView>,
}

#[get("/stats/dashboard")]
pub async fn dashboard(db: web::Data<PgPool>) -> ApiResult<HttpResponse> {
    let games = game_repo::all(&db).await?;
    let deck_refs = deck_repo::all_refs(&db).await?;
    let summary = overview(&games, &deck_refs);

    let totals = Totals {
        players: player_repo::count(&db).await?,
        decks: deck_repo::count(&db).await?,
        games: games.len(),
    };
    // `all` is newest first
    let recent: Vec<_> = games.into_iter().take(DASHBOARD_RECENT_GAMES).collect();
    let recent_games = resolve_views(&db, recent).await?;

    Ok(envelope::ok(Dashboard {
        totals,
        overview: summary,
        recent_games,
    }))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(player)
        .service(deck)
        .service(player_matchups)
        .service(deck_matchups)
        .service(eliminations)
        .service(player_eliminations)
        .service(player_board)
        .service(deck_board)
        .service(dashboard);
}
