//! Deck CRUD

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::deck_repo::{self, DeckFields, DeckFilter};
use crate::db::player_repo;
use crate::error::{ApiError, ApiResult, FieldError};
use crate::game::types::{parse_colors, Color};
use crate::http::auth::{require_owner_or_admin, CurrentPlayer};
use crate::http::envelope::{self, PageParams};
use crate::metrics;

pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_LEN: usize = 30;

/// Trims, drops blanks and removes case-insensitive duplicates (first
/// spelling wins).
pub fn normalize_tags(tags: &[String]) -> Result<Vec<String>, FieldError> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(FieldError::new(
                "tags",
                format!("tags cannot exceed {MAX_TAG_LEN} characters"),
            ));
        }
        if !out.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            out.push(tag.to_string());
        }
    }
    if out.len() > MAX_TAGS {
        return Err(FieldError::new("tags", format!("at most {MAX_TAGS} tags")));
    }
    Ok(out)
}

fn color_codes(colors: &[String]) -> Result<Vec<String>, FieldError> {
    parse_colors(colors)
        .map(|cs| cs.into_iter().map(|c| c.code().to_string()).collect())
        .map_err(|msg| FieldError::new("colors", msg))
}

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Debug, Default, Deserialize)]
pub struct DeckQuery {
    pub owner: Option<Uuid>,
    pub color: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateDeckReq {
    /// Defaults to the caller. Admins may create decks for anyone, any player
    /// may create one for a guest.
    pub owner: Option<Uuid>,
    #[validate(length(min = 1, max = 100, message = "name is required (max 100 characters)"))]
    pub name: String,
    #[validate(length(min = 1, max = 150, message = "commander is required (max 150 characters)"))]
    pub commander: String,
    #[validate(url(message = "decklistUrl must be a URL"))]
    pub decklist_url: Option<String>,
    #[validate(url(message = "imageUrl must be a URL"))]
    pub image_url: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeckReq {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 150, message = "commander must be 1-150 characters"))]
    pub commander: Option<String>,
    #[validate(url(message = "decklistUrl must be a URL"))]
    pub decklist_url: Option<String>,
    #[validate(url(message = "imageUrl must be a URL"))]
    pub image_url: Option<String>,
    pub colors: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Collects the per-field problems the derive cannot express.
fn check_fields(
    name: &str,
    commander: &str,
    colors: &[String],
    tags: &[String],
) -> ApiResult<(Vec<String>, Vec<String>)> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "name cannot be blank"));
    }
    if commander.trim().is_empty() {
        errors.push(FieldError::new("commander", "commander cannot be blank"));
    }
    let colors = color_codes(colors).map_err(|e| errors.push(e)).ok();
    let tags = normalize_tags(tags).map_err(|e| errors.push(e)).ok();
    match (colors, tags) {
        (Some(c), Some(t)) if errors.is_empty() => Ok((c, t)),
        _ => Err(ApiError::Validation(errors)),
    }
}

//////////////////////////////////////////////////
// GET /api/decks
//////////////////////////////////////////////////
#[get("/decks")]
pub async fn list_decks(
    db: web::Data<PgPool>,
    web::Query(params): web::Query<PageParams>,
    web::Query(query): web::Query<DeckQuery>,
) -> ApiResult<HttpResponse> {
    let page = params.resolve();
    let color = match query.color.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => Some(
            Color::from_code(code)
                .ok_or_else(|| ApiError::field("color", "color must be one of W, U, B, R, G, C"))?
                .code()
                .to_string(),
        ),
        None => None,
    };
    let filter = DeckFilter {
        owner: query.owner,
        color,
        search: query.search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()),
    };

    let (rows, total) = deck_repo::list(&db, &filter, page.limit(), page.offset()).await?;
    Ok(envelope::paged(rows, page, total))
}

//////////////////////////////////////////////////
// GET /api/decks/{id}
//////////////////////////////////////////////////
#[get("/decks/{id}")]
pub async fn get_deck(db: web::Data<PgPool>, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let deck = deck_repo::find(&db, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("deck"))?;
    Ok(envelope::ok(deck))
}

//////////////////////////////////////////////////
// POST /api/decks
//////////////////////////////////////////////////
#[post("/decks")]
pub async fn create_deck(
    db: web::Data<PgPool>,
    CurrentPlayer(actor): CurrentPlayer,
    web::Json(body): web::Json<CreateDeckReq>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    let (colors, tags) = check_fields(&body.name, &body.commander, &body.colors, &body.tags)?;

    let owner = body.owner.unwrap_or(actor.id);
    if owner != actor.id {
        let target = player_repo::find_by_id(&db, owner)
            .await?
            .ok_or_else(|| ApiError::field("owner", "player not found"))?;
        if !target.is_guest {
            require_owner_or_admin(&actor, owner)?;
        }
    }

    let deck = deck_repo::insert(
        &db,
        owner,
        &DeckFields {
            name: body.name.trim(),
            commander: body.commander.trim(),
            decklist_url: body.decklist_url.as_deref(),
            image_url: body.image_url.as_deref(),
            colors: &colors,
            tags: &tags,
        },
    )
    .await?;

    log::info!("player {} created deck {} for {owner}", actor.id, deck.id);
    metrics::record_write("deck", "create");
    Ok(envelope::created(deck))
}

//////////////////////////////////////////////////
// PUT /api/decks/{id}
//////////////////////////////////////////////////
#[put("/decks/{id}")]
pub async fn update_deck(
    db: web::Data<PgPool>,
    CurrentPlayer(actor): CurrentPlayer,
    path: web::Path<Uuid>,
    web::Json(body): web::Json<UpdateDeckReq>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let deck = deck_repo::find(&db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("deck"))?;
    require_owner_or_admin(&actor, deck.owner_id)?;
    body.validate()?;

    let name = body.name.unwrap_or(deck.name);
    let commander = body.commander.unwrap_or(deck.commander);
    let (colors, tags) = check_fields(
        &name,
        &commander,
        body.colors.as_deref().unwrap_or(&deck.colors),
        body.tags.as_deref().unwrap_or(&deck.tags),
    )?;
    let decklist_url = body.decklist_url.or(deck.decklist_url);
    let image_url = body.image_url.or(deck.image_url);

    let updated = deck_repo::update(
        &db,
        id,
        &DeckFields {
            name: name.trim(),
            commander: commander.trim(),
            decklist_url: decklist_url.as_deref(),
            image_url: image_url.as_deref(),
            colors: &colors,
            tags: &tags,
        },
    )
    .await?
    .ok_or_else(|| ApiError::not_found("deck"))?;
    metrics::record_write("deck", "update");
    Ok(envelope::ok(updated))
}

//////////////////////////////////////////////////
// DELETE /api/decks/{id}
//////////////////////////////////////////////////
/// Games that used the deck keep referencing its id.
#[delete("/decks/{id}")]
pub async fn delete_deck(
    db: web::Data<PgPool>,
    CurrentPlayer(actor): CurrentPlayer,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    let deck = deck_repo::find(&db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("deck"))?;
    require_owner_or_admin(&actor, deck.owner_id)?;

    if !deck_repo::delete(&db, id).await? {
        return Err(ApiError::not_found("deck"));
    }
    log::info!("player {} deleted deck {id} ({})", actor.id, deck.name);
    metrics::record_write("deck", "delete");
    Ok(envelope::message("deck deleted"))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_decks)
        .service(get_deck)
        .service(create_deck)
        .service(update_deck)
        .service(delete_deck);
}
