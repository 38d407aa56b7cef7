//! Player directory, guests and admin management

use actix_web::{delete, get, post, put, web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::db::player_repo::AccountUpdate;
use crate::db::{deck_repo, player_repo};
use crate::error::{ApiError, ApiResult};
use crate::http::auth::{ensure_nickname_free, require_admin, require_owner_or_admin, CurrentPlayer};
use crate::http::envelope::{self, PageParams};
use crate::metrics;

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Debug, Default, Deserialize)]
pub struct PlayerQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GuestReq {
    #[validate(length(min = 1, max = 100, message = "name is required (max 100 characters)"))]
    pub name: String,
    #[validate(length(min = 2, max = 30, message = "nickname must be 2-30 characters"))]
    pub nickname: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlayerReq {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 30, message = "nickname must be 2-30 characters"))]
    pub nickname: Option<String>,
    #[validate(url(message = "profileImage must be a URL"))]
    pub profile_image: Option<String>,
    pub is_admin: Option<bool>,
}

//////////////////////////////////////////////////
// GET /api/players
//////////////////////////////////////////////////
#[get("/players")]
pub async fn list_players(
    db: web::Data<PgPool>,
    web::Query(params): web::Query<PageParams>,
    web::Query(query): web::Query<PlayerQuery>,
) -> ApiResult<HttpResponse> {
    let page = params.resolve();
    let search = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let (rows, total) = player_repo::list(&db, search, page.limit(), page.offset()).await?;
    let data = rows.iter().map(|p| p.profile(false)).collect();
    Ok(envelope::paged(data, page, total))
}

//////////////////////////////////////////////////
// GET /api/players/{id}
//////////////////////////////////////////////////
#[get("/players/{id}")]
pub async fn get_player(db: web::Data<PgPool>, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let player = player_repo::find_by_id(&db, path.into_inner())
        .await?
        .ok_or_else(|| ApiError::not_found("player"))?;
    Ok(envelope::ok(player.profile(false)))
}

//////////////////////////////////////////////////
// POST /api/players/guest
//////////////////////////////////////////////////
/// Guests have no credentials; a later registration with the same nickname
/// claims them.
#[post("/players/guest")]
pub async fn create_guest(
    db: web::Data<PgPool>,
    CurrentPlayer(actor): CurrentPlayer,
    web::Json(body): web::Json<GuestReq>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    let name = body.name.trim();
    let nickname = body.nickname.trim();
    if name.is_empty() || nickname.is_empty() {
        return Err(ApiError::field(
            if name.is_empty() { "name" } else { "nickname" },
            "cannot be blank",
        ));
    }
    ensure_nickname_free(&db, nickname, None).await?;

    let guest = player_repo::insert(
        &db,
        &player_repo::NewPlayer {
            name,
            nickname,
            email: None,
            password_hash: None,
            profile_image: None,
            is_guest: true,
        },
    )
    .await
    .map_err(ApiError::from_write)?;

    log::info!("player {} created guest {} ({nickname})", actor.id, guest.id);
    metrics::record_write("player", "create_guest");
    Ok(envelope::created(guest.profile(false)))
}

//////////////////////////////////////////////////
// PUT /api/players/{id}
//////////////////////////////////////////////////
#[put("/players/{id}")]
pub async fn update_player(
    db: web::Data<PgPool>,
    CurrentPlayer(actor): CurrentPlayer,
    path: web::Path<Uuid>,
    web::Json(body): web::Json<UpdatePlayerReq>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    require_owner_or_admin(&actor, id)?;
    body.validate()?;

    let target = player_repo::find_by_id(&db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("player"))?;

    let name = body.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let nickname = body.nickname.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if let Some(nick) = nickname {
        ensure_nickname_free(&db, nick, Some(id)).await?;
    }

    let is_admin = body.is_admin.filter(|v| *v != target.is_admin);
    if is_admin.is_some() {
        require_admin(&actor)?;
        if target.is_guest {
            return Err(ApiError::field("isAdmin", "guests cannot be admins"));
        }
    }

    let changes = player_repo::ProfileChanges {
        name,
        nickname,
        profile_image: body.profile_image.as_deref(),
    };
    let updated = match player_repo::update_account(&db, id, &changes, is_admin)
        .await
        .map_err(ApiError::from_write)?
    {
        AccountUpdate::Updated(player) => player,
        AccountUpdate::NotFound => return Err(ApiError::not_found("player")),
        AccountUpdate::LastAdmin => {
            return Err(ApiError::BadRequest("cannot remove the last admin".into()))
        }
    };
    if let Some(flag) = is_admin {
        log::info!("player {} set admin={flag} on {id}", actor.id);
    }
    Ok(envelope::ok(updated.profile(actor.id == id)))
}

//////////////////////////////////////////////////
// DELETE /api/players/{id}
//////////////////////////////////////////////////
/// Admin only. The player's decks go with them; recorded games keep their
/// seats.
#[delete("/players/{id}")]
pub async fn delete_player(
    db: web::Data<PgPool>,
    CurrentPlayer(actor): CurrentPlayer,
    path: web::Path<Uuid>,
) -> ApiResult<HttpResponse> {
    require_admin(&actor)?;
    let id = path.into_inner();

    let target = player_repo::find_by_id(&db, id)
        .await?
        .ok_or_else(|| ApiError::not_found("player"))?;
    if target.is_admin && player_repo::count_admins(&db).await? <= 1 {
        return Err(ApiError::BadRequest("cannot delete the last admin".into()));
    }
    if !player_repo::delete(&db, id).await? {
        // lost a race with another demotion/deletion
        return Err(ApiError::BadRequest("cannot delete the last admin".into()));
    }

    log::info!("admin {} deleted player {id} ({})", actor.id, target.nickname);
    metrics::record_write("player", "delete");
    Ok(envelope::message("player deleted"))
}

//////////////////////////////////////////////////
// GET /api/players/{id}/decks
//////////////////////////////////////////////////
#[get("/players/{id}/decks")]
pub async fn player_decks(db: web::Data<PgPool>, path: web::Path<Uuid>) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    if player_repo::find_by_id(&db, id).await?.is_none() {
        return Err(ApiError::not_found("player"));
    }
    let decks = deck_repo::for_owner(&db, id).await?;
    Ok(envelope::ok(decks))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(list_players)
        .service(create_guest)
        .service(get_player)
        .service(update_player)
        .service(delete_player)
        .service(player_decks);
}
