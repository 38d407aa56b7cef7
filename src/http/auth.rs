//! Password authentication (bcrypt + JWT) and the request guards built on it

use actix_web::{get, http::StatusCode, post, put, web, HttpResponse};
use anyhow::{anyhow, Context};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::config::settings;
use crate::db::models::PlayerRow;
use crate::db::player_repo::{self, NewPlayer, ProfileChanges};
use crate::error::{ApiError, ApiResult};
use crate::http::envelope;
use crate::metrics;

//////////////////////////////////////////////////
// Tokens
//////////////////////////////////////////////////

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // player id
    pub exp: usize,
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

static KEYS: Lazy<Keys> = Lazy::new(|| {
    let secret = settings().jwt_secret.as_bytes();
    Keys {
        encoding: EncodingKey::from_secret(secret),
        decoding: DecodingKey::from_secret(secret),
    }
});

pub fn issue_token(player_id: Uuid) -> ApiResult<String> {
    let exp = Utc::now() + Duration::days(settings().jwt_expire_days);
    let claims = Claims {
        sub: player_id.to_string(),
        exp: exp.timestamp() as usize,
    };
    encode(&Header::default(), &claims, &KEYS.encoding)
        .context("encoding JWT")
        .map_err(ApiError::from)
}

/// Validates signature and expiry and returns the player id.
pub fn decode_token(token: &str) -> ApiResult<Uuid> {
    let data = decode::<Claims>(token, &KEYS.decoding, &Validation::default())
        .map_err(|_| ApiError::Unauthorized("invalid or expired token".into()))?;
    Uuid::parse_str(&data.claims.sub).map_err(|_| ApiError::Unauthorized("invalid token subject".into()))
}

//////////////////////////////////////////////////
// Passwords
//////////////////////////////////////////////////

pub async fn hash_password(password: String) -> ApiResult<String> {
    let cost = settings().bcrypt_cost;
    let hashed = web::block(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| anyhow!("bcrypt worker failed: {e}"))?
        .context("hashing password")?;
    Ok(hashed)
}

pub async fn verify_password(password: String, hash: String) -> ApiResult<bool> {
    let ok = web::block(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| anyhow!("bcrypt worker failed: {e}"))?
        .context("verifying password")?;
    Ok(ok)
}

//////////////////////////////////////////////////
// ───────────────  Extractors  ───────────────
//////////////////////////////////////////////////

pub mod extractor {
    use super::decode_token;
    use crate::db::{models::PlayerRow, player_repo};
    use crate::error::ApiError;
    use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
    use anyhow::anyhow;
    use futures_util::future::{ready, LocalBoxFuture, Ready};
    use sqlx::PgPool;
    use uuid::Uuid;

    fn bearer(req: &HttpRequest) -> Result<Uuid, ApiError> {
        // Expect:  Authorization: Bearer <JWT>
        let hdr = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("not authorized, no token".into()))?;
        let token = hdr
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::Unauthorized("malformed Authorization header".into()))?;
        decode_token(token.trim())
    }

    /// A valid bearer token; the player is not loaded.
    #[derive(Debug, Clone, Copy)]
    pub struct JwtAuth {
        pub player_id: Uuid,
    }

    impl FromRequest for JwtAuth {
        type Error = actix_web::Error;
        type Future = Ready<Result<Self, Self::Error>>;

        fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
            ready(
                bearer(req)
                    .map(|player_id| JwtAuth { player_id })
                    .map_err(Into::into),
            )
        }
    }

    /// The registered player behind the bearer token.
    #[derive(Debug, Clone)]
    pub struct CurrentPlayer(pub PlayerRow);

    impl FromRequest for CurrentPlayer {
        type Error = actix_web::Error;
        type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

        fn from_request(req: &HttpRequest, pl: &mut Payload) -> Self::Future {
            let auth = JwtAuth::from_request(req, pl).into_inner();
            let db = req.app_data::<web::Data<PgPool>>().cloned();

            Box::pin(async move {
                let JwtAuth { player_id } = auth?;
                let db = db.ok_or_else(|| ApiError::Internal(anyhow!("database pool not configured")))?;
                let player = player_repo::find_by_id(&db, player_id)
                    .await
                    .map_err(ApiError::from)?
                    .filter(|p| !p.is_guest)
                    .ok_or_else(|| ApiError::Unauthorized("player no longer exists".into()))?;
                Ok::<_, actix_web::Error>(CurrentPlayer(player))
            })
        }
    }
}
pub use extractor::{CurrentPlayer, JwtAuth};

//////////////////////////////////////////////////
// Guards
//////////////////////////////////////////////////

pub fn require_admin(actor: &PlayerRow) -> ApiResult<()> {
    if actor.is_admin {
        Ok(())
    } else {
        log::warn!("player {} attempted an admin-only action", actor.id);
        Err(ApiError::Forbidden("admin access required".into()))
    }
}

/// Passes for the owner of a resource or any admin.
pub fn require_owner_or_admin(actor: &PlayerRow, owner: Uuid) -> ApiResult<()> {
    if actor.id == owner || actor.is_admin {
        Ok(())
    } else {
        log::warn!("player {} attempted to modify a resource owned by {owner}", actor.id);
        Err(ApiError::Forbidden("not allowed to modify this resource".into()))
    }
}

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReq {
    #[validate(length(min = 1, max = 100, message = "name is required (max 100 characters)"))]
    pub name: String,
    #[validate(length(min = 2, max = 30, message = "nickname must be 2-30 characters"))]
    pub nickname: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 6, max = 128, message = "password must be at least 6 characters"))]
    pub password: String,
    #[validate(url(message = "profileImage must be a URL"))]
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginReq {
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeReq {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 2, max = 30, message = "nickname must be 2-30 characters"))]
    pub nickname: Option<String>,
    #[validate(url(message = "profileImage must be a URL"))]
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordReq {
    #[validate(length(min = 1, message = "current password is required"))]
    pub current_password: String,
    #[validate(length(min = 6, max = 128, message = "new password must be at least 6 characters"))]
    pub new_password: String,
}

/// Empty after trimming counts as missing.
fn trimmed(field: &str, value: &str) -> ApiResult<String> {
    let v = value.trim();
    if v.is_empty() {
        Err(ApiError::field(field, format!("{field} cannot be blank")))
    } else {
        Ok(v.to_string())
    }
}

/// Rejects a nickname held by somebody other than `owner`.
pub async fn ensure_nickname_free(
    db: &PgPool,
    nickname: &str,
    owner: Option<Uuid>,
) -> ApiResult<()> {
    match player_repo::find_by_nickname(db, nickname).await? {
        Some(other) if Some(other.id) != owner => {
            Err(ApiError::field("nickname", "nickname is already taken"))
        }
        _ => Ok(()),
    }
}

//////////////////////////////////////////////////
// POST /api/auth/register
//////////////////////////////////////////////////
#[post("/auth/register")]
pub async fn register(
    db: web::Data<PgPool>,
    web::Json(body): web::Json<RegisterReq>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    let name = trimmed("name", &body.name)?;
    let nickname = trimmed("nickname", &body.nickname)?;
    let email = body.email.trim().to_lowercase();

    if player_repo::find_by_email(&db, &email).await?.is_some() {
        return Err(ApiError::field("email", "email is already registered"));
    }

    let existing = player_repo::find_by_nickname(&db, &nickname).await?;
    if matches!(&existing, Some(p) if !p.is_guest) {
        return Err(ApiError::field("nickname", "nickname is already taken"));
    }

    let password_hash = hash_password(body.password).await?;
    let new = NewPlayer {
        name: &name,
        nickname: &nickname,
        email: Some(&email),
        password_hash: Some(&password_hash),
        profile_image: body.profile_image.as_deref(),
        is_guest: false,
    };

    let player = match existing {
        Some(guest) => {
            log::info!("claiming guest player {} ({nickname})", guest.id);
            player_repo::claim_guest(&db, guest.id, &new)
                .await
                .map_err(ApiError::from_write)?
                .ok_or_else(|| ApiError::field("nickname", "nickname is already taken"))?
        }
        None => player_repo::insert(&db, &new)
            .await
            .map_err(ApiError::from_write)?,
    };

    metrics::record_write("player", "register");
    let token = issue_token(player.id)?;
    Ok(envelope::with_token(StatusCode::CREATED, token, player.profile(true)))
}

//////////////////////////////////////////////////
// POST /api/auth/login
//////////////////////////////////////////////////
#[post("/auth/login")]
pub async fn login(
    db: web::Data<PgPool>,
    web::Json(body): web::Json<LoginReq>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    let invalid = || ApiError::Unauthorized("invalid credentials".into());

    let player = player_repo::find_by_email(&db, body.email.trim())
        .await?
        .filter(|p| !p.is_guest)
        .ok_or_else(invalid)?;
    let hash = player.password_hash.clone().ok_or_else(invalid)?;

    if !verify_password(body.password, hash).await? {
        log::warn!("failed login for player {}", player.id);
        return Err(invalid());
    }

    let token = issue_token(player.id)?;
    Ok(envelope::with_token(StatusCode::OK, token, player.profile(true)))
}

//////////////////////////////////////////////////
// GET /api/auth/me
//////////////////////////////////////////////////
#[get("/auth/me")]
pub async fn me(CurrentPlayer(player): CurrentPlayer) -> ApiResult<HttpResponse> {
    Ok(envelope::ok(player.profile(true)))
}

//////////////////////////////////////////////////
// PUT /api/auth/me
//////////////////////////////////////////////////
#[put("/auth/me")]
pub async fn update_me(
    db: web::Data<PgPool>,
    CurrentPlayer(player): CurrentPlayer,
    web::Json(body): web::Json<UpdateMeReq>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    let name = body.name.as_deref().map(|n| trimmed("name", n)).transpose()?;
    let nickname = body
        .nickname
        .as_deref()
        .map(|n| trimmed("nickname", n))
        .transpose()?;
    if let Some(nick) = &nickname {
        ensure_nickname_free(&db, nick, Some(player.id)).await?;
    }

    let changes = ProfileChanges {
        name: name.as_deref(),
        nickname: nickname.as_deref(),
        profile_image: body.profile_image.as_deref(),
    };
    let updated = player_repo::update_profile(&db, player.id, &changes)
        .await
        .map_err(ApiError::from_write)?
        .ok_or_else(|| ApiError::not_found("player"))?;
    Ok(envelope::ok(updated.profile(true)))
}

//////////////////////////////////////////////////
// PUT /api/auth/password
//////////////////////////////////////////////////
#[put("/auth/password")]
pub async fn change_password(
    db: web::Data<PgPool>,
    CurrentPlayer(player): CurrentPlayer,
    web::Json(body): web::Json<ChangePasswordReq>,
) -> ApiResult<HttpResponse> {
    body.validate()?;
    let hash = player
        .password_hash
        .clone()
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".into()))?;
    if !verify_password(body.current_password, hash).await? {
        return Err(ApiError::field("currentPassword", "current password is incorrect"));
    }

    let new_hash = hash_password(body.new_password).await?;
    player_repo::update_password(&db, player.id, &new_hash).await?;
    log::info!("player {} changed their password", player.id);

    let token = issue_token(player.id)?;
    Ok(envelope::with_token(StatusCode::OK, token, player.profile(true)))
}

//////////////////////////////////////////////////
// Mount
//////////////////////////////////////////////////
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(me)
        .service(update_me)
        .service(change_password);
}
