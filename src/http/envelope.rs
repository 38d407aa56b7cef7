//! `{ success, data?, message? }` envelope, pagination and the extractor
//! configs that turn malformed input into the same envelope.

use actix_web::{error, http::StatusCode, web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_LIMIT: u32 = 25;
pub const MAX_LIMIT: u32 = 100;
const MAX_JSON_BYTES: usize = 256 * 1024;

//////////////////////////////////////////////////
// Pagination
//////////////////////////////////////////////////

/// `?page=&limit=` as sent by the client.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u32,
    pub limit: u32,
}

impl PageParams {
    /// Page defaults to 1, limit to 25 and is capped at 100.
    pub fn resolve(&self) -> Page {
        Page {
            page: self.page.unwrap_or(1).max(1),
            limit: self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }
}

impl Page {
    pub fn offset(self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.limit)
    }

    pub fn limit(self) -> i64 {
        i64::from(self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageLink {
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Pagination {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<PageLink>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev: Option<PageLink>,
}

/// `next` exists while items remain after this page, `prev` whenever this is
/// not the first page.
pub fn pagination(page: Page, total: i64) -> Pagination {
    let start = page.offset();
    let end = start + page.limit();
    Pagination {
        next: (end < total).then_some(PageLink {
            page: page.page + 1,
            limit: page.limit,
        }),
        prev: (start > 0).then_some(PageLink {
            page: page.page - 1,
            limit: page.limit,
        }),
    }
}

//////////////////////////////////////////////////
// Responses
//////////////////////////////////////////////////

#[derive(Serialize)]
struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

#[derive(Serialize)]
struct Paged<T> {
    success: bool,
    count: usize,
    total: i64,
    pagination: Pagination,
    data: Vec<T>,
}

fn respond<T: Serialize>(status: StatusCode, token: Option<String>, data: T) -> HttpResponse {
    HttpResponse::build(status).json(Envelope {
        success: true,
        token,
        message: None,
        data: Some(data),
    })
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::OK, None, data)
}

pub fn created<T: Serialize>(data: T) -> HttpResponse {
    respond(StatusCode::CREATED, None, data)
}

/// Authentication responses carry the bearer token next to the player.
pub fn with_token<T: Serialize>(status: StatusCode, token: String, data: T) -> HttpResponse {
    respond(status, Some(token), data)
}

pub fn message(msg: &str) -> HttpResponse {
    HttpResponse::Ok().json(Envelope::<()> {
        success: true,
        token: None,
        message: Some(msg.to_string()),
        data: None,
    })
}

pub fn paged<T: Serialize>(data: Vec<T>, page: Page, total: i64) -> HttpResponse {
    HttpResponse::Ok().json(Paged {
        success: true,
        count: data.len(),
        total,
        pagination: pagination(page, total),
        data,
    })
}

//////////////////////////////////////////////////
// Extractor configs
//////////////////////////////////////////////////

pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BYTES)
        .error_handler(|err, _req| {
            let msg = match &err {
                error::JsonPayloadError::ContentType => "expected an application/json body".to_string(),
                error::JsonPayloadError::Overflow { .. }
                | error::JsonPayloadError::OverflowKnownLength { .. } => "request body too large".to_string(),
                other => format!("invalid JSON body: {other}"),
            };
            ApiError::BadRequest(msg).into()
        })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default()
        .error_handler(|err, _req| ApiError::BadRequest(format!("invalid query string: {err}")).into())
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|_err, _req| ApiError::BadRequest("invalid id in path".into()).into())
}
