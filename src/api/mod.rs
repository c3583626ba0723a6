//! Thin actix-web adapter over the resolver: decode the request, call one
//! resolver operation, map the outcome to a status code. No invariants live
//! here.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::get_config;
use crate::errors::ShortloopError;
use crate::services::{CreateLinkRequest, LinkResolver};
use crate::storages::ShortLink;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PostNewLink {
    pub target: String,
    /// Caller-chosen code; omit for a random one.
    pub code: Option<String>,
    /// RFC 3339 timestamp; omit for a permanent link.
    pub expires_at: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SerializableShortLink {
    pub short_code: String,
    pub target_url: String,
    pub created_at: String,
    pub expires_at: Option<String>,
    pub alias_requested: bool,
}

impl From<ShortLink> for SerializableShortLink {
    fn from(link: ShortLink) -> Self {
        Self {
            short_code: link.code,
            target_url: link.target,
            created_at: link.created_at.to_rfc3339(),
            expires_at: link.expires_at.map(|t| t.to_rfc3339()),
            alias_requested: link.alias_requested,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub data: T,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ErrorBody {
    pub code: String,
    pub error: String,
    pub message: String,
}

fn status_for(err: &ShortloopError) -> StatusCode {
    match err {
        ShortloopError::InvalidUrl(_)
        | ShortloopError::InvalidExpiry(_)
        | ShortloopError::InvalidAlias(_)
        | ShortloopError::DateParse(_) => StatusCode::BAD_REQUEST,
        ShortloopError::AliasTaken(_) | ShortloopError::Conflict(_) => StatusCode::CONFLICT,
        ShortloopError::NotFound(_) => StatusCode::NOT_FOUND,
        ShortloopError::LinkExpired(_) => StatusCode::GONE,
        ShortloopError::StoreUnavailable(_) | ShortloopError::CreateAmbiguous(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &ShortloopError) -> HttpResponse {
    HttpResponse::build(status_for(err)).json(ErrorBody {
        code: err.code().to_string(),
        error: err.error_type().to_string(),
        message: err.message().to_string(),
    })
}

fn parse_expires_at(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ShortloopError> {
    match raw {
        None => Ok(None),
        Some(s) => {
            let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| {
                ShortloopError::date_parse(format!("Invalid expires_at '{}': {}", s, e))
            })?;
            Ok(Some(parsed.with_timezone(&Utc)))
        }
    }
}

pub struct LinkService;

impl LinkService {
    pub async fn post_link(
        payload: web::Json<PostNewLink>,
        resolver: web::Data<Arc<LinkResolver>>,
    ) -> impl Responder {
        let payload = payload.into_inner();

        let expires_at = match parse_expires_at(payload.expires_at.as_deref()) {
            Ok(t) => t,
            Err(e) => return error_response(&e),
        };

        let request = CreateLinkRequest {
            target: payload.target,
            alias: payload.code,
            expires_at,
        };

        match resolver.create_link(request).await {
            Ok(link) => HttpResponse::Created().json(ApiResponse {
                code: 0,
                data: SerializableShortLink::from(link),
            }),
            Err(e) => error_response(&e),
        }
    }

    pub async fn get_link(
        path: web::Path<String>,
        resolver: web::Data<Arc<LinkResolver>>,
    ) -> impl Responder {
        let code = path.into_inner();

        match resolver.resolve_link(&code).await {
            Ok(link) => HttpResponse::Ok().json(ApiResponse {
                code: 0,
                data: SerializableShortLink::from(link),
            }),
            Err(e) => error_response(&e),
        }
    }

    pub async fn delete_link(
        path: web::Path<String>,
        resolver: web::Data<Arc<LinkResolver>>,
    ) -> impl Responder {
        let code = path.into_inner();

        match resolver.delete_link(&code).await {
            Ok(()) => {
                info!("Admin API: deleted link: {}", code);
                HttpResponse::NoContent().finish()
            }
            Err(e) => error_response(&e),
        }
    }
}

pub struct RedirectService;

impl RedirectService {
    /// Bare "/" has no code to resolve; send the visitor somewhere useful.
    pub async fn handle_root() -> HttpResponse {
        HttpResponse::TemporaryRedirect()
            .insert_header(("Location", get_config().features.default_url.as_str()))
            .finish()
    }

    pub async fn handle_redirect(
        path: web::Path<String>,
        resolver: web::Data<Arc<LinkResolver>>,
    ) -> impl Responder {
        let code = path.into_inner();

        if code.is_empty() {
            return Self::handle_root().await;
        }

        match resolver.resolve_link(&code).await {
            Ok(link) => HttpResponse::build(StatusCode::TEMPORARY_REDIRECT)
                .insert_header(("Location", link.target))
                .finish(),
            Err(e @ ShortloopError::LinkExpired(_)) => {
                debug!("Redirect failed for '{}': {}", code, e);
                // Expired codes are reusable; a cached "Gone" would shadow
                // a recreated link.
                HttpResponse::build(status_for(&e))
                    .insert_header(("Content-Type", "text/html; charset=utf-8"))
                    .insert_header(("Cache-Control", "no-store"))
                    .body("Gone")
            }
            Err(e @ ShortloopError::NotFound(_)) => {
                debug!("Redirect failed for '{}': {}", code, e);
                HttpResponse::build(status_for(&e))
                    .insert_header(("Content-Type", "text/html; charset=utf-8"))
                    .insert_header(("Cache-Control", "public, max-age=60"))
                    .body("Not Found")
            }
            Err(e) => error_response(&e),
        }
    }
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    storage_backend: String,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(resolver: web::Data<Arc<LinkResolver>>) -> impl Responder {
        HttpResponse::Ok().json(HealthStatus {
            status: "ok",
            storage_backend: resolver.backend_name().await,
        })
    }
}
