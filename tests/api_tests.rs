//! HTTP adapter tests: requests in, status codes, headers and JSON bodies
//! out. The resolver underneath runs on in-process backends.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::test::{self, TestRequest};
use actix_web::{App, web};
use chrono::Duration;

use shortloop::api::{
    ApiResponse, ErrorBody, HealthService, LinkService, PostNewLink, RedirectService,
    SerializableShortLink,
};
use shortloop::cache::object_cache::MemoryObjectCache;
use shortloop::config::Config;
use shortloop::services::LinkResolver;
use shortloop::storages::memory::MemoryStorage;
use shortloop::utils::{Clock, ManualClock, RandomCodeGenerator, SystemClock};

async fn test_resolver(clock: Arc<dyn Clock>) -> Arc<LinkResolver> {
    let mut config = Config::default();
    config.resolver.retry_base_delay_ms = 5;
    config.resolver.retry_max_delay_ms = 20;

    Arc::new(LinkResolver::with_config(
        Arc::new(MemoryStorage::new()),
        Arc::new(MemoryObjectCache::new_async().await.unwrap()),
        Arc::new(RandomCodeGenerator::new(10)),
        clock,
        &config,
    ))
}

/// Create a test app with the full route table from main.
macro_rules! api_app {
    ($resolver:expr) => {{
        test::init_service(
            App::new()
                .app_data(web::Data::new($resolver.clone()))
                .service(
                    web::scope("/api")
                        .route("/link", web::post().to(LinkService::post_link))
                        .route("/link/{code}", web::get().to(LinkService::get_link))
                        .route("/link/{code}", web::delete().to(LinkService::delete_link)),
                )
                .route("/health", web::get().to(HealthService::health_check))
                .route("/", web::get().to(RedirectService::handle_root))
                .route("/{path}", web::get().to(RedirectService::handle_redirect)),
        )
        .await
    }};
}

fn post_body(target: &str, code: Option<&str>, expires_at: Option<String>) -> PostNewLink {
    PostNewLink {
        target: target.to_string(),
        code: code.map(|s| s.to_string()),
        expires_at,
    }
}

#[actix_rt::test]
async fn test_post_link_then_redirect() {
    let resolver = test_resolver(Arc::new(SystemClock)).await;
    let app = api_app!(resolver);

    let req = TestRequest::post()
        .uri("/api/link")
        .set_json(post_body("https://example.com/page", None, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let body: ApiResponse<SerializableShortLink> = test::read_body_json(resp).await;
    assert_eq!(body.code, 0);
    assert_eq!(body.data.short_code.len(), 10);
    assert!(!body.data.alias_requested);

    let req = TestRequest::get()
        .uri(&format!("/{}", body.data.short_code))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    let location = resp.headers().get("Location").unwrap().to_str().unwrap();
    assert_eq!(location, "https://example.com/page");
}

#[actix_rt::test]
async fn test_post_link_alias_conflict_is_409() {
    let resolver = test_resolver(Arc::new(SystemClock)).await;
    let app = api_app!(resolver);

    let req = TestRequest::post()
        .uri("/api/link")
        .set_json(post_body("https://example.com/a", Some("launch"), None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = TestRequest::post()
        .uri("/api/link")
        .set_json(post_body("https://example.com/b", Some("launch"), None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.code, "E004");
}

#[actix_rt::test]
async fn test_post_link_rejects_bad_inputs_with_400() {
    let resolver = test_resolver(Arc::new(SystemClock)).await;
    let app = api_app!(resolver);

    let req = TestRequest::post()
        .uri("/api/link")
        .set_json(post_body("javascript:alert(1)", None, None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = TestRequest::post()
        .uri("/api/link")
        .set_json(post_body(
            "https://example.com",
            None,
            Some("next tuesday".to_string()),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.code, "E015");

    let req = TestRequest::post()
        .uri("/api/link")
        .set_json(post_body("https://example.com", Some("api"), None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_rt::test]
async fn test_redirect_unknown_code_is_cacheable_404() {
    let resolver = test_resolver(Arc::new(SystemClock)).await;
    let app = api_app!(resolver);

    let req = TestRequest::get().uri("/nope").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let cache_control = resp.headers().get("Cache-Control").unwrap().to_str().unwrap();
    assert_eq!(cache_control, "public, max-age=60");
}

#[actix_rt::test]
async fn test_redirect_expired_link_is_gone_and_uncacheable() {
    let clock = Arc::new(ManualClock::new(chrono::Utc::now()));
    let resolver = test_resolver(clock.clone()).await;
    let app = api_app!(resolver);

    let expires_at = (clock.now() + Duration::hours(1)).to_rfc3339();
    let req = TestRequest::post()
        .uri("/api/link")
        .set_json(post_body("https://example.com", Some("seasonal"), Some(expires_at)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = TestRequest::get().uri("/seasonal").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);

    clock.advance(Duration::hours(2));

    // The code is reusable now, so "Gone" must not be cached downstream.
    let req = TestRequest::get().uri("/seasonal").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);
    let cache_control = resp.headers().get("Cache-Control").unwrap().to_str().unwrap();
    assert_eq!(cache_control, "no-store");

    // The JSON API draws the same 410 distinction.
    let req = TestRequest::get().uri("/api/link/seasonal").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::GONE);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.code, "E007");
}

#[actix_rt::test]
async fn test_delete_link_is_204_and_idempotent() {
    let resolver = test_resolver(Arc::new(SystemClock)).await;
    let app = api_app!(resolver);

    let req = TestRequest::post()
        .uri("/api/link")
        .set_json(post_body("https://example.com", Some("doomed"), None))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = TestRequest::delete().uri("/api/link/doomed").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = TestRequest::get().uri("/doomed").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = TestRequest::delete().uri("/api/link/doomed").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_rt::test]
async fn test_health_reports_backend() {
    let resolver = test_resolver(Arc::new(SystemClock)).await;
    let app = api_app!(resolver);

    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage_backend"], "memory");
}

#[actix_rt::test]
async fn test_root_redirects_to_default_url() {
    let resolver = test_resolver(Arc::new(SystemClock)).await;
    let app = api_app!(resolver);

    let req = TestRequest::get().uri("/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(resp.headers().get("Location").is_some());
}
