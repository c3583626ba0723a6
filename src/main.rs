use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;

use shortloop::api::{HealthService, LinkService, RedirectService};
use shortloop::cache::CacheFactory;
use shortloop::config::{Config, get_config, init_config};
use shortloop::logging::init_logging;
use shortloop::services::LinkResolver;
use shortloop::storages::StorageFactory;
use shortloop::utils::{RandomCodeGenerator, SystemClock};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    if std::env::args().any(|arg| arg == "--generate-config") {
        println!("{}", Config::generate_sample_config());
        return Ok(());
    }

    init_config();
    let config = get_config();

    // Guard must stay alive for the process lifetime or file logging stops.
    let _log_guard = init_logging(config);

    let storage = StorageFactory::create()
        .await
        .unwrap_or_else(|e| panic!("Failed to create storage backend: {}", e));
    info!("Using storage backend: {}", storage.backend_name().await);

    let cache = CacheFactory::create()
        .await
        .unwrap_or_else(|e| panic!("Failed to create cache backend: {}", e));
    info!("Using cache backend: {}", config.cache.backend);

    let resolver = Arc::new(LinkResolver::new(
        storage,
        cache,
        Arc::new(RandomCodeGenerator::new(config.features.random_code_length)),
        Arc::new(SystemClock),
    ));

    let bind_address = format!("{}:{}", config.server.host, config.server.port);
    info!("Starting server at http://{}", bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(resolver.clone()))
            .service(
                web::scope("/api")
                    .route("/link", web::post().to(LinkService::post_link))
                    .route("/link/{code}", web::get().to(LinkService::get_link))
                    .route("/link/{code}", web::delete().to(LinkService::delete_link)),
            )
            .route("/health", web::get().to(HealthService::health_check))
            .route("/health", web::head().to(HealthService::health_check))
            .route("/", web::get().to(RedirectService::handle_root))
            .route("/{path}", web::get().to(RedirectService::handle_redirect))
            .route("/{path}", web::head().to(RedirectService::handle_redirect))
    })
    .workers(config.server.cpu_count)
    .bind(bind_address)?
    .run()
    .await
}
