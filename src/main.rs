use anyhow::{Context, Result};
use axum::{extract::Extension, routing::get, Router};
use locale_urls::{locale_router, Config, LocaleResolver, LocaleState, LocaleUrls, ServerConfig, UrlParams};
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("locale_urls=info".parse()?)
        )
        .init();

    // Load configuration: JSON file if given, environment otherwise
    let config = match std::env::var("LOCALE_CONFIG_FILE") {
        Ok(path) => Config::from_json_file(&path)?,
        Err(_) => Config::from_env()?,
    };
    let server = ServerConfig::from_env()?;

    info!(
        "Locale URLs {} for {} language(s), default '{}'",
        if config.locale_urls_active() { "enabled" } else { "disabled" },
        config.languages.len(),
        config.default_language
    );

    let mut resolver = LocaleResolver::new(config).context("Invalid locale configuration")?;
    resolver.on_language_changed(|event| {
        info!(
            "Language changed from {:?} to '{}'",
            event.old_language, event.language
        );
    });

    let router = Router::new()
        .route("/", get(home))
        .route("/site/page", get(page))
        .route("/site/contact", get(page));
    let state = LocaleState::new(resolver, server.route_builder());
    let app = locale_router(router, state).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", server.port))
        .await
        .with_context(|| format!("Failed to bind port {}", server.port))?;
    info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}

async fn home(Extension(locale): Extension<LocaleUrls>) -> String {
    format!(
        "language: {}\npage: {}\nabsolute: {}\ndefault: {}\n",
        locale.language(),
        locale.to(UrlParams::new("site/page")),
        locale.to_absolute(UrlParams::new("site/page"), None),
        locale.to(UrlParams::new("site/page").with("language", locale.default_language()))
    )
}

async fn page(Extension(locale): Extension<LocaleUrls>) -> String {
    format!(
        "language: {}\nhome: {}\ncontact: {}\n",
        locale.language(),
        locale.to(UrlParams::new("")),
        locale.to(UrlParams::new("site/contact"))
    )
}
