use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use warmeleads::checkout::StripeCheckout;
use warmeleads::config::{AppConfig, StripeConfig, TwilioConfig};
use warmeleads::funnel::{
    FunnelConfig, FunnelManager, FunnelRouteState, funnel_routes, spawn_eviction_task,
};
use warmeleads::notify::TwilioWhatsApp;
use warmeleads::store::{LibSqlBackend, SessionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env()?;

    eprintln!("🔥 WarmeLeads v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Chat API: http://0.0.0.0:{}/api/chat/sessions", config.port);
    eprintln!("   Chat WS:  ws://0.0.0.0:{}/ws/chat/{{id}}", config.port);

    // ── Database ─────────────────────────────────────────────────────────
    let db_path = std::path::Path::new(&config.db_path);
    let store: Arc<dyn SessionStore> = Arc::new(LibSqlBackend::new_local(db_path).await?);
    eprintln!("   Database: {}", config.db_path);

    // ── Funnel ───────────────────────────────────────────────────────────
    let mut manager = FunnelManager::new(
        store,
        FunnelConfig {
            typing_delay: config.typing_delay,
            currency: config.currency.clone(),
            idle_timeout: config.session_idle_timeout,
        },
    );

    match StripeConfig::from_env() {
        Some(stripe) => {
            manager = manager.with_checkout(Arc::new(StripeCheckout::new(stripe)));
            eprintln!("   Checkout: stripe");
        }
        None => eprintln!("   Checkout: disabled (STRIPE_SECRET_KEY not set)"),
    }

    match TwilioConfig::from_env() {
        Some(twilio) => {
            eprintln!("   WhatsApp: {} recipient(s)", twilio.to_numbers.len());
            manager = manager.with_notifier(Arc::new(TwilioWhatsApp::new(twilio)));
        }
        None => eprintln!("   WhatsApp: disabled"),
    }

    let manager = Arc::new(manager);
    let _eviction_handle = spawn_eviction_task(Arc::clone(&manager));

    let app = funnel_routes(FunnelRouteState { manager })
    .layer(ServiceBuilder::new().layer(CorsLayer::permissive()));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!(port = config.port, "WarmeLeads server started");
    axum::serve(listener, app).await?;

    Ok(())
}
