use std::net::SocketAddr;
use std::sync::Arc;

use tripdesk_api::{app, AppState};
use tripdesk_offer::OfferRepository;
use tripdesk_order::{NoteRepository, OrderRepository, ResponseRepository};
use tripdesk_store::{
    Config, DbClient, MemoryStore, PgNoteRepository, PgOfferRepository, PgOrderRepository,
    PgResponseRepository,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tripdesk_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Tripdesk API on port {}", config.server.port);

    let state = match config.database.backend.as_str() {
        "memory" => {
            tracing::warn!("Using in-memory storage; all data is lost on shutdown");
            let store = Arc::new(MemoryStore::new());
            AppState::new(
                store.clone() as Arc<dyn OfferRepository>,
                store.clone() as Arc<dyn OrderRepository>,
                store.clone() as Arc<dyn ResponseRepository>,
                store as Arc<dyn NoteRepository>,
            )
        }
        "postgres" => {
            let db = DbClient::new(&config.database.url)
                .await
                .expect("Failed to connect to Postgres");
            db.migrate().await.expect("Failed to run migrations");
            AppState::new(
                Arc::new(PgOfferRepository::new(db.pool.clone())),
                Arc::new(PgOrderRepository::new(db.pool.clone())),
                Arc::new(PgResponseRepository::new(db.pool.clone())),
                Arc::new(PgNoteRepository::new(db.pool)),
            )
        }
        other => panic!("Unknown database backend {:?}; expected \"memory\" or \"postgres\"", other),
    };

    let app = app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
