use std::net::SocketAddr;
use std::sync::Arc;

use oasis_api::dispatch::run_dispatcher;
use oasis_api::gateway::Gateway;
use oasis_api::sessions::SessionRouter;
use oasis_api::transport::{ChatTransport, HttpChatTransport};
use oasis_api::{app, AppState};
use oasis_booking::{ApprovalService, BookingFlow, CapacityGate, NoticeQueue, TimestampCodeIssuer};
use oasis_core::{OperatorDirectory, ReservationStore};
use oasis_shared::{OperatorRecord, RequesterId};
use oasis_store::{Config, DbClient, SqliteOperatorDirectory, SqliteReservationStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "oasis_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().expect("Failed to load config");
    tracing::info!("Starting Oasis gateway on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to open database");
    db.migrate().await.expect("Failed to run migrations");

    let reservations: Arc<dyn ReservationStore> =
        Arc::new(SqliteReservationStore::new(db.pool.clone()));
    let operators: Arc<dyn OperatorDirectory> =
        Arc::new(SqliteOperatorDirectory::new(db.pool.clone()));

    seed_bootstrap_operator(&*operators, &config).await;

    let transport: Arc<dyn ChatTransport> = Arc::new(HttpChatTransport::new(
        config.transport.api_url.clone(),
        config.transport.api_token.clone(),
    ));

    let (notices, notice_rx) = NoticeQueue::bounded(config.server.notice_queue_capacity);
    tokio::spawn(run_dispatcher(
        notice_rx,
        operators.clone(),
        transport.clone(),
        config.business_rules.currency.clone(),
    ));

    let flow = BookingFlow::new(
        reservations.clone(),
        CapacityGate::new(config.capacity.clone()),
        Arc::new(TimestampCodeIssuer::new(config.business_rules.code_prefix.clone())),
        notices.clone(),
        config.business_rules.price_per_person,
    );
    let approvals = ApprovalService::new(reservations.clone(), operators.clone(), notices);
    let gateway = Arc::new(Gateway::new(
        flow,
        approvals,
        reservations,
        transport,
        config.business_rules.clone(),
    ));

    let state = AppState {
        sessions: SessionRouter::new(gateway),
        webhook_secret: config.transport.webhook_secret.clone(),
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app(state)).await.unwrap();
}

/// A fresh deployment has nobody who could promote the first operator,
/// so an empty directory is seeded with the configured identity.
async fn seed_bootstrap_operator(operators: &dyn OperatorDirectory, config: &Config) {
    let empty = operators
        .is_empty()
        .await
        .expect("Failed to read operator directory");
    if !empty {
        return;
    }

    let seed = &config.bootstrap_operator;
    let record = OperatorRecord::new(
        RequesterId::new(seed.identity.clone()),
        seed.username.clone(),
        seed.full_name.clone(),
    );
    operators
        .insert(&record)
        .await
        .expect("Failed to seed bootstrap operator");
    tracing::info!("Seeded bootstrap operator {}", record.identity);
}
