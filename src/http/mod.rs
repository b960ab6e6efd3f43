pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::{
    config::ConsentSettings,
    consent::ConsentUrlIssuer,
    reporting::{ReportingService, ThreadStore},
    secrets::SecretProvider,
};

pub struct AppContext<S>
where
    S: ThreadStore + 'static,
{
    pub settings: Arc<ConsentSettings>,
    pub secrets: Arc<SecretProvider>,
    pub issuer: Arc<ConsentUrlIssuer>,
    pub reporting: Arc<ReportingService<S>>,
}

pub type SharedContext<S> = Arc<AppContext<S>>;

pub fn router<S>(context: SharedContext<S>) -> Router
where
    S: ThreadStore + 'static,
{
    Router::new()
        .route("/api/consent/generate", post(handlers::consent::generate::<S>))
        .route("/api/consent/callback", get(handlers::consent::callback::<S>))
        .route(
            "/api/reporting/threads",
            get(handlers::reporting::list_threads::<S>),
        )
        .route(
            "/api/reporting/threads/{thread_id}/messages",
            get(handlers::reporting::thread_messages::<S>),
        )
        .route(
            "/api/reporting/weekly",
            get(handlers::reporting::weekly_summaries::<S>),
        )
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(context)
}
