/// The single HTTP endpoint remote clients talk to.
///
/// A client polls GET /getData until a name is armed (202), then PUTs
/// the capture body to the same path. Whichever handler wins the
/// consume race persists the body and wakes the prompt loop; losers get
/// 304 and never read the body.
use crate::handoff::Handoff;
use crate::persist;
use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Method, StatusCode};
use axum::routing::get;
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub handoff: Arc<Handoff>,
    pub upload_dir: PathBuf,
}

pub fn router(state: AppState) -> Router {
    // Browser clients poll from page origins; mirror whatever origin
    // asks. This is pass-through policy, not an access control.
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_methods([Method::GET, Method::PUT, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/getData", get(poll).put(deliver).options(preflight))
        .with_state(state)
        .layer(cors)
}

pub async fn run(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

async fn poll(State(state): State<AppState>) -> StatusCode {
    match state.handoff.peek() {
        Some(name) => {
            tracing::debug!(name = %name, "poll: name armed, waiting for upload");
            StatusCode::ACCEPTED
        }
        None => {
            tracing::info!("poll while no file name is armed");
            StatusCode::OK
        }
    }
}

async fn deliver(State(state): State<AppState>, body: Body) -> StatusCode {
    let Some(name) = state.handoff.try_consume() else {
        // Nothing armed, or another handler won the race.
        return StatusCode::NOT_MODIFIED;
    };

    // Ownership of the name has transferred here; wake the prompt loop
    // before the (possibly slow) body copy.
    state.handoff.notify_consumed();

    match persist::save_stream(&state.upload_dir, &name, body.into_data_stream()).await {
        Ok(path) => {
            tracing::info!(path = %path.display(), "file saved");
            StatusCode::OK
        }
        Err(e) => {
            tracing::error!(error = %e, name = %name, "failed to save upload");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}
