//! external-dns webhook endpoints

pub mod types;

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::{error, info, instrument};

use crate::core::reconcile::{ChangeSet, Reconciler};
use crate::core::record::DNSRecordType;
use types::{Changes, DomainFilterBody, Edns, Endpoint, Negotiation};

pub fn router(reconciler: Arc<Reconciler>) -> Router {
    Router::new()
        .route("/", get(negotiate))
        .route("/healthz", get(healthz))
        .route("/records", get(get_records).post(apply_changes))
        .route("/adjustendpoints", post(adjust_endpoints))
        .with_state(reconciler)
}

pub async fn serve<F>(
    listener: TcpListener,
    reconciler: Arc<Reconciler>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, router(reconciler))
        .with_graceful_shutdown(shutdown)
        .await
}

#[instrument(skip(state))]
async fn negotiate(State(state): State<Arc<Reconciler>>) -> Edns<Negotiation> {
    Edns(Negotiation {
        domain_filter: DomainFilterBody {
            domains: state.domain_filter().domains.clone(),
        },
    })
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

#[instrument(skip(state))]
async fn get_records(
    State(state): State<Arc<Reconciler>>,
) -> Result<Edns<Vec<Endpoint>>, StatusCode> {
    let records = state.records().await.map_err(|e| {
        error!("Failed to list records: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Edns(records.iter().map(Endpoint::from).collect()))
}

#[instrument(skip(state))]
async fn apply_changes(
    State(state): State<Arc<Reconciler>>,
    Json(changes): Json<Changes>,
) -> StatusCode {
    let batch = ChangeSet::from(&changes);
    match state.apply(&batch).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(e) => {
            error!("Change batch failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[instrument]
async fn adjust_endpoints(Json(endpoints): Json<Vec<Endpoint>>) -> Edns<Vec<Endpoint>> {
    Edns(
        endpoints
            .into_iter()
            .filter(|endpoint| DNSRecordType::from(endpoint.record_type.as_str()).is_supported())
            .collect(),
    )
}
