use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::metrics::{ApiMetrics, MetricsCollector};
use crate::simulation::Simulation;
use crate::AppState;

/// Fresh state with its own registry and the given work simulation.
pub fn state_with(simulation: impl Simulation + 'static) -> Arc<AppState> {
    let metrics = Arc::new(MetricsCollector::new());
    let api = ApiMetrics::new(&metrics).unwrap();
    Arc::new(AppState {
        metrics,
        api,
        simulation: Arc::new(simulation),
    })
}

/// Serve `app` on an ephemeral localhost port for the rest of the test.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
