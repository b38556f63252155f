//! Axum-based companion gateway: the HTTP host around anima-core.
//!
//! The gateway owns the engine, the session store, and the bridge key; the
//! browser UI is a stateless client and never sees the LLM API key. Engine
//! turns for one session are strictly sequential (a per-session mutex);
//! distinct sessions are fully independent.

mod autonomy_loop;
mod handlers;

use anima_core::{AnimaConfig, CompanionBridge, Engine, SessionMemory, SessionStore};
use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shared gateway state: engine + store + bridge + live session handles.
pub struct AppState {
    pub engine: Engine,
    pub config: AnimaConfig,
    pub store: SessionStore,
    pub bridge: Option<CompanionBridge>,
    /// Live sessions: the mutex serializes engine turns per session.
    pub sessions: DashMap<String, Arc<Mutex<SessionMemory>>>,
}

impl AppState {
    /// Returns the live handle for a session, loading from the store or
    /// creating a fresh record as needed.
    pub fn session_handle(
        &self,
        session_id: &str,
    ) -> Result<Arc<Mutex<SessionMemory>>, anima_core::StoreError> {
        // Entry API so two racing first turns can never mint two handles
        // for the same session.
        match self.sessions.entry(session_id.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(e) => Ok(e.get().clone()),
            dashmap::mapref::entry::Entry::Vacant(e) => {
                let memory = match self.store.load(session_id)? {
                    Some(memory) => memory,
                    None => SessionMemory::fresh(),
                };
                let handle = Arc::new(Mutex::new(memory));
                e.insert(handle.clone());
                Ok(handle)
            }
        }
    }
}

fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any);

    let static_dir = state.config.static_dir.clone();

    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/chat", post(handlers::chat))
        .route("/api/session/:id", get(handlers::get_session))
        .route("/api/session/:id/reset", post(handlers::reset_session))
        .route("/api/session/:id/remember", post(handlers::remember))
        .route("/api/session/:id/export", get(handlers::export_session))
        .route("/api/session/import", post(handlers::import_session))
        .with_state(state);

    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(cors)
}

#[tokio::main]
async fn main() {
    // Load .env first: the LLM key stays backend-only.
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[anima-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AnimaConfig::from_env();
    let engine = Engine::new(config.evolution_policy);

    let store = match SessionStore::open_path(&config.data_dir) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!(target: "anima::gateway", error = %e, "cannot open session store");
            std::process::exit(1);
        }
    };

    let bridge = CompanionBridge::from_env();
    if bridge.is_none() {
        tracing::warn!(
            target: "anima::gateway",
            "no API key found (anima.toml or OPENROUTER_API_KEY); serving offline replies"
        );
    }

    let state = Arc::new(AppState {
        engine,
        config: config.clone(),
        store,
        bridge,
        sessions: DashMap::new(),
    });

    autonomy_loop::spawn(state.clone());

    let app = build_app(state);
    tracing::info!(
        target: "anima::gateway",
        addr = %config.listen_addr,
        policy = config.evolution_policy.as_str(),
        "companion gateway listening"
    );

    let listener = match tokio::net::TcpListener::bind(&config.listen_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(target: "anima::gateway", error = %e, addr = %config.listen_addr, "bind failed");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(target: "anima::gateway", error = %e, "server stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_state(dir: &std::path::Path) -> Arc<AppState> {
        Arc::new(AppState {
            engine: Engine::default(),
            config: AnimaConfig::default(),
            store: SessionStore::open_path(dir.join("sessions")).unwrap(),
            bridge: None,
            sessions: DashMap::new(),
        })
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_answers() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(test_state(dir.path()));
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_app(test_state(dir.path()));
        let response = app
            .oneshot(
                Request::get("/api/session/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn offline_chat_turn_still_evolves_state() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let app = build_app(state.clone());
        let response = app
            .oneshot(
                Request::post("/api/chat")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"message": "gracias, te quiero, aprecio esta paz"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["cognitive"]["primary_emotion"], "love");
        assert_eq!(json["reply"], handlers::OFFLINE_REPLY);
        // The turn persisted: the session is now loadable from the store.
        let session_id = json["session_id"].as_str().unwrap();
        let stored = state.store.load(session_id).unwrap().unwrap();
        assert_eq!(stored.interaction_count, 1);
    }

    #[tokio::test]
    async fn import_then_export_round_trips_traits() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path());
        let document = SessionMemory::new(42).to_json().unwrap();

        let app = build_app(state.clone());
        let response = app
            .clone()
            .oneshot(
                Request::post("/api/session/import")
                    .body(Body::from(document.clone()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        let session_id = json["session_id"].as_str().unwrap().to_string();

        let response = app
            .oneshot(
                Request::get(format!("/api/session/{session_id}/export"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let exported = body_json(response).await;
        let original: serde_json::Value = serde_json::from_str(&document).unwrap();
        assert_eq!(exported["traits"], original["traits"]);
        assert_eq!(exported["resonance_field"], original["resonance_field"]);
    }
}
