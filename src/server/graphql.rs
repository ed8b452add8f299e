// GraphQL server implementation for the employee service
// This creates a standalone HTTP server around the employee schema

use std::net::SocketAddr;
use std::sync::Arc;

use async_graphql::http::GraphiQLSource;
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Json, Router, Server,
};
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::info;

use crate::engine::{
    document::DocumentStorage,
    graphql::{create_schema_with_storage, EmployeeSchema},
    nats_storage::{NATSStorage, NATSStorageConfig},
    storage::{EmployeeStorage, InMemoryStorage},
};
use crate::{EmployeeServiceError, Result};

/// Origins allowed to call the API from a browser when none are configured
pub const DEFAULT_CORS_ORIGINS: [&str; 2] = ["http://localhost:3000", "http://127.0.0.1:3000"];

/// Static message served on `/`
pub const LIVENESS_MESSAGE: &str = "Employee GraphQL server running";

/// GraphQL server configuration
#[derive(Debug, Clone)]
pub struct GraphQLServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

impl Default for GraphQLServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            cors_origins: DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        }
    }
}

/// GraphQL server
pub struct GraphQLServer {
    config: GraphQLServerConfig,
    storage: Arc<dyn EmployeeStorage>,
}

impl GraphQLServer {
    pub fn new() -> Self {
        Self {
            config: GraphQLServerConfig::default(),
            storage: Arc::new(InMemoryStorage::with_sample_data()),
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn EmployeeStorage>) -> Self {
        self.storage = storage;
        self
    }

    /// Build the HTTP routes, CORS included
    ///
    /// Fails if a configured CORS origin is not a valid header value.
    pub fn router(&self) -> Result<Router> {
        let schema = create_schema_with_storage(self.storage.clone());

        let app = Router::new()
            .route("/", get(root))
            .route("/graphql", get(graphiql).post(graphql_handler))
            .route("/health", get(health_check))
            .with_state(schema);

        Ok(app.layer(cors_layer(&self.config.cors_origins)?))
    }

    pub async fn run(self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        let app = self.router()?;
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;

        info!("🚀 GraphQL server running on http://{}", addr);
        info!("🔗 GraphQL endpoint: http://{}/graphql", addr);
        info!("🌐 CORS origins: {}", self.config.cors_origins.join(", "));

        // Use axum 0.6 syntax
        Server::bind(&addr).serve(app.into_make_service()).await?;
        Ok(())
    }
}

impl Default for GraphQLServer {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder pattern for server setup
pub struct GraphQLServerBuilder {
    server: GraphQLServer,
}

impl GraphQLServerBuilder {
    pub fn new() -> Self {
        Self {
            server: GraphQLServer::new(),
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn EmployeeStorage>) -> Self {
        self.server = self.server.with_storage(storage);
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.server.config.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.server.config.host = host.into();
        self
    }

    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.server.config.cors_origins = origins;
        self
    }

    /// Use the NATS backed document store, seeding it when empty
    pub async fn with_nats(mut self, nats_url: &str) -> Result<Self> {
        let nats_config = NATSStorageConfig {
            nats_urls: vec![nats_url.to_string()],
            ..Default::default()
        };

        let nats_storage = NATSStorage::new(nats_config).await?;
        let storage = nats_storage.document_storage();
        seed(&storage).await?;

        self.server = self.server.with_storage(Arc::new(storage));
        Ok(self)
    }

    pub fn build_router(&self) -> Result<Router> {
        self.server.router()
    }

    pub async fn build_and_run(self) -> std::result::Result<(), Box<dyn std::error::Error>> {
        self.server.run().await
    }
}

impl Default for GraphQLServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn seed(storage: &DocumentStorage) -> Result<()> {
    let inserted = storage.seed_if_empty().await?;
    if inserted > 0 {
        info!("🌱 Inserted {} sample employees", inserted);
    }
    Ok(())
}

/// CORS for the configured origins: any method, any header, credentials allowed
///
/// Wildcards cannot be combined with credentials, so methods and headers are
/// mirrored from the preflight request instead.
fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let origins = origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| {
                EmployeeServiceError::InvalidInput(format!("invalid CORS origin '{}'", origin))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

// GraphQL handler
async fn graphql_handler(State(schema): State<EmployeeSchema>, req: GraphQLRequest) -> GraphQLResponse {
    schema.execute(req.into_inner()).await.into()
}

// GraphiQL interface
async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

// Liveness message
async fn root() -> impl IntoResponse {
    Json(json!({ "message": LIVENESS_MESSAGE }))
}

// Health check endpoint
async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "Employee GraphQL Server is running!")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use hyper::body::to_bytes;
    use serde_json::Value;
    use tower::ServiceExt;

    fn app() -> Router {
        GraphQLServerBuilder::new().build_router().unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_root_returns_liveness_message() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await, json!({ "message": LIVENESS_MESSAGE }));
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_graphql_post_lists_employees() {
        let request = Request::builder()
            .method(Method::POST)
            .uri("/graphql")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json!({ "query": "{ employees { id name } }" }).to_string()))
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["employees"].as_array().unwrap().len(), 4);
        assert_eq!(body["data"]["employees"][0]["name"], "John");
    }

    #[tokio::test]
    async fn test_graphql_get_serves_graphiql() {
        let response = app()
            .oneshot(Request::builder().uri("/graphql").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body()).await.unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("graphiql"));
    }

    #[tokio::test]
    async fn test_preflight_from_allowed_origin() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/graphql")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();
        let headers = response.headers();

        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "http://localhost:3000");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST");
    }

    #[tokio::test]
    async fn test_preflight_from_unknown_origin_is_not_allowed() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/graphql")
            .header(header::ORIGIN, "http://evil.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();

        let response = app().oneshot(request).await.unwrap();

        assert!(response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn test_invalid_cors_origin_is_rejected() {
        let result = GraphQLServerBuilder::new()
            .with_cors_origins(vec!["http://bad\norigin".to_string()])
            .build_router();

        assert!(matches!(result, Err(EmployeeServiceError::InvalidInput(_))));
    }

    #[test]
    fn test_default_config() {
        let config = GraphQLServerConfig::default();

        assert_eq!(config.port, 4000);
        assert_eq!(config.cors_origins, vec!["http://localhost:3000", "http://127.0.0.1:3000"]);
    }
}
