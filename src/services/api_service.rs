use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::http::{Method, StatusCode};
use actix_web::middleware::{from_fn, DefaultHeaders, Logger, Next};
use actix_web::{web, App, Error, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use chrono::Utc;
use log::{error, info, warn};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::services::entity_service::{parse_filter, parse_id, EntityService};
use crate::utils::error::ServiceError;

// POST /users body
#[derive(Debug, Deserialize, Serialize)]
pub struct NewUserRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: String,
}

// POST /users/{id}/consumptions body
#[derive(Debug, Deserialize, Serialize)]
pub struct NewConsumptionRequest {
    pub year: i32,
    pub month: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub cubic_meters: Decimal,
}

// GET /consumptions query string
#[derive(Debug, Default, PartialEq)]
pub struct ConsumptionQuery {
    pub user_id: Option<String>,
    pub year: Option<String>,
    pub month: Option<String>,
}

impl ConsumptionQuery {
    // The first occurrence of a repeated key wins
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        Self {
            user_id: first("user_id"),
            year: first("year"),
            month: first("month"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Clone)]
pub struct ApiServiceState {
    pub entity_service: EntityService,
}

impl ApiServiceState {
    pub fn new(entity_service: EntityService) -> Self {
        Self { entity_service }
    }
}

pub struct ApiService {
    state: ApiServiceState,
    server_handle: Option<actix_web::dev::ServerHandle>,
}

impl ApiService {
    pub fn new(entity_service: EntityService) -> Self {
        Self {
            state: ApiServiceState::new(entity_service),
            server_handle: None,
        }
    }

    pub async fn start(&mut self, bind_address: &str) -> std::io::Result<()> {
        info!("🌐 Starting HTTP API server on {}", bind_address);

        let state_data = web::Data::new(self.state.clone());

        let server = HttpServer::new(move || {
            App::new()
                .app_data(state_data.clone())
                .wrap(from_fn(cors_preflight))
                .wrap(cors_headers())
                .wrap(Logger::default())
                .configure(configure_routes)
        })
        .bind(bind_address)?
        .run();

        self.server_handle = Some(server.handle());

        tokio::spawn(async move {
            if let Err(e) = server.await {
                error!("❌ HTTP API server error: {}", e);
            }
        });

        info!("✅ HTTP API server listening on {}", bind_address);
        Ok(())
    }

    pub async fn stop(&mut self) {
        info!("🛑 Stopping HTTP API server...");

        if let Some(handle) = self.server_handle.take() {
            tokio::select! {
                _ = handle.stop(true) => {
                    info!("✅ HTTP API server stopped gracefully");
                }
                _ = tokio::time::sleep(tokio::time::Duration::from_secs(10)) => {
                    warn!("⚠️  HTTP API server shutdown timeout, forcing stop");
                    handle.stop(false).await;
                }
            }
        }
    }
}

/// Registers every endpoint together with the JSON and query extractor
/// error handlers.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .content_type_required(false)
            .error_handler(json_error_handler),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .route("/", web::get().to(banner))
    .route("/health", web::get().to(health_check))
    .service(
        web::resource("/users")
            .route(web::post().to(create_user))
            .route(web::get().to(list_users)),
    )
    .route("/users/{id}", web::get().to(get_user))
    .service(
        web::resource("/users/{id}/consumptions")
            .route(web::post().to(create_consumption))
            .route(web::get().to(list_user_consumptions)),
    )
    .route("/consumptions", web::get().to(list_consumptions));
}

pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Headers", "Content-Type"))
        .add(("Access-Control-Allow-Methods", "GET,POST,OPTIONS"))
}

// Answers any OPTIONS request directly
pub async fn cors_preflight(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    if req.method() == Method::OPTIONS {
        return Ok(req.into_response(HttpResponse::Ok().finish()));
    }
    let response = next.call(req).await?;
    Ok(response.map_into_boxed_body())
}

fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        ServiceError::Conflict(_) => StatusCode::CONFLICT,
        ServiceError::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: &ServiceError) -> HttpResponse {
    let status = status_for(err);
    if status.is_server_error() {
        error!("❌ {}", err);
    } else {
        warn!("⚠️  {} ({})", err, status.as_u16());
    }
    HttpResponse::build(status).json(ErrorResponse { error: err.to_string() })
}

fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> Error {
    warn!("⚠️  Rejected request body: {}", err);
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: "invalid json".to_string(),
    });
    InternalError::from_response(err, response).into()
}

fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> Error {
    warn!("⚠️  Rejected query string: {}", err);
    let response = HttpResponse::BadRequest().json(ErrorResponse {
        error: "invalid query".to_string(),
    });
    InternalError::from_response(err, response).into()
}

// GET /
async fn banner() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("water consumption service")
}

// GET /health
async fn health_check(state: web::Data<ApiServiceState>) -> ActixResult<HttpResponse> {
    let (status, database) = match state.entity_service.gateway().ping().await {
        Ok(()) => (StatusCode::OK, "reachable"),
        Err(e) => {
            error!("❌ Health check failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unreachable")
        }
    };

    Ok(HttpResponse::build(status).json(serde_json::json!({
        "status": if status.is_success() { "healthy" } else { "degraded" },
        "service": "Water Consumption Service",
        "database": database,
        "timestamp": Utc::now(),
        "version": crate::VERSION
    })))
}

// POST /users
async fn create_user(
    request: web::Json<NewUserRequest>,
    state: web::Data<ApiServiceState>,
) -> ActixResult<HttpResponse> {
    let request = request.into_inner();

    match state.entity_service.create_user(request.name, &request.email).await {
        Ok(user) => Ok(HttpResponse::Created().json(user)),
        Err(e) => Ok(error_response(&e)),
    }
}

// GET /users
async fn list_users(state: web::Data<ApiServiceState>) -> ActixResult<HttpResponse> {
    match state.entity_service.list_users().await {
        Ok(users) => Ok(HttpResponse::Ok().json(users)),
        Err(e) => Ok(error_response(&e)),
    }
}

// GET /users/{id}
async fn get_user(
    path: web::Path<String>,
    state: web::Data<ApiServiceState>,
) -> ActixResult<HttpResponse> {
    let id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match state.entity_service.get_user(id).await {
        Ok(user) => Ok(HttpResponse::Ok().json(user)),
        Err(e) => Ok(error_response(&e)),
    }
}

// POST /users/{id}/consumptions
async fn create_consumption(
    path: web::Path<String>,
    request: web::Json<NewConsumptionRequest>,
    state: web::Data<ApiServiceState>,
) -> ActixResult<HttpResponse> {
    let user_id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };
    let request = request.into_inner();

    match state
        .entity_service
        .create_consumption(user_id, request.year, request.month, request.cubic_meters)
        .await
    {
        Ok(record) => Ok(HttpResponse::Created().json(record)),
        Err(e) => Ok(error_response(&e)),
    }
}

// GET /users/{id}/consumptions
async fn list_user_consumptions(
    path: web::Path<String>,
    state: web::Data<ApiServiceState>,
) -> ActixResult<HttpResponse> {
    let user_id = match parse_id(&path.into_inner()) {
        Ok(id) => id,
        Err(e) => return Ok(error_response(&e)),
    };

    match state.entity_service.list_consumptions_for_user(user_id).await {
        Ok(records) => Ok(HttpResponse::Ok().json(records)),
        Err(e) => Ok(error_response(&e)),
    }
}

// GET /consumptions?user_id=&year=&month=
async fn list_consumptions(
    query: web::Query<Vec<(String, String)>>,
    state: web::Data<ApiServiceState>,
) -> ActixResult<HttpResponse> {
    let query = ConsumptionQuery::from_pairs(&query);
    let filter = match parse_filter(
        query.user_id.as_deref(),
        query.year.as_deref(),
        query.month.as_deref(),
    ) {
        Ok(filter) => filter,
        Err(e) => return Ok(error_response(&e)),
    };

    match state.entity_service.list_consumptions(&filter).await {
        Ok(records) => Ok(HttpResponse::Ok().json(records)),
        Err(e) => Ok(error_response(&e)),
    }
}
