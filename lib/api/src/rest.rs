use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer, Result as ActixResult};
use scanmatch_core::{Extractor, Lookup, LookupOutcome};
use scanmatch_storage::Catalog;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

#[derive(Deserialize)]
struct LookupQuery {
    #[serde(default)]
    code: String,
}

#[derive(Deserialize)]
struct LookupRequest {
    #[serde(default)]
    code: String,
}

/// State shared by every worker
pub struct ApiState {
    catalog: Catalog,
    extractor: Extractor,
}

impl ApiState {
    pub fn new(catalog: Catalog, extractor: Extractor) -> Self {
        Self { catalog, extractor }
    }

    fn resolve(&self, raw: &str) -> HttpResponse {
        let lookup = Lookup::new(self.catalog.table()).with_extractor(self.extractor);
        outcome_response(&lookup.resolve(raw))
    }
}

pub struct RestApi;

impl RestApi {
    pub async fn start(state: Arc<ApiState>, port: u16) -> std::io::Result<()> {
        info!("Starting HTTP server on port {}", port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(state.clone()))
                .configure(RestApi::configure)
        })
        .bind(("0.0.0.0", port))?
        .run()
        .await
    }

    /// Route table, shared with tests
    pub fn configure(cfg: &mut web::ServiceConfig) {
        cfg.route("/lookup", web::get().to(lookup_get))
            .route("/lookup", web::post().to(lookup_post))
            .route("/health", web::get().to(health));
    }
}

fn outcome_response(outcome: &LookupOutcome<'_>) -> HttpResponse {
    match outcome {
        LookupOutcome::Invalid => HttpResponse::BadRequest().json(serde_json::json!({
            "status": "invalid",
            "error": "Enter or scan a valid code"
        })),
        LookupOutcome::NotFound { attempted } => {
            HttpResponse::NotFound().json(serde_json::json!({
                "status": "not_found",
                "attempted": attempted
            }))
        }
        LookupOutcome::Found(record) => HttpResponse::Ok().json(serde_json::json!({
            "status": "found",
            "record": record,
            "style": record.token_style()
        })),
    }
}

async fn lookup_get(
    state: web::Data<Arc<ApiState>>,
    query: web::Query<LookupQuery>,
) -> ActixResult<HttpResponse> {
    Ok(state.resolve(&query.code))
}

async fn lookup_post(
    state: web::Data<Arc<ApiState>>,
    req: web::Json<LookupRequest>,
) -> ActixResult<HttpResponse> {
    Ok(state.resolve(&req.code))
}

async fn health(state: web::Data<Arc<ApiState>>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "table_available": state.catalog.is_available(),
        "records": state.catalog.table().len()
    })))
}
