use std::sync::Arc;

use anyhow::{anyhow, Result};
use rocket::figment::Figment;
use rocket::http::{ContentType, Status};
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::{catch, catchers, get, post, routes, Build, Rocket, State};
use serde::Serialize;
use serde_json::Value;

use common::{Config, FeedSummary};

use crate::finder::FeedFinder;

pub const INVALID_QUERY: &str = "Missing or invalid 'query' parameter.";
pub const INTERNAL_ERROR: &str = "Internal Server Error";

/// Application state stored inside Rocket managed state.
#[derive(Clone)]
pub struct AppState {
    pub finder: Arc<FeedFinder>,
}

impl AppState {
    pub fn new(finder: Arc<FeedFinder>) -> Self {
        Self { finder }
    }
}

/// JSON body serialized with two-space indentation.
pub struct PrettyJson<T>(pub T);

impl<'r, T: Serialize> Responder<'r, 'static> for PrettyJson<T> {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let body = serde_json::to_string_pretty(&self.0).map_err(|e| {
            tracing::error!("failed to serialize response: {}", e);
            Status::InternalServerError
        })?;
        (ContentType::JSON, body).respond_to(req)
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    error: String,
}

type ApiError = (Status, PrettyJson<ErrorBody>);

fn api_error(status: Status, message: &str) -> ApiError {
    (
        status,
        PrettyJson(ErrorBody {
            error: message.to_string(),
        }),
    )
}

#[get("/health")]
async fn health() -> &'static str {
    "OK"
}

/// Find live feeds for a free-text topic or site name.
///
/// Any body that is not a JSON object with a non-empty string `query` is a 400.
#[post("/find-feed", data = "<body>")]
async fn find_feed(
    state: &State<AppState>,
    body: Option<Json<Value>>,
) -> Result<PrettyJson<Vec<FeedSummary>>, ApiError> {
    let query = body
        .as_ref()
        .and_then(|b| b.get("query"))
        .and_then(Value::as_str)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| api_error(Status::BadRequest, INVALID_QUERY))?;

    match state.finder.find_feeds(query).await {
        Ok(feeds) => Ok(PrettyJson(feeds)),
        Err(e) => {
            tracing::error!(query, "feed search failed: {:#}", e);
            Err(api_error(Status::InternalServerError, INTERNAL_ERROR))
        }
    }
}

#[catch(404)]
fn not_found() -> ApiError {
    api_error(Status::NotFound, "Not Found")
}

#[catch(500)]
fn internal_error() -> ApiError {
    api_error(Status::InternalServerError, INTERNAL_ERROR)
}

/// Assemble the Rocket instance without launching it. Tests drive this
/// through Rocket's local client.
pub fn build_rocket(figment: Figment, state: AppState) -> Rocket<Build> {
    rocket::custom(figment)
        .manage(state)
        .mount("/", routes![health, find_feed])
        .register("/", catchers![not_found, internal_error])
}

/// Rocket figment with the configured bind address and port merged in.
pub fn figment_from_config(config: &Config) -> Figment {
    rocket::Config::figment()
        .merge(("address", config.bind().to_string()))
        .merge(("port", config.port()))
}

pub async fn launch_rocket(config: &Config, finder: Arc<FeedFinder>) -> Result<()> {
    let rocket = build_rocket(figment_from_config(config), AppState::new(finder));

    tracing::info!("Server is running on {}:{}", config.bind(), config.port());
    rocket
        .launch()
        .await
        .map_err(|e| anyhow!("Rocket failed: {}", e))?;

    tracing::info!("Rocket HTTP server has shut down");
    Ok(())
}
