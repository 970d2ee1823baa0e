//! Contact HTTP Routes
//!
//! - `POST   /`    submit (behind the admission gate)
//! - `GET    /`    paginated listing, newest first
//! - `GET    /:id` single submission
//! - `DELETE /:id` remove a submission

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::rejection::{FormRejection, JsonRejection, QueryRejection};
use axum::extract::{ConnectInfo, FromRequest, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use serde_json::Value;

use crate::pipeline::{ListQuery, QueryService, SubmissionPipeline};
use crate::validation::ContactInput;

use super::errors::{ApiError, ApiResult};
use super::rate_limit::{admission_gate, AdmissionGate};
use super::response::{DataResponse, ListResponse, MessageResponse};

pub const SUBMISSION_RECEIVED: &str =
    "Your message has been received. We will get back to you soon!";
pub const CONTACT_DELETED: &str = "Contact deleted successfully.";
const BODY_TOO_LARGE: &str = "Request body too large.";

/// Shared state for contact routes
pub struct ContactState {
    pub submissions: SubmissionPipeline,
    pub queries: QueryService,
}

/// Create contact routes
pub fn contact_routes(state: Arc<ContactState>, gate: Arc<AdmissionGate>) -> Router {
    Router::new()
        .route(
            "/",
            post(create_contact)
                .route_layer(middleware::from_fn_with_state(gate, admission_gate))
                .get(list_contacts),
        )
        .route("/:id", get(get_contact).delete(delete_contact))
        .with_state(state)
}

async fn create_contact(
    State(state): State<Arc<ContactState>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    request: Request,
) -> ApiResult<impl IntoResponse> {
    let input = contact_input(request).await?;
    let ip_address = connect.map(|ConnectInfo(addr)| addr.ip().to_string());

    let record = state.submissions.submit(&input, ip_address).await?;

    Ok((
        StatusCode::CREATED,
        Json(DataResponse::with_message(SUBMISSION_RECEIVED, record)),
    ))
}

async fn list_contacts(
    State(state): State<Arc<ContactState>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> ApiResult<impl IntoResponse> {
    // A query string that doesn't fit (e.g. a repeated key) means defaults.
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let page = state.queries.list(&query).await?;
    Ok(Json(ListResponse::new(page.items, page.pagination)))
}

async fn get_contact(
    State(state): State<Arc<ContactState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let record = state.queries.get(&id).await?;
    Ok(Json(DataResponse::new(record)))
}

async fn delete_contact(
    State(state): State<Arc<ContactState>>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    state.queries.delete(&id).await?;
    Ok(Json(MessageResponse::new(CONTACT_DELETED)))
}

/// Turn the raw body into validator input.
///
/// HTML form posts are decoded as `application/x-www-form-urlencoded`;
/// everything else goes through the JSON path.
async fn contact_input(request: Request) -> ApiResult<ContactInput> {
    let is_form = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| {
            v.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        });

    if is_form {
        form_input(Form::<ContactInput>::from_request(request, &()).await)
    } else {
        json_input(Json::<Value>::from_request(request, &()).await)
    }
}

fn form_input(payload: Result<Form<ContactInput>, FormRejection>) -> ApiResult<ContactInput> {
    match payload {
        Ok(Form(input)) => Ok(input),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(ApiError::PayloadTooLarge(BODY_TOO_LARGE.into()))
        }
        Err(_) => Err(ApiError::BadRequest("Malformed form body.".into())),
    }
}

/// A body that is absent, not JSON-typed or not an object carries no
/// fields, so the validator reports every field as missing.
fn json_input(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<ContactInput> {
    match payload {
        Ok(Json(value @ Value::Object(_))) => {
            serde_json::from_value(value).map_err(|err| ApiError::BadRequest(err.to_string()))
        }
        Ok(Json(_)) | Err(JsonRejection::MissingJsonContentType(_)) => Ok(ContactInput::default()),
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(ApiError::PayloadTooLarge(BODY_TOO_LARGE.into()))
        }
        Err(_) => Err(ApiError::BadRequest("Malformed JSON body.".into())),
    }
}
