//! `POST /v1/dialog`: the voice front end's request envelope in, a dual format response out.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::post;
use axum::{Json, Router};
use cpg_core::dispatch::{Dispatch, Dispatcher, RequestContext};
use cpg_core::errors::DispatchError;
use cpg_core::intent::Intent;
use cpg_core::response::Response;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum RequestKind {
    LaunchRequest,
    SessionStartedRequest,
    IntentRequest,
    SessionEndedRequest,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogRequest {
    #[serde(rename = "type")]
    pub kind: RequestKind,
    pub request_id: Option<String>,
    pub session_id: Option<String>,
    pub intent_name: Option<String>,
    #[serde(default)]
    pub slots: BTreeMap<String, Option<String>>,
}

impl DialogRequest {
    fn context(&self) -> RequestContext {
        let request_id =
            self.request_id.clone().unwrap_or_else(|| format!("req-{}", Uuid::new_v4()));
        RequestContext::new(request_id, self.session_id.clone().unwrap_or_default())
    }
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogResponse {
    #[serde(flatten)]
    pub response: Response,
    pub errors: Vec<DispatchError>,
}

impl From<Dispatch> for DialogResponse {
    fn from(dispatch: Dispatch) -> Self {
        Self { response: dispatch.response, errors: dispatch.errors }
    }
}

#[derive(Clone)]
pub struct DialogState {
    dispatcher: Arc<Dispatcher>,
}

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new().route("/v1/dialog", post(dialog)).with_state(DialogState { dispatcher })
}

pub async fn dialog(
    State(state): State<DialogState>,
    Json(request): Json<DialogRequest>,
) -> HttpResponse {
    let context = request.context();

    match request.kind {
        RequestKind::LaunchRequest => {
            Json(DialogResponse::from(state.dispatcher.launch(&context))).into_response()
        }
        RequestKind::SessionStartedRequest => {
            state.dispatcher.session_started(&context);
            StatusCode::NO_CONTENT.into_response()
        }
        RequestKind::IntentRequest => {
            let intent = Intent::from_request(request.intent_name.as_deref(), request.slots);
            let dispatch = state.dispatcher.dispatch(&intent, &context).await;
            Json(DialogResponse::from(dispatch)).into_response()
        }
        RequestKind::SessionEndedRequest => {
            state.dispatcher.session_ended(&context);
            StatusCode::NO_CONTENT.into_response()
        }
    }
}
