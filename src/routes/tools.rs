use crate::{
    error::{AppError, Result, ValidationError},
    state::AppState,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

/// Operations exposed to tool-calling clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    GetBookmarks,
    AddBookmark,
    UpdateBookmark,
    GetTags,
    RenameTag,
    SuggestTags,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::GetBookmarks,
        Tool::AddBookmark,
        Tool::UpdateBookmark,
        Tool::GetTags,
        Tool::RenameTag,
        Tool::SuggestTags,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::GetBookmarks => "get_bookmarks",
            Tool::AddBookmark => "add_bookmark",
            Tool::UpdateBookmark => "update_bookmark",
            Tool::GetTags => "get_tags",
            Tool::RenameTag => "rename_tag",
            Tool::SuggestTags => "suggest_tags",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::GetBookmarks => {
                "List bookmarks, optionally within a date range of at most 90 days and filtered by up to 3 tags"
            }
            Tool::AddBookmark => "Save a bookmark, overwriting any existing bookmark with the same url",
            Tool::UpdateBookmark => {
                "Change some fields of an existing bookmark while keeping the others"
            }
            Tool::GetTags => "List all tags with their usage counts, most used first",
            Tool::RenameTag => "Rename a tag on every bookmark that carries it",
            Tool::SuggestTags => "Get popular and recommended tags for a url",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_tools))
        .route("/:name", post(call_tool))
}

/// List available tools
/// GET /tools
async fn list_tools() -> Json<Value> {
    let tools: Vec<Value> = Tool::ALL
        .into_iter()
        .map(|tool| json!({ "name": tool.name(), "description": tool.description() }))
        .collect();

    Json(json!({ "tools": tools }))
}

/// Invoke a tool with a JSON object of arguments
/// POST /tools/:name
async fn call_tool(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<Value>> {
    let tool = Tool::from_name(&name).ok_or_else(|| AppError::UnknownTool(name.clone()))?;
    let args = parse_body(&body)?;
    debug!("Calling tool {}", tool.name());

    let response = match tool {
        Tool::GetBookmarks => to_json(
            state
                .bookmark_service
                .get_bookmarks(parse_args(args)?)
                .await?,
        )?,
        Tool::AddBookmark => to_json(
            state
                .bookmark_service
                .add_bookmark(parse_args(args)?)
                .await?,
        )?,
        Tool::UpdateBookmark => to_json(
            state
                .bookmark_service
                .update_bookmark(parse_args(args)?)
                .await?,
        )?,
        Tool::GetTags => {
            // get_tags takes no arguments but still rejects unexpected ones
            let _: NoArgs = parse_args(args)?;
            to_json(state.tag_service.get_tags().await?)?
        }
        Tool::RenameTag => to_json(state.tag_service.rename_tag(parse_args(args)?).await?)?,
        Tool::SuggestTags => to_json(state.tag_service.suggest_tags(parse_args(args)?).await?)?,
    };

    Ok(Json(response))
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct NoArgs {}

/// An empty body means "no arguments"; anything else must be a JSON object.
fn parse_body(body: &[u8]) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(json!({}));
    }

    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Null) => Ok(json!({})),
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(_) => Err(ValidationError::InvalidArguments("arguments must be a JSON object".into()).into()),
        Err(e) => Err(ValidationError::InvalidArguments(e.to_string()).into()),
    }
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| ValidationError::InvalidArguments(e.to_string()).into())
}

fn to_json<T: Serialize>(response: T) -> Result<Value> {
    Ok(serde_json::to_value(response)?)
}
