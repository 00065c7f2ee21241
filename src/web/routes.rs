use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;

use warp::{http::StatusCode, reply, Filter, Rejection, Reply};

use crate::error::StoreError;
use crate::query::StoryQuery;
use crate::storage::store::StoryStore;
use crate::storage::types::VoteDirection;
use crate::web::types::{ApiError, StoryPayload, VotePayload};

const MISSING_FIELDS: &str = "'title' and 'url' of new story need to be specified";
const BAD_DIRECTION: &str = "'direction' only takes 'up', 'down' as values";
const NO_STORIES: &str = "No stories were found";

fn error_reply(status: StatusCode, message: impl Into<String>) -> warp::reply::Response {
    reply::with_status(reply::json(&ApiError::new(message)), status).into_response()
}

fn store_error_reply(err: StoreError) -> warp::reply::Response {
    match err {
        StoreError::NotFound => error_reply(StatusCode::NOT_FOUND, "No stories with this id"),
        StoreError::InvalidVote => error_reply(
            StatusCode::BAD_REQUEST,
            "Can't downvote a story with a score of 0",
        ),
        StoreError::Unavailable(_) => {
            error_reply(StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable")
        }
    }
}

/// GET /stories?search=&sort=&order=
pub fn list_stories_route(
    store: Arc<dyn StoryStore>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("stories")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and_then(move |params: HashMap<String, String>| {
            let store = store.clone();
            async move {
                let query = match StoryQuery::from_params(&params) {
                    Ok(q) => q,
                    Err(e) => {
                        return Ok::<_, Rejection>(error_reply(
                            StatusCode::BAD_REQUEST,
                            e.to_string(),
                        ))
                    }
                };
                match store.list(&query).await {
                    Ok(stories) if stories.is_empty() => {
                        Ok(error_reply(StatusCode::NOT_FOUND, NO_STORIES))
                    }
                    Ok(stories) => Ok(reply::json(&stories).into_response()),
                    Err(e) => Ok(store_error_reply(e)),
                }
            }
        })
}

/// POST /stories
pub fn create_story_route(
    store: Arc<dyn StoryStore>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path("stories")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json::<StoryPayload>())
        .and_then(move |payload: StoryPayload| {
            let store = store.clone();
            async move {
                let (title, url) = match (payload.title, payload.url) {
                    (Some(title), Some(url)) => (title, url),
                    _ => {
                        return Ok::<_, Rejection>(error_reply(
                            StatusCode::BAD_REQUEST,
                            MISSING_FIELDS,
                        ))
                    }
                };
                match store.create(&title, &url).await {
                    Ok(story) => Ok(reply::with_status(
                        reply::json(&story),
                        StatusCode::CREATED,
                    )
                    .into_response()),
                    Err(e) => Ok(store_error_reply(e)),
                }
            }
        })
}

/// PATCH /stories/:id
pub fn update_story_route(
    store: Arc<dyn StoryStore>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("stories" / i64)
        .and(warp::patch())
        .and(warp::body::json::<StoryPayload>())
        .and_then(move |id: i64, payload: StoryPayload| {
            let store = store.clone();
            async move {
                // id validity first, then field presence
                if let Err(e) = store.get(id).await {
                    return Ok::<_, Rejection>(store_error_reply(e));
                }
                let (title, url) = match (payload.title, payload.url) {
                    (Some(title), Some(url)) => (title, url),
                    _ => return Ok(error_reply(StatusCode::BAD_REQUEST, MISSING_FIELDS)),
                };
                match store.update(id, &title, &url).await {
                    Ok(story) => Ok(reply::json(&story).into_response()),
                    Err(e) => Ok(store_error_reply(e)),
                }
            }
        })
}

/// DELETE /stories/:id
pub fn delete_story_route(
    store: Arc<dyn StoryStore>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("stories" / i64)
        .and(warp::delete())
        .and_then(move |id: i64| {
            let store = store.clone();
            async move {
                match store.delete(id).await {
                    Ok(()) => Ok::<_, Rejection>(
                        reply::json(&serde_json::json!({ "deleted": id })).into_response(),
                    ),
                    Err(e) => Ok(store_error_reply(e)),
                }
            }
        })
}

/// POST /stories/:id/votes
pub fn vote_route(
    store: Arc<dyn StoryStore>,
) -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    warp::path!("stories" / i64 / "votes")
        .and(warp::post())
        .and(warp::body::json::<VotePayload>())
        .and_then(move |id: i64, payload: VotePayload| {
            let store = store.clone();
            async move {
                // id validity is checked before the direction token, so an
                // unknown story with a bad direction still yields 404
                if let Err(e) = store.get(id).await {
                    return Ok::<_, Rejection>(store_error_reply(e));
                }
                let direction = match payload.direction.as_deref().and_then(VoteDirection::parse)
                {
                    Some(d) => d,
                    None => return Ok(error_reply(StatusCode::BAD_REQUEST, BAD_DIRECTION)),
                };
                match store.apply_vote(id, direction).await {
                    Ok(story) => Ok(reply::json(&story).into_response()),
                    Err(e) => Ok(store_error_reply(e)),
                }
            }
        })
}

/// Composes the full API with a recover handler that keeps every error body
/// in the `{"error": true, "message": ...}` shape.
pub fn api(
    store: Arc<dyn StoryStore>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    list_stories_route(store.clone())
        .or(create_story_route(store.clone()))
        .or(update_story_route(store.clone()))
        .or(delete_story_route(store.clone()))
        .or(vote_route(store))
        .recover(handle_rejection)
}

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Resource not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method not allowed".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Unhandled error".to_string(),
        )
    };
    Ok(reply::with_status(
        reply::json(&ApiError::new(message)),
        status,
    ))
}
