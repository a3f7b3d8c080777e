use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    async_trait,
    body::Body,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, Request, StatusCode},
    routing::get,
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::{debug, error, info, Span};

use crate::{
    artist,
    cache::RequestCache,
    config::Config,
    playable::{Playable, StreamBase, StreamType},
    preview::{
        display::{PreviewDisplay, Thresholds},
        types::NewPreview,
        SongPreview,
    },
    store::Store,
};

pub struct AppState {
    store: Arc<Store>,
    stream_base: String,
    thresholds: Thresholds,
}

impl AppState {
    pub fn new(store: Arc<Store>, config: &Config) -> Arc<Self> {
        Arc::new(AppState {
            store,
            stream_base: config.system.stream_base(),
            thresholds: config.preview.thresholds(),
        })
    }
}

type ApiError = (StatusCode, String);

/// Cookie carrying the web session id.
pub const SESSION_COOKIE: &str = "prevue_session";
/// Header carrying the id of the logged in user, if any.
pub const USER_HEADER: &str = "x-prevue-user";
/// Upper bound on ids accepted by one batch request.
pub const MAX_BATCH_IDS: usize = 1000;

/// Who is asking: the current web session and, optionally, the user.
struct Visitor {
    session: Option<String>,
    user_id: Option<i32>,
}

#[async_trait]
impl<S> FromRequestParts<S> for Visitor
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let session = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|session| !session.is_empty());
        let user_id = parts
            .headers
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse().ok());

        Ok(Visitor { session, user_id })
    }
}

#[derive(Serialize)]
struct PreviewView {
    #[serde(flatten)]
    preview: SongPreview,
    artist_name: Option<String>,
    play_url: Option<String>,
    stream_types: &'static [StreamType],
    display: PreviewDisplay,
}

async fn view(
    state: &AppState,
    cache: &mut RequestCache,
    visitor: &Visitor,
    preview: SongPreview,
) -> PreviewView {
    let artist_name = preview.artist_name(&state.store, cache).await;
    let name = artist_name.clone().unwrap_or_default();
    let base = StreamBase {
        url: &state.stream_base,
        user_id: visitor.user_id,
    };
    let play_url = preview.play_url(&base, &name, "");
    let display = preview.format(&name, state.thresholds);

    PreviewView {
        stream_types: preview.stream_types(),
        preview,
        artist_name,
        play_url,
        display,
    }
}

#[derive(Serialize, Deserialize)]
struct Created {
    id: i32,
}

async fn create_preview(
    State(state): State<Arc<AppState>>,
    Json(preview): Json<NewPreview>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    match SongPreview::insert(&state.store, &preview).await {
        Ok(id) => Ok((StatusCode::CREATED, Json(Created { id }))),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string())),
    }
}

#[derive(Deserialize)]
struct AlbumQuery {
    album_mbid: String,
}

async fn session_previews(
    State(state): State<Arc<AppState>>,
    visitor: Visitor,
    Query(query): Query<AlbumQuery>,
) -> Result<Json<Vec<PreviewView>>, ApiError> {
    let Some(session) = visitor.session.as_deref() else {
        return Err((StatusCode::UNAUTHORIZED, "no session".to_string()));
    };

    let mut cache = RequestCache::new();
    let previews =
        SongPreview::for_session(&state.store, &mut cache, session, &query.album_mbid).await;
    artist::build_cache(&state.store, &mut cache, previews.iter().map(|p| p.artist)).await;

    let mut views = Vec::with_capacity(previews.len());
    for preview in previews {
        views.push(view(&state, &mut cache, &visitor, preview).await);
    }
    Ok(Json(views))
}

#[derive(Deserialize)]
struct BatchQuery {
    /// Comma separated preview ids.
    ids: String,
}

async fn batch_previews(
    State(state): State<Arc<AppState>>,
    visitor: Visitor,
    Query(query): Query<BatchQuery>,
) -> Result<Json<Vec<PreviewView>>, ApiError> {
    let ids: Vec<i32> = query
        .ids
        .split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect();
    if ids.len() > MAX_BATCH_IDS {
        return Err((
            StatusCode::BAD_REQUEST,
            format!("at most {MAX_BATCH_IDS} ids per request"),
        ));
    }

    let mut cache = RequestCache::new();
    if !SongPreview::build_cache(&state.store, &mut cache, &ids).await {
        return Err((StatusCode::BAD_REQUEST, "no preview ids given".to_string()));
    }

    let mut views = Vec::with_capacity(ids.len());
    for id in ids {
        let preview = SongPreview::new(&state.store, &mut cache, id).await;
        if preview.is_valid() {
            views.push(view(&state, &mut cache, &visitor, preview).await);
        }
    }
    debug!("batch served from {} cache entries", cache.len());
    Ok(Json(views))
}

async fn get_preview(
    State(state): State<Arc<AppState>>,
    visitor: Visitor,
    Path(id): Path<i32>,
) -> Result<Json<PreviewView>, ApiError> {
    let mut cache = RequestCache::new();
    let preview = SongPreview::new(&state.store, &mut cache, id).await;
    if !preview.is_valid() {
        return Err((StatusCode::NOT_FOUND, format!("no preview {id}")));
    }
    Ok(Json(view(&state, &mut cache, &visitor, preview).await))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/previews", get(session_previews).post(create_preview))
        .route("/previews/batch", get(batch_previews))
        .route("/previews/:id", get(get_preview))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .on_request(|req: &Request<Body>, _span: &Span| {
                    debug!("{} {}", req.method(), req.uri());
                })
                .on_failure(
                    |error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                        error!("{error:?}");
                    },
                ),
        )
}

pub async fn serve(state: Arc<AppState>, addr: impl AsRef<str>) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr.as_ref()).await?;
    info!("Running on {}", listener.local_addr()?);

    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use axum::http::header::{CONTENT_TYPE, COOKIE};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::store::testing::*;

    async fn test_app() -> (Router, Arc<Store>) {
        let store = Arc::new(memory_store().await);
        let config = Config::parse(
            r#"
            [system]
            data_path = "/tmp/prevue"
            bind_addr = "localhost:3000"
            "#,
        )
        .unwrap();
        (router(AppState::new(store.clone(), &config)), store)
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn get_as(uri: &str, session: &str, user: Option<i32>) -> Request<Body> {
        let mut builder = Request::builder()
            .uri(uri)
            .header(COOKIE, format!("theme=dark; {SESSION_COOKIE}={session}"));
        if let Some(user) = user {
            builder = builder.header(USER_HEADER, user.to_string());
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_preview(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/previews")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn create_then_list_for_session() {
        let (app, store) = test_app().await;
        let artist = add_artist(&store, "Tortoise", Some("tt-1")).await;

        let (status, created) = send(
            &app,
            post_preview(json!({
                "file": "/previews/Djed.mp3",
                "album_mbid": "M1",
                "artist": artist,
                "title": "Djed",
                "disk": 1,
                "track": 1,
                "mbid": null,
                "session": "S1",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_i64().unwrap();

        let (status, list) = send(&app, get_as("/previews?album_mbid=M1", "S1", Some(5))).await;
        assert_eq!(status, StatusCode::OK);
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], json!(id));
        assert_eq!(list[0]["title"], "Djed");
        assert_eq!(list[0]["artist_name"], "Tortoise");
        assert_eq!(list[0]["artist_mbid"], "tt-1");
        assert_eq!(list[0]["type"], "mp3");
        assert_eq!(list[0]["stream_types"], json!(["native"]));
        assert_eq!(list[0]["display"]["file"], "Djed.mp3");
        let play_url = list[0]["play_url"].as_str().unwrap();
        assert!(play_url.starts_with("http://localhost:3000/play/index.php?type=song_preview&oid="));
        assert!(play_url.contains("&uid=5&"));

        let (status, other) = send(&app, get_as("/previews?album_mbid=M1", "S2", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(other, json!([]));
    }

    #[tokio::test]
    async fn session_comes_from_cookie_only() {
        let (app, store) = test_app().await;
        store
            .insert_preview(&new_preview("S1", "M1", 1, "Djed"))
            .await
            .unwrap();

        // a session named in the query string is ignored
        let (status, _) = send(&app, get("/previews?session=S1&album_mbid=M1")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(&app, get_as("/previews?album_mbid=M1", "", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, list) = send(&app, get_as("/previews?album_mbid=M1", "S1", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn play_url_carries_request_user() {
        let (app, store) = test_app().await;
        let id = store
            .insert_preview(&new_preview("S1", "M1", 1, "Glass Museum"))
            .await
            .unwrap();
        let uri = format!("/previews/{id}");

        let (_, anonymous) = send(&app, get(&uri)).await;
        assert!(anonymous["play_url"].as_str().unwrap().contains("&uid=-1&"));

        let (_, known) = send(&app, get_as(&uri, "S1", Some(42))).await;
        assert!(known["play_url"].as_str().unwrap().contains("&uid=42&"));
    }

    #[tokio::test]
    async fn single_preview_and_absence() {
        let (app, store) = test_app().await;
        let id = store
            .insert_preview(&new_preview("S1", "M1", 1, "Glass Museum"))
            .await
            .unwrap();

        let (status, body) = send(&app, get(&format!("/previews/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "Glass Museum");
        assert_eq!(body["artist_name"], Value::Null);

        let (status, _) = send(&app, get("/previews/999")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn batch_skips_absent_and_rejects_degenerate() {
        let (app, store) = test_app().await;
        let id = store
            .insert_preview(&new_preview("S1", "M1", 1, "Ten-Day Interval"))
            .await
            .unwrap();

        let (status, body) = send(&app, get(&format!("/previews/batch?ids={id},999,x"))).await;
        assert_eq!(status, StatusCode::OK);
        let body = body.as_array().unwrap();
        assert_eq!(body.len(), 1);
        assert_eq!(body[0]["title"], "Ten-Day Interval");
        // batch hydration does not resolve artist mbids
        assert_eq!(body[0]["artist_mbid"], Value::Null);

        let (status, _) = send(&app, get("/previews/batch?ids=0")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let too_many = (1..=MAX_BATCH_IDS as i32 + 1)
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let (status, _) = send(&app, get(&format!("/previews/batch?ids={too_many}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
