//! API layer - HTTP handlers and routing
//!
//! - `/api/admin/*`: session-protected management endpoints (login,
//!   logout and bootstrap are open)
//! - `/api/public/*`: catalog, comments, bookmarks and stat events
//! - `/go/*`, `/redirect/*`: outbound link tracking

pub mod ads;
pub mod analytics;
pub mod auth;
pub mod categories;
pub mod comments;
pub mod common;
pub mod content;
pub mod links;
pub mod middleware;
pub mod partners;
pub mod public;
pub mod redirect;
pub mod reports;
pub mod settings;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

pub use middleware::{ApiError, AppState};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// `/api/admin` routes
pub fn build_admin_router(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .merge(auth::protected_router())
        .merge(content::router())
        .merge(categories::router())
        .merge(ads::router())
        .merge(partners::router())
        .merge(links::router())
        .merge(reports::admin_router())
        .merge(comments::admin_router())
        .merge(settings::admin_router())
        .merge(analytics::admin_router())
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    auth::public_router().merge(protected)
}

/// `/api/public` routes
pub fn build_public_router() -> Router<AppState> {
    Router::new()
        .merge(public::router())
        .merge(settings::public_router())
        .merge(reports::public_router())
        .merge(analytics::public_router())
        .merge(comments::public_router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let origin = cors_origin.parse::<HeaderValue>().unwrap_or_else(|_| {
        tracing::warn!("Invalid CORS origin '{}', falling back to localhost", cors_origin);
        HeaderValue::from_static("http://localhost:3000")
    });
    // Credentials are allowed, so the origin must be explicit
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .allow_credentials(true);

    Router::new()
        .nest("/api/admin", build_admin_router(state.clone()))
        .nest("/api/public", build_public_router())
        .route("/api/health", get(health))
        .merge(redirect::router())
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ApiError> {
    state.pool.ping().await.map_err(ApiError::internal_error)?;
    Ok(Json(HealthResponse { status: "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::cache::create_cache;
    use crate::config::{CacheConfig, Config};
    use crate::db::repositories::test_support::{migrated_pool, new_content};
    use crate::db::repositories::{ContentRepository, LinkRepository, SqlxContentRepository, SqlxLinkRepository};
    use crate::db::DynDatabasePool;
    use crate::models::{Content, ContentLink, ContentType, LinkStatus, LinkType};

    const PASSWORD: &str = "correct horse battery";

    async fn setup() -> (DynDatabasePool, Router) {
        let pool = migrated_pool().await;
        let cache = create_cache(&CacheConfig::default()).await.unwrap();
        let state = AppState::new(pool.clone(), cache, &Config::default()).unwrap();
        (pool, build_router(state, "http://localhost:3000"))
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn admin_token(app: &Router) -> String {
        let response = send(
            app,
            json_request(
                "POST",
                "/api/admin/bootstrap",
                None,
                json!({"name": "Root", "email": "root@example.com", "password": PASSWORD}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = send(
            app,
            json_request(
                "POST",
                "/api/admin/login",
                None,
                json!({"email": "root@example.com", "password": PASSWORD}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        body_json(response).await["token"].as_str().unwrap().to_string()
    }

    async fn published(pool: &DynDatabasePool, title: &str, content_type: ContentType) -> Content {
        let slug = title.to_lowercase().replace(' ', "-");
        SqlxContentRepository::new(pool.clone())
            .create(&new_content(title, &slug, content_type))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_pool, app) = setup().await;
        let response = send(&app, get_request("/api/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_admin_routes_require_session() {
        let (_pool, app) = setup().await;
        let response = send(&app, get_request("/api/admin/categories", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["error"]["code"], "UNAUTHORIZED");

        let response = send(&app, get_request("/api/admin/me", Some("bogus"))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_rejects_bad_password() {
        let (_pool, app) = setup().await;
        let token = admin_token(&app).await;

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/admin/login",
                None,
                json!({"email": "ROOT@example.com", "password": PASSWORD}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(cookie.starts_with("admin_session="));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains(&format!("Max-Age={}", 7 * 24 * 60 * 60)));

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/admin/login",
                None,
                json!({"email": "root@example.com", "password": "wrong"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Invalid email or password"
        );

        // A second bootstrap is refused once an admin exists
        let response = send(
            &app,
            json_request(
                "POST",
                "/api/admin/bootstrap",
                None,
                json!({"name": "Again", "email": "again@example.com", "password": PASSWORD}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(&app, get_request("/api/admin/me", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["email"], "root@example.com");
    }

    #[tokio::test]
    async fn test_categories_create_then_list() {
        let (_pool, app) = setup().await;
        let token = admin_token(&app).await;

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/admin/categories",
                Some(&token),
                json!({"name": "Isekai", "typeScope": "ANIME"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["slug"], "isekai");

        let response = send(&app, get_request("/api/admin/categories", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let list = body_json(response).await;
        let names: Vec<&str> = list
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|c| c["name"].as_str())
            .collect();
        assert!(names.contains(&"Isekai"));

        // Anime listing includes it, manga listing does not
        let anime = body_json(send(&app, get_request("/api/public/categories?type=ANIME", None)).await).await;
        assert!(anime.as_array().unwrap().iter().any(|c| c["slug"] == "isekai"));
        let manga = body_json(send(&app, get_request("/api/public/categories?type=MANGA", None)).await).await;
        assert!(!manga.as_array().unwrap().iter().any(|c| c["slug"] == "isekai"));

        let response = send(&app, get_request("/api/public/categories?type=BOOK", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_public_content_filter_and_sort_by_views() {
        let (pool, app) = setup().await;
        let quiet = published(&pool, "Quiet Manga", ContentType::Manga).await;
        let popular = published(&pool, "Popular Manga", ContentType::Manga).await;
        published(&pool, "Some Movie", ContentType::Movie).await;

        let sqlite = pool.as_sqlite().unwrap();
        for (id, views) in [(quiet.id, 3), (popular.id, 40)] {
            sqlx::query("UPDATE contents SET views_total = ? WHERE id = ?")
                .bind(views)
                .bind(id)
                .execute(sqlite)
                .await
                .unwrap();
        }

        let response = send(&app, get_request("/api/public/content?type=MANGA&sort=views", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let page = body_json(response).await;
        assert_eq!(page["total"], 2);
        assert_eq!(page["pageSize"], 24);
        let slugs: Vec<&str> = page["items"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|i| i["slug"].as_str())
            .collect();
        assert_eq!(slugs, vec!["popular-manga", "quiet-manga"]);

        let page = body_json(
            send(&app, get_request("/api/public/content?type=MANGA&q=quiet&page=zero", None)).await,
        )
        .await;
        assert_eq!(page["total"], 1);
        assert_eq!(page["page"], 1);

        let response = send(&app, get_request("/api/public/content?type=comic", None)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"]["message"], "Invalid type");
    }

    #[tokio::test]
    async fn test_public_type_must_match_exactly() {
        let (_pool, app) = setup().await;

        for uri in [
            "/api/public/content?type=manga",
            "/api/public/content?type=Anime",
            "/api/public/content?type=%20MOVIE%20",
            "/api/public/categories?type=anime",
        ] {
            let response = send(&app, get_request(uri, None)).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(body_json(response).await["error"]["message"], "Invalid type");
        }

        let response = send(&app, get_request("/api/public/categories?type=MOVIE", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_redirect_flow() {
        let (pool, app) = setup().await;
        let mut item = new_content("Chainsaw Man", "chainsaw-man", ContentType::Manga);
        item.direct_redirect = true;
        let item = SqlxContentRepository::new(pool.clone()).create(&item).await.unwrap();
        let now = chrono::Utc::now();
        let link = SqlxLinkRepository::new(pool.clone())
            .create(&ContentLink {
                id: 0,
                content_id: item.id,
                url: "https://reader.example/csm".to_string(),
                source_name: "Reader".to_string(),
                link_type: LinkType::Read,
                status: LinkStatus::Verified,
                priority: 1,
                partner_id: None,
                click_count: 0,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let response = send(&app, get_request("/go/missing", None)).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let response = send(&app, get_request("/redirect/chainsaw-man", None)).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "https://reader.example/csm");

        let request = Request::builder()
            .uri(format!("/redirect/chainsaw-man/{}", link.id))
            .header(header::USER_AGENT, "router-test")
            .header("x-forwarded-for", "198.51.100.4, 10.0.0.1")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);

        let stored = SqlxLinkRepository::new(pool.clone())
            .get_by_id(link.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.click_count, 2);
        let logged_ip: String = sqlx::query_scalar("SELECT ip_address FROM link_clicks")
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap();
        assert_eq!(logged_ip, "198.51.100.4");

        let response = send(&app, get_request("/redirect/missing", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stat_events_feed_analytics() {
        let (pool, app) = setup().await;
        let token = admin_token(&app).await;
        let item = published(&pool, "Vinland Saga", ContentType::Anime).await;

        for event in ["view", "view", "view", "view", "click"] {
            let response = send(
                &app,
                json_request(
                    "POST",
                    "/api/public/stats",
                    None,
                    json!({"contentId": item.id, "event": event}),
                ),
            )
            .await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(body_json(response).await["ok"], true);
        }

        let response = send(
            &app,
            json_request(
                "POST",
                "/api/public/stats",
                None,
                json!({"contentId": item.id, "event": "share"}),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, get_request("/api/admin/analytics?days=30", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let overview = body_json(response).await;
        assert_eq!(overview["rangeDays"], 30);

        let daily = overview["daily"].as_array().unwrap();
        let views: i64 = daily.iter().filter_map(|d| d["views"].as_i64()).sum();
        let clicks: i64 = daily.iter().filter_map(|d| d["clicks"].as_i64()).sum();
        assert_eq!((views, clicks), (4, 1));

        let top = &overview["topContent"][0];
        assert_eq!(top["slug"], "vinland-saga");
        assert_eq!(top["ctr"], 0.25);
    }

    #[tokio::test]
    async fn test_bookmark_toggle_status_codes() {
        let (pool, app) = setup().await;
        let item = published(&pool, "Blue Period", ContentType::Manga).await;
        let body = json!({"userId": "visitor-1", "contentId": item.id});

        let response = send(&app, json_request("POST", "/api/public/bookmarks", None, body.clone())).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(body_json(response).await["bookmarked"], true);

        let list = body_json(send(&app, get_request("/api/public/bookmarks?userId=visitor-1", None)).await).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let response = send(&app, json_request("POST", "/api/public/bookmarks", None, body)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["bookmarked"], false);
    }
}
