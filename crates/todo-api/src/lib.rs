//! Todo 管理 Web アプリ（axum）
//!
//! 一覧・作成・編集・完了切替・削除の 5 操作を HTML ページとして提供します。

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::Response,
    routing::get,
    Router,
};
use std::{sync::Arc, time::Instant};

pub mod error;
pub mod handlers;
pub mod store;
pub mod templates;

use store::TodoRepository;
use templates::Templates;

/// アプリケーションの共有状態
#[derive(Clone)]
pub struct AppState {
    repo: TodoRepository,
    templates: Arc<Templates>,
}

impl AppState {
    pub fn new(repo: TodoRepository, templates: Templates) -> Self {
        Self {
            repo,
            templates: Arc::new(templates),
        }
    }

    pub fn repo(&self) -> &TodoRepository {
        &self.repo
    }
}

/// ルータを構築して返します。
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/todos", get(handlers::index))
        .route("/todos/", get(handlers::list_todos))
        .route(
            "/todos/new",
            get(handlers::new_todo_form).post(handlers::create_todo),
        )
        .route(
            "/todos/:id/edit",
            get(handlers::edit_todo_form).post(handlers::update_todo),
        )
        .route(
            "/todos/:id/toggle",
            get(handlers::toggle_todo).post(handlers::toggle_todo),
        )
        .route(
            "/todos/:id/delete",
            get(handlers::confirm_delete).post(handlers::delete_todo),
        )
        .fallback(handlers::not_found)
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}

async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        %method,
        %path,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{self, Body},
        http::{header, Request, StatusCode},
    };
    use todo_domain::{TodoDraft, TodoId};
    use tower::ServiceExt; // for `oneshot`

    async fn test_state() -> AppState {
        let repo = TodoRepository::connect("sqlite::memory:").await.unwrap();
        AppState::new(repo, Templates::new().unwrap())
    }

    /// テスト用 Todo を 1 件作成した状態
    async fn state_with_todo() -> (AppState, TodoId) {
        let state = test_state().await;
        let todo = state
            .repo()
            .create(&TodoDraft {
                title: "Test TODO".into(),
                description: "Test description".into(),
                due_date: Some(chrono::Local::now().date_naive()),
            })
            .await
            .unwrap();
        (state, todo.id)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn post_form(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    /// Content-Type を付けない POST
    fn post_raw(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn assert_redirects_to_list(response: &Response) {
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/todos/");
    }

    #[tokio::test]
    async fn get_health_returns_ok() {
        let app = app(test_state().await);

        let response = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn root_redirects_to_list() {
        let app = app(test_state().await);
        let response = app.oneshot(get("/")).await.unwrap();
        assert_redirects_to_list(&response);
    }

    #[tokio::test]
    async fn list_shows_existing_todo() {
        let (state, _) = state_with_todo().await;
        let response = app(state).oneshot(get("/todos/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Test TODO"));
        assert!(!html.contains("No TODOs yet!"));
    }

    #[tokio::test]
    async fn empty_list_shows_placeholder() {
        let response = app(test_state().await).oneshot(get("/todos/")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("No TODOs yet!"));
    }

    #[tokio::test]
    async fn create_form_is_rendered() {
        let response = app(test_state().await).oneshot(get("/todos/new")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains(r#"name="title""#));
        assert!(html.contains(r#"action="/todos/new""#));
    }

    #[tokio::test]
    async fn post_create_persists_and_redirects() {
        let state = test_state().await;
        let app = app(state.clone());

        let response = app
            .clone()
            .oneshot(post_form(
                "/todos/new",
                "title=New+TODO&description=New+description&due_date=2025-12-31",
            ))
            .await
            .unwrap();
        assert_redirects_to_list(&response);

        let todos = state.repo().list().await.unwrap();
        assert_eq!(todos.len(), 1);
        assert_eq!(todos[0].title, "New TODO");
        assert_eq!(todos[0].description, "New description");
        assert_eq!(todos[0].due_date, chrono::NaiveDate::from_ymd_opt(2025, 12, 31));
        assert!(!todos[0].resolved);

        let response = app.oneshot(get("/todos/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("New TODO"));
    }

    #[tokio::test]
    async fn post_create_without_optional_fields() {
        let state = test_state().await;
        let response = app(state.clone())
            .oneshot(post_form("/todos/new", "title=Minimal+TODO"))
            .await
            .unwrap();
        assert_redirects_to_list(&response);

        let todos = state.repo().list().await.unwrap();
        assert_eq!(todos[0].title, "Minimal TODO");
        assert_eq!(todos[0].description, "");
        assert_eq!(todos[0].due_date, None);
    }

    #[tokio::test]
    async fn post_create_with_blank_title_rerenders_form() {
        let state = test_state().await;
        let response = app(state.clone())
            .oneshot(post_form("/todos/new", "title=&description=keep+me"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("This field is required."));
        assert!(html.contains("keep me"));
        assert!(state.repo().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_form_is_prefilled() {
        let (state, id) = state_with_todo().await;
        let response = app(state)
            .oneshot(get(&format!("/todos/{id}/edit")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Test TODO"));
        assert!(html.contains("Test description"));
        assert!(html.contains(&format!(r#"action="/todos/{id}/edit""#)));
    }

    #[tokio::test]
    async fn post_edit_updates_in_place() {
        let (state, id) = state_with_todo().await;
        let response = app(state.clone())
            .oneshot(post_form(
                &format!("/todos/{id}/edit"),
                "title=Updated+TODO&description=Updated+description&due_date=2025-12-25",
            ))
            .await
            .unwrap();
        assert_redirects_to_list(&response);

        let todo = state.repo().get(id).await.unwrap();
        assert_eq!(todo.title, "Updated TODO");
        assert_eq!(todo.description, "Updated description");
        assert_eq!(todo.due_date, chrono::NaiveDate::from_ymd_opt(2025, 12, 25));
    }

    #[tokio::test]
    async fn post_edit_with_invalid_date_rerenders_form() {
        let (state, id) = state_with_todo().await;
        let response = app(state.clone())
            .oneshot(post_form(&format!("/todos/{id}/edit"), "title=Still+here&due_date=tomorrow"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Enter a valid date."));
        assert_eq!(state.repo().get(id).await.unwrap().title, "Test TODO");
    }

    #[tokio::test]
    async fn delete_confirmation_shows_title() {
        let (state, id) = state_with_todo().await;
        let response = app(state)
            .oneshot(get(&format!("/todos/{id}/delete")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Test TODO"));
    }

    #[tokio::test]
    async fn post_delete_removes_todo() {
        let (state, id) = state_with_todo().await;
        let response = app(state.clone())
            .oneshot(post_form(&format!("/todos/{id}/delete"), ""))
            .await
            .unwrap();

        assert_redirects_to_list(&response);
        assert!(!state.repo().exists(id).await.unwrap());
    }

    #[tokio::test]
    async fn toggle_flips_resolved_each_time() {
        let (state, id) = state_with_todo().await;
        let app = app(state.clone());
        assert!(!state.repo().get(id).await.unwrap().resolved);

        let response = app
            .clone()
            .oneshot(get(&format!("/todos/{id}/toggle")))
            .await
            .unwrap();
        assert_redirects_to_list(&response);
        assert!(state.repo().get(id).await.unwrap().resolved);

        let response = app
            .oneshot(post_form(&format!("/todos/{id}/toggle"), ""))
            .await
            .unwrap();
        assert_redirects_to_list(&response);
        assert!(!state.repo().get(id).await.unwrap().resolved);
    }

    #[tokio::test]
    async fn unknown_id_returns_404_everywhere() {
        let app = app(test_state().await);
        let requests = [
            get("/todos/9999/edit"),
            post_form("/todos/9999/edit", "title=Ghost"),
            post_form("/todos/9999/edit", "title="),
            get("/todos/9999/delete"),
            post_form("/todos/9999/delete", ""),
            get("/todos/9999/toggle"),
            post_form("/todos/9999/toggle", ""),
            post_raw("/todos/9999/edit", ""),
            get("/todos/not-a-number/edit"),
            get("/no/such/page"),
        ];

        for request in requests {
            let uri = request.uri().clone();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn edit_without_form_content_type_is_rejected_for_existing_todo() {
        let (state, id) = state_with_todo().await;
        let app = app(state.clone());

        let response = app
            .oneshot(post_raw(&format!("/todos/{id}/edit"), "title=Changed"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert_eq!(state.repo().get(id).await.unwrap().title, "Test TODO");
    }
}
