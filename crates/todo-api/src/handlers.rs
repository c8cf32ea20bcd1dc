//! リクエストハンドラ
//!
//! 各ハンドラはストア操作 1 回に対応し、ページを描画するか一覧へリダイレクトします。

use axum::{
    extract::{rejection::FormRejection, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use chrono::Local;
use serde::Serialize;
use todo_domain::{FormErrors, TodoForm, TodoId};

use crate::error::ApiError;
use crate::templates::{
    ConfirmDeletePage, FormPage, ListPage, TodoView, TODO_CONFIRM_DELETE, TODO_FORM, TODO_LIST,
};
use crate::AppState;

/// 一覧ページのパス（リダイレクト先）
pub const LIST_PATH: &str = "/todos/";

/// フォームの用途
#[derive(Debug, Clone, Copy)]
enum FormMode {
    Create,
    Edit(TodoId),
}

impl FormMode {
    fn action(self) -> String {
        match self {
            FormMode::Create => "/todos/new".to_string(),
            FormMode::Edit(id) => format!("/todos/{id}/edit"),
        }
    }

    fn heading(self) -> &'static str {
        match self {
            FormMode::Create => "New TODO",
            FormMode::Edit(_) => "Edit TODO",
        }
    }

    fn submit_label(self) -> &'static str {
        match self {
            FormMode::Create => "Create",
            FormMode::Edit(_) => "Save",
        }
    }
}

fn redirect_to_list() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, LIST_PATH)]).into_response()
}

/// パス中の id が整数でなければ存在しない id と同じ扱い
fn parse_id(raw: &str) -> Result<TodoId, ApiError> {
    raw.parse().map_err(|_| ApiError::NotFound)
}

fn render_form(
    state: &AppState,
    mode: FormMode,
    form: &TodoForm,
    errors: &FormErrors,
) -> Result<Html<String>, ApiError> {
    let page = FormPage {
        page_title: mode.heading(),
        heading: mode.heading(),
        submit_label: mode.submit_label(),
        action: mode.action(),
        form,
        errors,
    };
    Ok(Html(state.templates.render(TODO_FORM, &page)?))
}

/// GET / は一覧へ
pub async fn index() -> Response {
    redirect_to_list()
}

#[derive(Debug, Serialize)]
pub struct HealthBody {
    status: &'static str,
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthBody { status: "ok" }))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}

/// GET /todos/
pub async fn list_todos(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let today = Local::now().date_naive();
    let todos = state.repo.list().await?;

    let page = ListPage {
        page_title: "TODOs",
        todos: todos.iter().map(|todo| TodoView::new(todo, today)).collect(),
    };
    Ok(Html(state.templates.render(TODO_LIST, &page)?))
}

/// GET /todos/new
pub async fn new_todo_form(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    render_form(&state, FormMode::Create, &TodoForm::default(), &FormErrors::default())
}

/// POST /todos/new
pub async fn create_todo(
    State(state): State<AppState>,
    Form(form): Form<TodoForm>,
) -> Result<Response, ApiError> {
    match form.validate() {
        Ok(draft) => {
            state.repo.create(&draft).await?;
            Ok(redirect_to_list())
        }
        Err(errors) => {
            tracing::debug!(?errors, "create form rejected");
            Ok(render_form(&state, FormMode::Create, &form, &errors)?.into_response())
        }
    }
}

/// GET /todos/{id}/edit
pub async fn edit_todo_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let id = parse_id(&id)?;
    let todo = state.repo.get(id).await?;
    render_form(
        &state,
        FormMode::Edit(id),
        &TodoForm::from_todo(&todo),
        &FormErrors::default(),
    )
}

/// POST /todos/{id}/edit
///
/// 存在しない id は本文の形式に関わらず 404 を返します。
pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    form: Result<Form<TodoForm>, FormRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            if !state.repo.exists(id).await? {
                return Err(ApiError::NotFound);
            }
            return Ok(rejection.into_response());
        }
    };

    match form.validate() {
        Ok(draft) => {
            state.repo.update(id, &draft).await?;
            Ok(redirect_to_list())
        }
        Err(errors) => {
            if !state.repo.exists(id).await? {
                return Err(ApiError::NotFound);
            }
            tracing::debug!(todo_id = %id, ?errors, "edit form rejected");
            Ok(render_form(&state, FormMode::Edit(id), &form, &errors)?.into_response())
        }
    }
}

/// GET/POST /todos/{id}/toggle
pub async fn toggle_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    state.repo.toggle(id).await?;
    Ok(redirect_to_list())
}

/// GET /todos/{id}/delete
pub async fn confirm_delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ApiError> {
    let id = parse_id(&id)?;
    let todo = state.repo.get(id).await?;

    let page = ConfirmDeletePage {
        page_title: "Delete TODO",
        todo: TodoView::new(&todo, Local::now().date_naive()),
    };
    Ok(Html(state.templates.render(TODO_CONFIRM_DELETE, &page)?))
}

/// POST /todos/{id}/delete
pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    state.repo.delete(id).await?;
    Ok(redirect_to_list())
}
