//! HTML テンプレート（handlebars）
//!
//! テンプレートはバイナリに埋め込み、起動時に一度だけ登録します。

use chrono::NaiveDate;
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;
use todo_domain::{FormErrors, Todo, TodoForm, DATE_FORMAT};

pub const TODO_LIST: &str = "todos/todo_list";
pub const TODO_FORM: &str = "todos/todo_form";
pub const TODO_CONFIRM_DELETE: &str = "todos/todo_confirm_delete";

/// 登録済みテンプレート一式
pub struct Templates {
    registry: Handlebars<'static>,
}

impl Templates {
    pub fn new() -> Result<Self, TemplateError> {
        let mut registry = Handlebars::new();

        registry.register_partial("header", include_str!("../templates/header.hbs"))?;
        registry.register_partial("footer", include_str!("../templates/footer.hbs"))?;

        registry.register_template_string(TODO_LIST, include_str!("../templates/todos/todo_list.hbs"))?;
        registry.register_template_string(TODO_FORM, include_str!("../templates/todos/todo_form.hbs"))?;
        registry.register_template_string(
            TODO_CONFIRM_DELETE,
            include_str!("../templates/todos/todo_confirm_delete.hbs"),
        )?;

        Ok(Self { registry })
    }

    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String, RenderError> {
        self.registry.render(name, context)
    }
}

/// 一覧・削除確認で使う Todo の表示用データ
#[derive(Debug, Serialize)]
pub struct TodoView {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub due_date: Option<String>,
    pub resolved: bool,
    pub overdue: bool,
    pub created_at: String,
}

impl TodoView {
    pub fn new(todo: &Todo, today: NaiveDate) -> Self {
        Self {
            id: todo.id.get(),
            title: todo.title.clone(),
            description: todo.description.clone(),
            due_date: todo.due_date.map(|d| d.format(DATE_FORMAT).to_string()),
            resolved: todo.resolved,
            overdue: todo.is_overdue(today),
            created_at: todo.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListPage {
    pub page_title: &'static str,
    pub todos: Vec<TodoView>,
}

#[derive(Debug, Serialize)]
pub struct FormPage<'a> {
    pub page_title: &'static str,
    pub heading: &'static str,
    pub submit_label: &'static str,
    pub action: String,
    pub form: &'a TodoForm,
    pub errors: &'a FormErrors,
}

#[derive(Debug, Serialize)]
pub struct ConfirmDeletePage {
    pub page_title: &'static str,
    pub todo: TodoView,
}
