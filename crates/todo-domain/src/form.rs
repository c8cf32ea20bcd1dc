//! Todo 作成・編集フォームの入力と検証

use crate::todo::Todo;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// タイトルの最大文字数
pub const TITLE_MAX_CHARS: usize = 200;

/// 日付入力の書式（ISO-8601）
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// フォームから送信された生の値
///
/// 送信されなかった項目は空文字として扱います。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TodoForm {
    pub title: String,
    pub description: String,
    pub due_date: String,
}

/// 検証済みの入力（ストレージへ書き込める状態）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub description: String,
    pub due_date: Option<NaiveDate>,
}

impl TodoDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due_date: None,
        }
    }
}

/// 項目ごとのエラーメッセージ（フォーム再表示用）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.due_date.is_none()
    }
}

impl TodoForm {
    /// 既存の Todo で編集フォームを埋めます。
    pub fn from_todo(todo: &Todo) -> Self {
        Self {
            title: todo.title.clone(),
            description: todo.description.clone(),
            due_date: todo
                .due_date
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<TodoDraft, FormErrors> {
        let mut errors = FormErrors::default();

        let title = self.title.trim();
        let title_len = title.chars().count();
        if title.is_empty() {
            errors.title = Some("This field is required.".to_string());
        } else if title_len > TITLE_MAX_CHARS {
            errors.title = Some(format!(
                "Ensure this value has at most {TITLE_MAX_CHARS} characters (it has {title_len})."
            ));
        }

        let due_date = match self.due_date.trim() {
            "" => None,
            raw => match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
                Ok(date) => Some(date),
                Err(_) => {
                    errors.due_date = Some("Enter a valid date.".to_string());
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(TodoDraft {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            due_date,
        })
    }
}
