use crate::errors::DomainError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Todo の識別子（ストレージが採番する整数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(i64);

impl TodoId {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TodoId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<i64>()
            .map(Self)
            .map_err(|_| DomainError::InvalidTodoId(s.to_string()))
    }
}

/// Todo エンティティ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    /// 未入力時は空文字（NULL にはしない）
    pub description: String,
    pub due_date: Option<NaiveDate>,
    /// 完了フラグ（作成時は false、toggle でのみ反転。終端状態はない）
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl Todo {
    /// 未完了のまま期日を過ぎているか
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.resolved && self.due_date.is_some_and(|due| due < today)
    }
}

impl fmt::Display for Todo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)
    }
}
