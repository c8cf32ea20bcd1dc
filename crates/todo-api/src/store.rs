//! SQLite による Todo の永続化
//!
//! スキーマは `migrations/` に置き、接続時に適用します。

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use thiserror::Error;
use todo_domain::{Todo, TodoDraft, TodoId};

static MIGRATOR: Migrator = sqlx::migrate!();

/// ストア層のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Todo not found: {0}")]
    NotFound(TodoId),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] MigrateError),
}

#[derive(Debug, FromRow)]
struct TodoRow {
    id: i64,
    title: String,
    description: String,
    due_date: Option<NaiveDate>,
    resolved: bool,
    created_at: DateTime<Utc>,
}

impl From<TodoRow> for Todo {
    fn from(row: TodoRow) -> Self {
        Todo {
            id: TodoId::new(row.id),
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            resolved: row.resolved,
            created_at: row.created_at,
        }
    }
}

/// todos テーブルへのアクセス
#[derive(Clone)]
pub struct TodoRepository {
    pool: SqlitePool,
}

impl TodoRepository {
    /// データベースへ接続し、マイグレーションを適用します。
    ///
    /// インメモリ DB は接続ごとに別の DB になるため、接続を 1 本に固定して使い回します。
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let in_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options.connect_with(options).await?;
        MIGRATOR.run(&pool).await?;
        tracing::info!(in_memory, "database ready");

        Ok(Self { pool })
    }

    pub async fn create(&self, draft: &TodoDraft) -> Result<Todo, StoreError> {
        let row = sqlx::query_as::<_, TodoRow>(
            "INSERT INTO todos (title, description, due_date, resolved, created_at) \
             VALUES (?, ?, ?, 0, ?) \
             RETURNING id, title, description, due_date, resolved, created_at",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.due_date)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        let todo = Todo::from(row);
        tracing::info!(todo_id = %todo.id, "todo created");
        Ok(todo)
    }

    /// 全件を作成日時の新しい順で返します（同時刻は id の大きい方が先）。
    pub async fn list(&self) -> Result<Vec<Todo>, StoreError> {
        let rows = sqlx::query_as::<_, TodoRow>(
            "SELECT id, title, description, due_date, resolved, created_at \
             FROM todos ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Todo::from).collect())
    }

    pub async fn get(&self, id: TodoId) -> Result<Todo, StoreError> {
        sqlx::query_as::<_, TodoRow>(
            "SELECT id, title, description, due_date, resolved, created_at \
             FROM todos WHERE id = ?",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(Todo::from)
        .ok_or(StoreError::NotFound(id))
    }

    pub async fn exists(&self, id: TodoId) -> Result<bool, StoreError> {
        let found = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM todos WHERE id = ?)")
            .bind(id.get())
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }

    /// タイトル・説明・期日を上書きします。resolved と created_at は変更しません。
    pub async fn update(&self, id: TodoId, draft: &TodoDraft) -> Result<Todo, StoreError> {
        let todo = sqlx::query_as::<_, TodoRow>(
            "UPDATE todos SET title = ?, description = ?, due_date = ? WHERE id = ? \
             RETURNING id, title, description, due_date, resolved, created_at",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(draft.due_date)
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(Todo::from)
        .ok_or(StoreError::NotFound(id))?;

        tracing::info!(todo_id = %id, "todo updated");
        Ok(todo)
    }

    pub async fn delete(&self, id: TodoId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM todos WHERE id = ?")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }

        tracing::info!(todo_id = %id, "todo deleted");
        Ok(())
    }

    /// resolved を反転します。反転と読み出しは 1 文（UPDATE ... RETURNING）で行います。
    pub async fn toggle(&self, id: TodoId) -> Result<Todo, StoreError> {
        let todo: Todo = sqlx::query_as::<_, TodoRow>(
            "UPDATE todos SET resolved = NOT resolved WHERE id = ? \
             RETURNING id, title, description, due_date, resolved, created_at",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?
        .map(Todo::from)
        .ok_or(StoreError::NotFound(id))?;

        tracing::info!(todo_id = %id, resolved = todo.resolved, "todo toggled");
        Ok(todo)
    }
}
