//! ドメインモデル
//!
//! Todo エンティティ、識別子、フォーム入力の検証を扱います。
//! 永続化や HTTP には依存しません。

pub mod errors;
pub mod form;
pub mod todo;

pub use errors::*;
pub use form::*;
pub use todo::*;
