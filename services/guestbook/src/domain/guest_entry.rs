/// ゲストブックの1件の書き込み
///
/// 名前とメッセージの組。一意性や順序の制約はこの層では持たない。
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// 登録リクエストからのGuestEntry構築エラー
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GuestEntryError {
    /// 必須フィールドが存在しない、または文字列ではない
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// ボディがJSONオブジェクトではない
    #[error("Payload is not a JSON object")]
    NotAnObject,
}

/// ゲストブックのエントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestEntry {
    /// 投稿者名（テーブルのパーティションキー）
    pub name: String,
    /// メッセージ本文
    pub message: String,
}

impl GuestEntry {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }

    /// デコード済みの登録ペイロードからエントリを取り出す
    ///
    /// `name`と`message`の存在と型のみを検査する。空文字列は受け入れる。
    pub fn from_payload(payload: &Value) -> Result<Self, GuestEntryError> {
        let object = payload.as_object().ok_or(GuestEntryError::NotAnObject)?;

        let name = object
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or(GuestEntryError::MissingField("name"))?;

        let message = object
            .get("message")
            .and_then(|v| v.as_str())
            .ok_or(GuestEntryError::MissingField("message"))?;

        Ok(Self::new(name, message))
    }
}
