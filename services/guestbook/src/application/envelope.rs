/// 呼び出しイベントとレスポンスエンベロープ
///
/// プラットフォームから渡されるイベントのうち`url`、`body`、`isBase64Encoded`
/// のみを扱う。レスポンスは`statusCode`、`headers`、`isBase64Encoded`、`body`
/// の4フィールドを持つJSONオブジェクトとして返す。
use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// リクエストボディのデコードエラー
#[derive(Debug, Error)]
pub enum DecodeError {
    /// base64として不正
    #[error("Invalid base64 body: {0}")]
    Base64(#[from] base64::DecodeError),

    /// base64デコード結果がUTF-8として不正
    #[error("Body is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// JSONとして不正
    #[error("Invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// プラットフォームからの呼び出しイベント
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvocationEvent {
    /// リクエストパス（末尾に`?`が付くことがある）
    #[serde(default)]
    pub url: Option<String>,

    /// リクエストボディ
    #[serde(default)]
    pub body: Option<String>,

    /// ボディがbase64エンコードされているか
    #[serde(rename = "isBase64Encoded", default)]
    pub is_base64_encoded: Option<bool>,
}

impl InvocationEvent {
    /// 空でないボディを取得
    pub fn non_empty_body(&self) -> Option<&str> {
        self.body.as_deref().filter(|b| !b.is_empty())
    }

    /// base64フラグ（未指定はfalse）
    pub fn is_base64_encoded(&self) -> bool {
        self.is_base64_encoded.unwrap_or(false)
    }
}

/// プラットフォームへ返すレスポンスエンベロープ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: HashMap<String, String>,
    pub is_base64_encoded: bool,
    pub body: String,
}

impl ResponseEnvelope {
    /// ヘッダーなし、非base64のレスポンスを作成
    pub fn new(status_code: u16, body: impl Into<String>) -> Self {
        Self {
            status_code,
            headers: HashMap::new(),
            is_base64_encoded: false,
            body: body.into(),
        }
    }

    /// 200 OK（JSONボディ）
    pub fn ok_json(value: &Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// 200 OK（空ボディ）
    pub fn ok_empty() -> Self {
        Self::new(200, "")
    }

    /// 400 Bad Request
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    /// 404 Not Found
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }

    /// 503 Service Unavailable
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(503, message)
    }
}

/// リクエストボディをJSONとして解釈する
///
/// `is_base64_encoded`が真の場合は先にbase64デコードしてUTF-8文字列に戻す。
pub fn decode_body(body: &str, is_base64_encoded: bool) -> Result<Value, DecodeError> {
    if is_base64_encoded {
        let bytes = BASE64.decode(body)?;
        let text = String::from_utf8(bytes)?;
        return Ok(serde_json::from_str(&text)?);
    }

    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_plain_json() {
        let value = decode_body(r#"{"name":"Alice","message":"Hi"}"#, false).unwrap();

        assert_eq!(value, json!({"name": "Alice", "message": "Hi"}));
    }

    #[test]
    fn test_decode_base64_json() {
        let encoded = BASE64.encode(r#"{"name":"Alice","message":"Hi"}"#);

        let value = decode_body(&encoded, true).unwrap();

        assert_eq!(value, json!({"name": "Alice", "message": "Hi"}));
    }

    #[test]
    fn test_decode_base64_multibyte_text() {
        let encoded = BASE64.encode(r#"{"name":"アリス","message":"こんにちは"}"#);

        let value = decode_body(&encoded, true).unwrap();

        assert_eq!(value["name"], "アリス");
        assert_eq!(value["message"], "こんにちは");
    }

    #[test]
    fn test_decode_invalid_base64() {
        let result = decode_body("***not base64***", true);

        assert!(matches!(result, Err(DecodeError::Base64(_))));
    }

    #[test]
    fn test_decode_base64_of_invalid_utf8() {
        let encoded = BASE64.encode([0xff, 0xfe, 0xfd]);

        let result = decode_body(&encoded, true);

        assert!(matches!(result, Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn test_decode_invalid_json() {
        let result = decode_body("{not json", false);

        assert!(matches!(result, Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_decode_flag_off_does_not_base64_decode() {
        // base64文字列をフラグなしで渡すとJSONとして解釈される
        let encoded = BASE64.encode(r#"{"a":1}"#);

        let result = decode_body(&encoded, false);

        assert!(matches!(result, Err(DecodeError::Json(_))));
    }

    #[test]
    fn test_invocation_event_deserialize_full() {
        let event: InvocationEvent = serde_json::from_value(json!({
            "httpMethod": "POST",
            "url": "/register?",
            "body": "e30=",
            "isBase64Encoded": true,
            "headers": {"Content-Type": "application/json"}
        }))
        .unwrap();

        assert_eq!(event.url.as_deref(), Some("/register?"));
        assert_eq!(event.non_empty_body(), Some("e30="));
        assert!(event.is_base64_encoded());
    }

    #[test]
    fn test_invocation_event_deserialize_empty() {
        let event: InvocationEvent = serde_json::from_value(json!({})).unwrap();

        assert!(event.url.is_none());
        assert!(event.non_empty_body().is_none());
        assert!(!event.is_base64_encoded());
    }

    #[test]
    fn test_invocation_event_empty_body_is_absent() {
        let event: InvocationEvent =
            serde_json::from_value(json!({"url": "/register", "body": ""})).unwrap();

        assert!(event.non_empty_body().is_none());
    }

    #[test]
    fn test_invocation_event_null_flag_is_false() {
        let event: InvocationEvent =
            serde_json::from_value(json!({"isBase64Encoded": null})).unwrap();

        assert!(!event.is_base64_encoded());
    }

    #[test]
    fn test_response_envelope_serialization_keys() {
        let envelope = ResponseEnvelope::not_found("No such path");

        let value = serde_json::to_value(&envelope).unwrap();

        assert_eq!(
            value,
            json!({
                "statusCode": 404,
                "headers": {},
                "isBase64Encoded": false,
                "body": "No such path"
            })
        );
    }

    #[test]
    fn test_response_envelope_constructors() {
        assert_eq!(ResponseEnvelope::ok_empty().status_code, 200);
        assert_eq!(ResponseEnvelope::ok_empty().body, "");
        assert_eq!(ResponseEnvelope::bad_request("x").status_code, 400);
        assert_eq!(ResponseEnvelope::service_unavailable("x").status_code, 503);

        let ok = ResponseEnvelope::ok_json(&json!({"version": "1.1.4"}));
        assert_eq!(ok.status_code, 200);
        assert_eq!(ok.body, r#"{"version":"1.1.4"}"#);
        assert!(ok.headers.is_empty());
        assert!(!ok.is_base64_encoded);
    }
}
