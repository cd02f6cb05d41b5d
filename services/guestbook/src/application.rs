// アプリケーション層モジュール
pub mod envelope;
pub mod guestbook_handler;

// 再エクスポート
pub use envelope::{decode_body, DecodeError, InvocationEvent, ResponseEnvelope};
pub use guestbook_handler::{GuestbookHandler, HandlerError, BACKEND_VERSION};
