/// ゲストブックのルートハンドラー
///
/// リクエストパスを登録・一覧・バージョンの3つの操作に振り分け、
/// レスポンスエンベロープを組み立てる。状態は持たない。
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::envelope::{decode_body, DecodeError, InvocationEvent, ResponseEnvelope};
use crate::domain::{GuestEntry, GuestEntryError, Route};
use crate::infrastructure::{ConfigError, GuestRepository, RepositoryError, RepositoryProvider};

/// `/backend-version`で返すバージョン文字列
pub const BACKEND_VERSION: &str = env!("CARGO_PKG_VERSION");

/// 登録ボディが空の場合のレスポンス本文
pub const EMPTY_BODY_MESSAGE: &str = "No name or message";
/// 未知のパスに対するレスポンス本文
pub const NO_SUCH_PATH_MESSAGE: &str = "No such path";
/// パス未指定に対するレスポンス本文
pub const NOT_FOUND_MESSAGE: &str = "Not found";
/// データベースに接続できなかった場合のレスポンス本文
pub const UNAVAILABLE_MESSAGE: &str = "Database unavailable";

/// レスポンスに変換せず、呼び出しの失敗として扱うエラー
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Invalid guest entry: {0}")]
    InvalidEntry(#[from] GuestEntryError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// ルートハンドラー
///
/// データベースを使うルートでのみプロバイダからリポジトリを取得する。
pub struct GuestbookHandler<P>
where
    P: RepositoryProvider,
{
    provider: P,
}

impl<P> GuestbookHandler<P>
where
    P: RepositoryProvider,
{
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// 呼び出しイベントを処理してレスポンスを返す
    ///
    /// 400/404/503と正常系はレスポンスとして返す。設定・デコード・
    /// 入力欠落・データベースエラーは`Err`として呼び出し元へ伝播する。
    pub async fn handle(&self, event: &InvocationEvent) -> Result<ResponseEnvelope, HandlerError> {
        let route = Route::resolve(event.url.as_deref());
        debug!(
            route = route.as_str(),
            touches_database = route.touches_database(),
            "ルート解決"
        );

        match route {
            Route::Register => self.register(event).await,
            Route::Guests => self.list_guests().await,
            Route::BackendVersion => Ok(Self::backend_version()),
            Route::UnknownPath(path) => {
                info!(path = %path, "未知のパス");
                Ok(ResponseEnvelope::not_found(NO_SUCH_PATH_MESSAGE))
            }
            Route::MissingPath => Ok(ResponseEnvelope::not_found(NOT_FOUND_MESSAGE)),
        }
    }

    /// `/register`: ボディの`name`と`message`を登録する
    async fn register(&self, event: &InvocationEvent) -> Result<ResponseEnvelope, HandlerError> {
        let Some(body) = event.non_empty_body() else {
            return Ok(ResponseEnvelope::bad_request(EMPTY_BODY_MESSAGE));
        };

        let payload = decode_body(body, event.is_base64_encoded())?;
        let entry = GuestEntry::from_payload(&payload)?;

        let repo = self.provider.provide()?;
        if repo.upsert(&entry).await?.is_unavailable() {
            warn!(name = %entry.name, "データベース接続不可のため登録されませんでした");
            return Ok(ResponseEnvelope::service_unavailable(UNAVAILABLE_MESSAGE));
        }

        Ok(ResponseEnvelope::ok_empty())
    }

    /// `/guests`: 全エントリを返す
    ///
    /// 0件は空配列、接続不可は503。
    async fn list_guests(&self) -> Result<ResponseEnvelope, HandlerError> {
        let repo = self.provider.provide()?;

        let Some(guests) = repo.list_all().await?.into_rows() else {
            warn!("データベース接続不可のため一覧を取得できませんでした");
            return Ok(ResponseEnvelope::service_unavailable(UNAVAILABLE_MESSAGE));
        };

        Ok(ResponseEnvelope::ok_json(&json!({ "guests": guests })))
    }

    /// `/backend-version`: データベースにはアクセスしない
    fn backend_version() -> ResponseEnvelope {
        ResponseEnvelope::ok_json(&json!({ "version": BACKEND_VERSION }))
    }
}
