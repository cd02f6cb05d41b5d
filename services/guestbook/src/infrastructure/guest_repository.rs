/// ゲストテーブルへのクエリ実行
///
/// 呼び出しごとにセッション（クライアント）を開き、接続可能になるまで
/// 最大5秒待ってから1つの操作を実行する。セッションはどの経路で抜けても
/// スコープ終了時に解放される。タイムアウトや競合時の再試行は行わない。
use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::retry::RetryConfig;
use aws_sdk_dynamodb::error::{DisplayErrorContext, SdkError};
use aws_sdk_dynamodb::types::{AttributeValue, Put, TransactWriteItem};
use aws_sdk_dynamodb::Client as DynamoDbClient;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::GuestbookConfig;
use crate::domain::GuestEntry;

/// 接続待ちの上限
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// リージョンが設定されていない場合に使うリージョン
const DEFAULT_REGION: &str = "ru-central1";

/// リポジトリ操作のエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    /// 接続確認がサービスエラーで失敗（テーブルが存在しない等）
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// 書き込みトランザクションに失敗
    #[error("Write error: {0}")]
    WriteError(String),

    /// 読み取りに失敗
    #[error("Read error: {0}")]
    ReadError(String),

    /// 行データの変換に失敗
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// クエリの実行結果
///
/// 「行なし」と「実行されなかった」を区別する。`Unavailable`を受け取った
/// 呼び出し元は、操作が行われなかったものとして扱うこと。
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// 1行以上の結果
    Rows(Vec<GuestEntry>),
    /// 実行済みで結果行なし（書き込み成功を含む）
    Empty,
    /// 接続が制限時間内に確立できず、実行されなかった
    Unavailable,
}

impl QueryOutcome {
    /// 結果行から作成（空なら`Empty`）
    pub fn from_rows(rows: Vec<GuestEntry>) -> Self {
        if rows.is_empty() {
            QueryOutcome::Empty
        } else {
            QueryOutcome::Rows(rows)
        }
    }

    /// 実行された場合は結果行（`Empty`は空ベクター）、されなかった場合は`None`
    pub fn into_rows(self) -> Option<Vec<GuestEntry>> {
        match self {
            QueryOutcome::Rows(rows) => Some(rows),
            QueryOutcome::Empty => Some(Vec::new()),
            QueryOutcome::Unavailable => None,
        }
    }

    /// 接続できず実行されなかったか
    pub fn is_unavailable(&self) -> bool {
        matches!(self, QueryOutcome::Unavailable)
    }
}

/// ゲストテーブル操作用トレイト
///
/// 実際のDynamoDB互換APIとテスト用モックを差し替えられるようにする。
#[async_trait]
pub trait GuestRepository: Send + Sync {
    /// エントリを挿入または上書きする
    ///
    /// 成功時は`Empty`、接続できなかった場合は`Unavailable`を返す。
    async fn upsert(&self, entry: &GuestEntry) -> Result<QueryOutcome, RepositoryError>;

    /// テーブルの全エントリを取得する
    async fn list_all(&self) -> Result<QueryOutcome, RepositoryError>;
}

/// 呼び出し1回分のデータベースセッション
///
/// ドロップ時に解放ログを出す。クライアントはここで破棄される。
struct Session {
    client: DynamoDbClient,
    table: String,
}

impl Session {
    fn client(&self) -> &DynamoDbClient {
        &self.client
    }

    fn table(&self) -> &str {
        &self.table
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(table = %self.table, "データベースセッション解放");
    }
}

/// GuestRepositoryのDynamoDB互換API実装
#[derive(Debug, Clone)]
pub struct DynamoGuestRepository {
    config: GuestbookConfig,
}

impl DynamoGuestRepository {
    pub fn new(config: GuestbookConfig) -> Self {
        Self { config }
    }

    /// 接続設定への参照を取得
    pub fn config(&self) -> &GuestbookConfig {
        &self.config
    }

    /// セッションを開く
    ///
    /// 認証情報とリージョンは環境から読み込む。読み込みも接続待ちの制限時間に含める。SDKの自動再試行は無効化する。
    async fn open_session(&self) -> Session {
        let region = RegionProviderChain::default_provider().or_else(DEFAULT_REGION);
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;

        let client = DynamoDbClient::from_conf(
            aws_sdk_dynamodb::config::Builder::from(&aws_config)
                .endpoint_url(self.config.endpoint_url())
                .retry_config(RetryConfig::disabled())
                .build(),
        );

        debug!(
            endpoint = %self.config.endpoint_url(),
            table = self.config.guests_table(),
            "データベースセッション開始"
        );

        Session {
            client,
            table: self.config.guests_table().to_string(),
        }
    }

    /// セッションを開き、接続可能になるまで待つ
    ///
    /// 設定の読み込みからテーブル情報の取得までを`CONNECT_TIMEOUT`以内に
    /// 終えられなければ`None`。通信レベルの失敗も接続不能として扱い、
    /// 診断情報をログに残す。
    async fn connect(&self) -> Result<Option<Session>, RepositoryError> {
        let attempt = async {
            let session = self.open_session().await;
            let ready = session
                .client()
                .describe_table()
                .table_name(session.table())
                .send()
                .await;
            (session, ready)
        };

        match tokio::time::timeout(CONNECT_TIMEOUT, attempt).await {
            Ok((session, Ok(_))) => Ok(Some(session)),
            Ok((_, Err(err @ (SdkError::DispatchFailure(_) | SdkError::TimeoutError(_))))) => {
                self.log_unavailable(&DisplayErrorContext(&err).to_string());
                Ok(None)
            }
            Ok((_, Err(err))) => Err(RepositoryError::ConnectionFailed(
                DisplayErrorContext(&err).to_string(),
            )),
            Err(_) => {
                self.log_unavailable("接続確認がタイムアウトしました");
                Ok(None)
            }
        }
    }

    fn log_unavailable(&self, last_error: &str) {
        warn!(
            endpoint = self.config.endpoint(),
            database = self.config.database(),
            table = self.config.guests_table(),
            timeout_secs = CONNECT_TIMEOUT.as_secs(),
            last_error = last_error,
            "データベースに接続できませんでした"
        );
    }

    /// 属性値をテキストとして取り出す
    ///
    /// 文字列型はそのまま、バイナリ型はUTF-8としてデコードする。
    fn decode_text(
        item: &HashMap<String, AttributeValue>,
        field: &str,
    ) -> Result<String, RepositoryError> {
        match item.get(field) {
            Some(AttributeValue::S(text)) => Ok(text.clone()),
            Some(AttributeValue::B(blob)) => {
                String::from_utf8(blob.as_ref().to_vec()).map_err(|e| {
                    RepositoryError::SerializationError(format!(
                        "Invalid UTF-8 in {field} field: {e}"
                    ))
                })
            }
            Some(_) => Err(RepositoryError::SerializationError(format!(
                "Unsupported type for {field} field"
            ))),
            None => Err(RepositoryError::SerializationError(format!(
                "Missing {field} field"
            ))),
        }
    }

    /// テーブルの1行をGuestEntryに変換
    fn entry_from_item(
        item: &HashMap<String, AttributeValue>,
    ) -> Result<GuestEntry, RepositoryError> {
        let name = Self::decode_text(item, "name")?;
        let message = Self::decode_text(item, "message")?;
        Ok(GuestEntry { name, message })
    }

    /// GuestEntryをテーブルの1行に変換
    fn item_from_entry(entry: &GuestEntry) -> HashMap<String, AttributeValue> {
        HashMap::from([
            ("name".to_string(), AttributeValue::S(entry.name.clone())),
            ("message".to_string(), AttributeValue::S(entry.message.clone())),
        ])
    }
}

#[async_trait]
impl GuestRepository for DynamoGuestRepository {
    async fn upsert(&self, entry: &GuestEntry) -> Result<QueryOutcome, RepositoryError> {
        let Some(session) = self.connect().await? else {
            return Ok(QueryOutcome::Unavailable);
        };

        // Putは同一キーの既存行を上書きする
        let put = Put::builder()
            .table_name(session.table())
            .set_item(Some(Self::item_from_entry(entry)))
            .build()
            .map_err(|e| RepositoryError::WriteError(e.to_string()))?;

        session
            .client()
            .transact_write_items()
            .transact_items(TransactWriteItem::builder().put(put).build())
            .send()
            .await
            .map_err(|e| RepositoryError::WriteError(DisplayErrorContext(&e).to_string()))?;

        info!(table = session.table(), "ゲスト登録完了");

        Ok(QueryOutcome::Empty)
    }

    async fn list_all(&self) -> Result<QueryOutcome, RepositoryError> {
        let Some(session) = self.connect().await? else {
            return Ok(QueryOutcome::Unavailable);
        };

        let mut entries = Vec::new();
        let mut exclusive_start_key: Option<HashMap<String, AttributeValue>> = None;

        loop {
            let response = session
                .client()
                .scan()
                .table_name(session.table())
                .consistent_read(true)
                .set_exclusive_start_key(exclusive_start_key.take())
                .send()
                .await
                .map_err(|e| RepositoryError::ReadError(DisplayErrorContext(&e).to_string()))?;

            if let Some(items) = response.items {
                for item in &items {
                    entries.push(Self::entry_from_item(item)?);
                }
            }

            match response.last_evaluated_key {
                Some(key) if !key.is_empty() => exclusive_start_key = Some(key),
                _ => break,
            }
        }

        info!(
            table = session.table(),
            count = entries.len(),
            "ゲスト一覧取得完了"
        );

        Ok(QueryOutcome::from_rows(entries))
    }
}
