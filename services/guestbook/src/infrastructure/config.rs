/// データベース接続設定
///
/// 環境変数`endpoint`と`database`から接続先を組み立てる。
/// 認証情報とリージョンはaws-configの既定プロバイダチェーンに委ねる。
use thiserror::Error;
use url::Url;

use super::guest_repository::{DynamoGuestRepository, GuestRepository};

/// エンドポイントURLを指定する環境変数
pub const ENDPOINT_ENV: &str = "endpoint";
/// データベースパスを指定する環境変数
pub const DATABASE_ENV: &str = "database";
/// テーブル名を上書きする環境変数（任意）
pub const GUESTS_TABLE_ENV: &str = "GUESTS_TABLE";
/// テーブル名の既定値
pub const DEFAULT_GUESTS_TABLE: &str = "guests";

/// 設定読み込みのエラー型
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidEndpoint(String),
}

/// ゲストブックのデータベース接続設定
///
/// リクエストごとに構築し、リポジトリへ渡す。プロセス全体で共有しない。
#[derive(Debug, Clone, PartialEq)]
pub struct GuestbookConfig {
    /// エンドポイントのベースURL（例: "https://docapi.serverless.yandexcloud.net"）
    endpoint: String,
    /// データベースパス（例: "/ru-central1/b1gxxxx/etnxxxx"）
    database: String,
    /// ゲストテーブル名
    guests_table: String,
}

impl GuestbookConfig {
    /// 明示的な値で設定を作成
    ///
    /// エンドポイントがURLとして解釈できない場合はエラー。
    pub fn new(
        endpoint: impl Into<String>,
        database: impl Into<String>,
        guests_table: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let endpoint = endpoint.into();
        Url::parse(&endpoint)
            .map_err(|e| ConfigError::InvalidEndpoint(format!("{endpoint}: {e}")))?;

        Ok(Self {
            endpoint,
            database: database.into(),
            guests_table: guests_table.into(),
        })
    }

    /// 環境変数から設定を読み込み
    ///
    /// # 環境変数
    /// - `endpoint`: エンドポイントのベースURL（必須）
    /// - `database`: データベースパス（必須）
    /// - `GUESTS_TABLE`: テーブル名（任意、既定は`guests`）
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = std::env::var(ENDPOINT_ENV)
            .map_err(|_| ConfigError::MissingEnvVar(ENDPOINT_ENV.to_string()))?;

        let database = std::env::var(DATABASE_ENV)
            .map_err(|_| ConfigError::MissingEnvVar(DATABASE_ENV.to_string()))?;

        let guests_table = std::env::var(GUESTS_TABLE_ENV)
            .ok()
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_GUESTS_TABLE.to_string());

        Self::new(endpoint, database, guests_table)
    }

    /// エンドポイントのベースURLを取得
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// データベースパスを取得
    pub fn database(&self) -> &str {
        &self.database
    }

    /// ゲストテーブル名を取得
    pub fn guests_table(&self) -> &str {
        &self.guests_table
    }

    /// SDKに渡すリクエストURLを構築
    ///
    /// ベースURLの末尾スラッシュとデータベースパスの先頭スラッシュを揃えて連結する。
    /// データベースパスが空の場合はベースURLをそのまま使う。
    pub fn endpoint_url(&self) -> String {
        let base = self.endpoint.trim_end_matches('/');
        let database = self.database.trim_matches('/');

        if database.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{database}")
        }
    }
}

/// リクエスト単位でリポジトリを用意する
///
/// 設定の解決はデータベースを使うルートでのみ行うため、
/// ハンドラーはリポジトリそのものではなくこのプロバイダを受け取る。
pub trait RepositoryProvider: Send + Sync {
    type Repository: GuestRepository;

    fn provide(&self) -> Result<Self::Repository, ConfigError>;
}

/// 環境変数から設定を解決し、DynamoDB互換リポジトリを作るプロバイダ
#[derive(Debug, Clone, Default)]
pub struct EnvRepositoryProvider;

impl RepositoryProvider for EnvRepositoryProvider {
    type Repository = DynamoGuestRepository;

    fn provide(&self) -> Result<Self::Repository, ConfigError> {
        let config = GuestbookConfig::from_env()?;
        Ok(DynamoGuestRepository::new(config))
    }
}
