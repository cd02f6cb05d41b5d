// リクエストパスのルーティング
//
// パスは完全一致で判定する。末尾の`?`は1文字だけ取り除くが、
// それ以外のクエリ文字列は解析しない（`/guests?page=1`は未知のパス扱い）。

/// 登録ルートのパス
pub const REGISTER_PATH: &str = "/register";
/// 一覧ルートのパス
pub const GUESTS_PATH: &str = "/guests";
/// バージョンルートのパス
pub const BACKEND_VERSION_PATH: &str = "/backend-version";

/// 解決済みのルート
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// ゲストの登録
    Register,
    /// ゲスト一覧の取得
    Guests,
    /// バックエンドバージョンの取得
    BackendVersion,
    /// 未知のパス（正規化後のパスを保持）
    UnknownPath(String),
    /// パスが指定されていない、または空
    MissingPath,
}

impl Route {
    /// イベントの`url`からルートを解決する
    pub fn resolve(url: Option<&str>) -> Self {
        let Some(url) = url.filter(|u| !u.is_empty()) else {
            return Route::MissingPath;
        };

        match Self::normalize(url) {
            REGISTER_PATH => Route::Register,
            GUESTS_PATH => Route::Guests,
            BACKEND_VERSION_PATH => Route::BackendVersion,
            other => Route::UnknownPath(other.to_string()),
        }
    }

    /// 末尾の`?`を1文字だけ取り除く
    pub fn normalize(url: &str) -> &str {
        url.strip_suffix('?').unwrap_or(url)
    }

    /// データベースへのアクセスを伴うルートかどうか
    pub fn touches_database(&self) -> bool {
        matches!(self, Route::Register | Route::Guests)
    }

    /// ログ出力用のルート名
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Register => "register",
            Route::Guests => "guests",
            Route::BackendVersion => "backend_version",
            Route::UnknownPath(_) => "unknown",
            Route::MissingPath => "missing",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_paths() {
        assert_eq!(Route::resolve(Some("/register")), Route::Register);
        assert_eq!(Route::resolve(Some("/guests")), Route::Guests);
        assert_eq!(Route::resolve(Some("/backend-version")), Route::BackendVersion);
    }

    #[test]
    fn test_resolve_strips_single_trailing_question_mark() {
        assert_eq!(Route::resolve(Some("/register?")), Route::Register);
        assert_eq!(Route::resolve(Some("/guests?")), Route::Guests);
        assert_eq!(Route::resolve(Some("/backend-version?")), Route::BackendVersion);
    }

    #[test]
    fn test_resolve_strips_only_one_question_mark() {
        assert_eq!(
            Route::resolve(Some("/guests??")),
            Route::UnknownPath("/guests?".to_string())
        );
    }

    #[test]
    fn test_resolve_does_not_parse_query_string() {
        assert_eq!(
            Route::resolve(Some("/guests?page=1")),
            Route::UnknownPath("/guests?page=1".to_string())
        );
    }

    #[test]
    fn test_resolve_unknown_path() {
        assert_eq!(
            Route::resolve(Some("/foo")),
            Route::UnknownPath("/foo".to_string())
        );
        // 大文字小文字は区別する
        assert_eq!(
            Route::resolve(Some("/Guests")),
            Route::UnknownPath("/Guests".to_string())
        );
        assert_eq!(
            Route::resolve(Some("/guests/")),
            Route::UnknownPath("/guests/".to_string())
        );
    }

    #[test]
    fn test_resolve_missing_path() {
        assert_eq!(Route::resolve(None), Route::MissingPath);
        assert_eq!(Route::resolve(Some("")), Route::MissingPath);
    }

    #[test]
    fn test_resolve_lone_question_mark_is_unknown() {
        // 正規化後は空文字列になるが、パス自体は指定されている
        assert_eq!(
            Route::resolve(Some("?")),
            Route::UnknownPath(String::new())
        );
    }

    #[test]
    fn test_touches_database() {
        assert!(Route::Register.touches_database());
        assert!(Route::Guests.touches_database());
        assert!(!Route::BackendVersion.touches_database());
        assert!(!Route::UnknownPath("/foo".to_string()).touches_database());
        assert!(!Route::MissingPath.touches_database());
    }

    #[test]
    fn test_as_str() {
        assert_eq!(Route::Register.as_str(), "register");
        assert_eq!(Route::Guests.as_str(), "guests");
        assert_eq!(Route::BackendVersion.as_str(), "backend_version");
        assert_eq!(Route::UnknownPath("/x".to_string()).as_str(), "unknown");
        assert_eq!(Route::MissingPath.as_str(), "missing");
    }
}
