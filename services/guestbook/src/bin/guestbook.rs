/// ゲストブック関数エントリポイント
///
/// プラットフォームからの呼び出しイベントを受け取り、
/// `/register`、`/guests`、`/backend-version`の各ルートを処理する。
use guestbook::application::{GuestbookHandler, InvocationEvent, ResponseEnvelope};
use guestbook::infrastructure::{init_logging, EnvRepositoryProvider};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // 構造化ログを初期化
    init_logging();

    info!(version = guestbook::application::BACKEND_VERSION, "ゲストブック関数を初期化");

    let func = service_fn(handler);
    lambda_runtime::run(func).await?;
    Ok(())
}

/// 関数のメインハンドラー
///
/// # 処理フロー
/// 1. アクセスログを出力
/// 2. 設定はデータベースを使うルートでのみ環境変数から解決
/// 3. 正常系と400/404/503はエンベロープとして返却
/// 4. それ以外のエラーは呼び出しの失敗としてランタイムへ返す
async fn handler(event: LambdaEvent<InvocationEvent>) -> Result<ResponseEnvelope, Error> {
    let (payload, context) = event.into_parts();
    let request_id = context.request_id;

    info!(
        request_id = %request_id,
        url = payload.url.as_deref().unwrap_or("(none)"),
        is_base64_encoded = payload.is_base64_encoded(),
        body_length = payload.body.as_deref().map_or(0, str::len),
        "リクエスト受信"
    );

    let guestbook_handler = GuestbookHandler::new(EnvRepositoryProvider);

    match guestbook_handler.handle(&payload).await {
        Ok(response) => {
            info!(
                request_id = %request_id,
                status_code = response.status_code,
                "リクエスト処理完了"
            );
            Ok(response)
        }
        Err(err) => {
            error!(
                request_id = %request_id,
                error = %err,
                "リクエスト処理エラー"
            );
            Err(err.into())
        }
    }
}
