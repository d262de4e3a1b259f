//! # 署名アップロード エンドポイント
//!
//! ## 処理フロー
//! 1. メソッド判定（OPTIONS → 空の200、POST以外 → 405）
//! 2. jobUUID / signature の検証
//! 3. Data URIのデコードとサイズ確認（1 MiB上限）
//! 4. ServiceM8に添付メタデータを登録
//! 5. 返された添付UUIDに対して画像バイナリをアップロード
//!
//! 検証エラーは外部呼び出しの前に返す。4が失敗した場合5は実行しない。
//! 5が失敗しても4で作成したレコードは削除しない。

mod handler;


pub use handler::handle_signature_upload;
