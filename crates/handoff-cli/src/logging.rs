//! tracing-subscriber の初期化
//!
//! レベルは `RUST_LOG` が優先、無ければ `HANDOFF_LOG_LEVEL`。
//! `HANDOFF_LOG_FORMAT=json` で 1 行 1 JSON の出力になる。

use tracing_subscriber::EnvFilter;

pub fn init(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);
    if format.eq_ignore_ascii_case("json") {
        builder.json().init();
    } else {
        builder.init();
    }
}
