//! handoff CLI
//!
//! Redis のリストから nature/process/product 形式のタスクを取り出して処理する
//! Worker と、その周辺の運用コマンド（push / status / recover）。

mod cli;
mod handlers;
mod logging;
mod settings;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run_cli().await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
