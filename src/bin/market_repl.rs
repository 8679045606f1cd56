//! Market REPL
//!
//! Simulates one group chat over stdin against the in-memory profile store.
//! Type `<用户>: <消息>`, e.g. `alice: 牛牛集市`. Ctrl-D exits.
//!
//! Run with: cargo run --bin market_repl

use std::sync::Arc;

use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use niuniu_market::market::profile::mock::{MemoryProfileStore, StaticStatusOracle};
use niuniu_market::{
    ChatEvent, MarketConfig, MarketHandler, MarketRunner, RunnerConfig, UserProfile,
};

const GROUP: &str = "demo";

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let profiles = Arc::new(MemoryProfileStore::new());
    profiles.set_plugin_enabled(GROUP, true).await;
    profiles
        .seed_user(GROUP, "alice", UserProfile::new("小爱", 42.0, 3, 50))
        .await;
    profiles
        .seed_user(GROUP, "bob", UserProfile::new("阿波", 150.0, 5, 200))
        .await;
    let status = Arc::new(StaticStatusOracle::new());

    let config = MarketConfig::new().with_state_file("data/market_book.json");
    let handler = MarketHandler::new(config, profiles, status);

    let (event_tx, event_rx) = mpsc::channel(32);
    let (reply_tx, mut reply_rx) = mpsc::channel(32);
    tokio::spawn(MarketRunner::new(handler, event_rx, reply_tx, RunnerConfig::default()).run());

    tokio::spawn(async move {
        while let Some(reply) = reply_rx.recv().await {
            println!("[bot -> {}] {}", reply.user_id, reply.text);
        }
    });

    println!("已注册用户：alice（42cm, 50金币）、bob（1.50m, 200金币）");
    println!("输入 <用户>: <消息>，例如 alice: 牛牛集市");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Some((user, text)) = line.split_once(':') else {
            println!("格式：<用户>: <消息>");
            continue;
        };
        let user = user.trim().to_string();
        let event = ChatEvent::new(GROUP, user.clone(), user, text.trim());
        if event_tx.send(event).await.is_err() {
            break;
        }
    }

    info!("stdin closed, exiting");
}
