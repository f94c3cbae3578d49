//! 运维CLI: initialize / reset-stop / trigger / test-notify / health
//!
//! 例: `admin reset-stop` 清掉紧急停止后恢复通知

use anyhow::{anyhow, Result};
use chrono::Utc;

use stock_signal_bot::app_config::{db, redis as redis_config};
use stock_signal_bot::trading::gate::{GateStateStore, RedisGateStore};
use stock_signal_bot::trading::task;
use stock_signal_bot::trading::task::init_job;
use stock_signal_bot::trading::transport::push::{MessageTransport, PushClient};

#[tokio::main]
async fn main() -> Result<()> {
    stock_signal_bot::app_init().await?;

    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        // 建表 + 历史日足回填
        "initialize" => {
            init_job::seed_historical_series().await?;
            println!("initialize done");
        }
        // 紧急停止解除
        "reset-stop" => {
            RedisGateStore.set_emergency_stop(false).await?;
            println!("emergency stop cleared");
        }
        // 立即跑一轮（按当前壁钟路由）
        "trigger" => {
            task::route_scheduled_tick(Utc::now()).await?;
            println!("tick done");
        }
        // 字面量测试推送
        "test-notify" => {
            let text = args
                .get(2)
                .cloned()
                .unwrap_or_else(|| "テスト通知 (stock-signal-bot)".to_string());
            PushClient::from_env()?.send_push(&text).await?;
            println!("test message sent");
        }
        // 存活确认: MySQL + Redis
        "health" => {
            let _: i64 = db::get_db_client().query_decode("select 1", vec![]).await?;
            let mut conn = redis_config::get_redis_connection().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            let stopped = RedisGateStore.is_emergency_stop().await?;
            println!("db=ok redis=ok emergency_stop={}", stopped);
        }
        _ => {
            println!("usage: admin <initialize|reset-stop|trigger|test-notify [text]|health>");
            if command != "help" {
                return Err(anyhow!("unknown command: {}", command));
            }
        }
    }
    Ok(())
}
