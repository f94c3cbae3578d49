use anyhow::Result;
use tracing::{error, info};

use stock_signal_bot::app_config::env::env_is_true;
use stock_signal_bot::trading::task;
use stock_signal_bot::trading::task::init_job;

#[tokio::main]
async fn main() -> Result<()> {
    stock_signal_bot::app_init().await?;

    // 启动时初始化（建表+历史回填），默认关闭
    if env_is_true("IS_INIT_ON_START", false) {
        if let Err(e) = init_job::seed_historical_series().await {
            error!("init on start failed: {}", e);
        }
    }

    // 注册并启动5分钟一跳的调度
    if let Err(e) = task::register_jobs().await {
        error!("failed to start scheduler: {}", e);
        return Err(e);
    }

    // 等退出信号
    let signal_name = wait_shutdown_signal().await;
    info!("received {}, shutting down", signal_name);
    Ok(())
}

async fn wait_shutdown_signal() -> &'static str {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to register SIGTERM handler");
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .expect("Failed to register SIGINT handler");
        tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        }
    }

    #[cfg(not(unix))]
    {
        signal::ctrl_c().await.expect("Failed to listen for ctrl-c");
        "CTRL+C"
    }
}
