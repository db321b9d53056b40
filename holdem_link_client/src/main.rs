use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use holdem_link_core::{Commands, Session, TransportError};

mod config;
mod console;
mod net;

use config::Config;
use console::ConsolePresenter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    let (session, mut events) = Session::new();
    let session = Arc::new(session);
    let (outbox_tx, outbox_rx) = mpsc::unbounded_channel();
    let commands = Commands::new(Arc::clone(&session), outbox_tx);

    let mut transport = net::connect(&config.host, config.port, &config.name, &commands).await?;

    // 界面任务：依次处理会话发出的通知
    tokio::spawn(async move {
        let mut presenter = ConsolePresenter::default();
        while let Some(event) = events.recv().await {
            event.deliver(&mut presenter);
        }
    });

    tokio::spawn(heartbeat(commands.clone(), config.heartbeat_interval()));
    tokio::spawn(console::read_input(commands));

    match net::run(&mut transport, &session, outbox_rx).await {
        Ok(()) => info!("客户端退出"),
        // 游戏结束后服务器会直接关闭连接
        Err(TransportError::Closed) if session.is_ended() => info!("服务器已关闭连接"),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// 定时发送心跳，直到出站队列关闭
async fn heartbeat(commands: Commands, every: Duration) {
    let mut ticker = tokio::time::interval(every);
    // 第一次 tick 立即完成，跳过
    ticker.tick().await;
    loop {
        ticker.tick().await;
        if commands.heartbeat().is_err() {
            debug!("出站队列已关闭，停止心跳");
            return;
        }
    }
}
