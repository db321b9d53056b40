use clap::Parser;
use std::time::Duration;

/// 德州扑克终端客户端
#[derive(Parser, Debug, Clone)]
#[command(version)]
pub struct Config {
    /// 服务器地址
    #[arg(long, env = "HOLDEM_HOST", default_value = "127.0.0.1", value_parser = non_empty)]
    pub host: String,

    /// 服务器端口
    #[arg(short, long, env = "HOLDEM_PORT", default_value_t = 8080,
        value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// 显示名称
    #[arg(short, long, env = "HOLDEM_NAME", value_parser = non_empty)]
    pub name: String,

    /// 心跳间隔（秒）
    #[arg(long, env = "HOLDEM_HEARTBEAT_SECS", default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..))]
    pub heartbeat_secs: u64,
}

impl Config {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }
}

fn non_empty(s: &str) -> Result<String, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        Err("不能为空".to_string())
    } else {
        Ok(trimmed.to_string())
    }
}
