use crate::error::{SessionError, StateError, TransportError};
use crate::message::ClientMessage;
use crate::session::Session;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// 界面层调用的出站动作。
///
/// 每个动作都只是把玩家的选择翻译成一条请求并放进发送队列，
/// 真正的发送由外部的传输任务完成。
#[derive(Clone)]
pub struct Commands {
    session: Arc<Session>,
    outbox: mpsc::UnboundedSender<ClientMessage>,
}

impl Commands {
    pub fn new(session: Arc<Session>, outbox: mpsc::UnboundedSender<ClientMessage>) -> Self {
        Commands { session, outbox }
    }

    pub fn set_display_name(&self, name: impl Into<String>) -> Result<ClientMessage, SessionError> {
        self.send(ClientMessage::SetDisplayName { player_name: name.into() })
    }

    /// 准备开始游戏
    pub fn ready(&self) -> Result<ClientMessage, SessionError> {
        self.send(ClientMessage::IsReady)
    }

    pub fn fold(&self) -> Result<ClientMessage, SessionError> {
        self.send(ClientMessage::fold())
    }

    pub fn check(&self) -> Result<ClientMessage, SessionError> {
        self.send(ClientMessage::pass())
    }

    /// 下注到 `amount`（总额）。金额为 0 视为玩家取消，不发送任何请求
    pub fn bet(&self, amount: u32) -> Result<Option<ClientMessage>, SessionError> {
        if amount == 0 {
            debug!("下注金额为 0，视为取消");
            return Ok(None);
        }
        self.send(ClientMessage::raise_to(amount)).map(Some)
    }

    /// 加注和下注在协议上没有区别
    pub fn raise(&self, amount: u32) -> Result<Option<ClientMessage>, SessionError> {
        self.bet(amount)
    }

    /// 跟注到当前最高下注额。每次调用都重新读取最新快照
    pub fn call(&self) -> Result<ClientMessage, SessionError> {
        let snapshot = self.session.snapshot().ok_or(StateError::NoSnapshot("call"))?;
        self.send(ClientMessage::raise_to(snapshot.highest_bet()))
    }

    pub fn heartbeat(&self) -> Result<ClientMessage, SessionError> {
        self.send(ClientMessage::Heartbeat)
    }

    /// 通知服务器本地玩家要离开
    pub fn leave(&self) -> Result<ClientMessage, SessionError> {
        self.send(ClientMessage::ConnectionEnded)
    }

    fn send(&self, message: ClientMessage) -> Result<ClientMessage, SessionError> {
        debug!("发送请求: {:?}", message);
        self.outbox
            .send(message.clone())
            .map_err(|_| TransportError::Closed)?;
        Ok(message)
    }
}
