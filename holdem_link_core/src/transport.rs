use crate::error::TransportError;
use crate::message::ClientMessage;
use std::future::Future;

/// 外部传输协作者：负责分帧和套接字，核心只消费它交付的一帧原始字节。
/// 内容是否是合法的 UTF-8 JSON 由 `Session::handle_frame` 判断，属于协议错误而不是传输错误。
/// 错误只被转发，核心不会重试或重连。
pub trait Transport {
    fn send(&mut self, message: &ClientMessage) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// 等待下一条服务器消息。连接关闭时返回 `TransportError::Closed`
    fn recv(&mut self) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}
