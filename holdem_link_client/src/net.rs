use bytes::{Buf, BufMut, BytesMut};
use futures_util::{SinkExt, StreamExt};
use holdem_link_core::{ClientMessage, Commands, Session, Transport, TransportError};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::{Decoder, Encoder, Framed};
use tracing::{debug, info};

/// 单帧上限，超过这个长度的前缀视为对端出错
const MAX_FRAME_LEN: usize = 1 << 20;
// usize::MAX 的十进制也不超过 20 位
const MAX_PREFIX_LEN: usize = 20;

/// 服务器的分帧格式：`<字节长度>:<json 文本>`
#[derive(Debug, Default)]
pub struct WireCodec;

impl Decoder for WireCodec {
    type Item = Vec<u8>;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Vec<u8>>, TransportError> {
        let Some(colon) = src.iter().position(|b| *b == b':') else {
            if src.len() > MAX_PREFIX_LEN {
                return Err(TransportError::Framing("length prefix has no terminator".to_string()));
            }
            return Ok(None);
        };

        let len = std::str::from_utf8(&src[..colon])
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .ok_or_else(|| TransportError::Framing("length prefix is not a number".to_string()))?;
        if len > MAX_FRAME_LEN {
            return Err(TransportError::Framing(format!("frame of {len} bytes is too large")));
        }

        let total = colon + 1 + len;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(colon + 1);
        // 内容原样交出，非 UTF-8 由会话当作协议错误报告
        Ok(Some(src.split_to(len).to_vec()))
    }
}

impl Encoder<String> for WireCodec {
    type Error = TransportError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), TransportError> {
        let prefix = item.len().to_string();
        dst.reserve(prefix.len() + 1 + item.len());
        dst.put_slice(prefix.as_bytes());
        dst.put_u8(b':');
        dst.put_slice(item.as_bytes());
        Ok(())
    }
}

/// 基于 TCP 的传输实现
pub struct TcpTransport {
    framed: Framed<TcpStream, WireCodec>,
}

impl Transport for TcpTransport {
    async fn send(&mut self, message: &ClientMessage) -> Result<(), TransportError> {
        self.framed.send(message.to_wire_string()).await
    }

    async fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        self.framed.next().await.unwrap_or(Err(TransportError::Closed))
    }
}

/// 连接服务器并排队发送显示名称。名称会在 `run` 开始后第一个发出
pub async fn connect(
    host: &str,
    port: u16,
    name: &str,
    commands: &Commands,
) -> Result<TcpTransport, anyhow::Error> {
    info!("正在连接到: {}:{}", host, port);
    let stream = TcpStream::connect((host, port)).await.map_err(TransportError::from)?;
    info!("连接成功!");
    commands.set_display_name(name)?;
    Ok(TcpTransport { framed: Framed::new(stream, WireCodec) })
}

/// 接收循环：按到达顺序把服务器消息交给会话，同时把出站队列里的请求发出去。
/// 发出 `connection_ended` 或出站队列关闭后正常返回。
pub async fn run<T: Transport>(
    transport: &mut T,
    session: &Session,
    mut outbox: mpsc::UnboundedReceiver<ClientMessage>,
) -> Result<(), TransportError> {
    loop {
        tokio::select! {
            frame = transport.recv() => {
                let frame = frame?;
                debug!("<-- {}", String::from_utf8_lossy(&frame));
                // 错误已经通过通知报告给界面层，这里继续接收
                let _ = session.handle_frame(&frame);
            }
            message = outbox.recv() => {
                let Some(message) = message else { return Ok(()) };
                transport.send(&message).await?;
                if message == ClientMessage::ConnectionEnded {
                    info!("已通知服务器断开连接");
                    return Ok(());
                }
            }
        }
    }
}
