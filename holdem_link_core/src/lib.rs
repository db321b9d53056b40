//! # 德州扑克客户端核心库
//!
//! 这个 `core` crate 负责客户端一侧的协议与状态同步：
//! 把服务器推送的消息解码为类型化事件，维护唯一的本地快照，
//! 并把玩家的操作编码为出站请求。
//! 它不做任何网络 I/O，也不渲染任何东西，传输与界面都是外部协作者。

mod card;
mod command;
mod error;
mod message;
mod session;
mod state;
mod transport;

pub use card::*;

pub use command::*;

pub use error::*;

pub use message::*;

pub use session::*;

pub use state::*;

pub use transport::*;
