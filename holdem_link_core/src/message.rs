use crate::card::Card;
use crate::error::ProtocolError;
use crate::state::{GameState, Player, Seat, NO_WINNER};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- 客户端 -> 服务器 的消息 ---
// 这些是客户端可以发送给服务器的指令或动作。
// 每个变体对应唯一的 "type" 字符串，由 serde 的穷尽匹配负责编码。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// 连接后设置自己的显示名称
    SetDisplayName { player_name: String },
    /// 准备好开始游戏
    IsReady,
    /// 轮到自己时的回应
    Response(PlayerChoice),
    /// 保活
    Heartbeat,
    /// 主动断开连接
    ConnectionEnded,
}

/// 玩家在下注轮中的选择，编码在 `"type": "response"` 消息的 `"action"` 字段里
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerChoice {
    Fold,
    /// 过牌
    Pass,
    /// 下注后的总额（不是增量）
    RaiseTo { amount: u32 },
}

impl ClientMessage {
    pub fn fold() -> Self {
        ClientMessage::Response(PlayerChoice::Fold)
    }

    pub fn pass() -> Self {
        ClientMessage::Response(PlayerChoice::Pass)
    }

    pub fn raise_to(amount: u32) -> Self {
        ClientMessage::Response(PlayerChoice::RaiseTo { amount })
    }

    /// 线上的 JSON 对象
    pub fn to_wire(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(value) => value,
            // 所有变体都只含字符串和整数，序列化不会失败
            Err(e) => unreachable!("client message {self:?} failed to serialize: {e}"),
        }
    }

    pub fn to_wire_string(&self) -> String {
        self.to_wire().to_string()
    }
}

// --- 服务器 -> 客户端 的消息 ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// 轮到本地玩家行动，没有负载
    AwaitingPlayer,
    /// 完整的游戏状态快照
    GameState(GameState),
    /// 游戏结束，`None` 表示没有赢家
    GameEnd { winner: Option<Seat> },
}

impl ServerMessage {
    /// 服务器消息在线上的 "type" 标签
    pub fn type_tag(&self) -> &'static str {
        match self {
            ServerMessage::AwaitingPlayer => "awaiting_player",
            ServerMessage::GameState(_) => "game_state",
            ServerMessage::GameEnd { .. } => "game_end",
        }
    }

    /// 从一帧文本解析
    pub fn decode_str(text: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        Self::decode(value)
    }

    /// 同 `decode_str`，输入是一帧原始字节。字符串里的非法 UTF-8 也算格式错误
    pub fn decode_slice(frame: &[u8]) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_slice(frame).map_err(|e| ProtocolError::Malformed(e.to_string()))?;
        Self::decode(value)
    }

    /// 校验并解析一个线上对象。任何缺失或错误的字段都会被报告，不使用默认值。
    pub fn decode(value: Value) -> Result<Self, ProtocolError> {
        let Value::Object(mut obj) = value else {
            return Err(ProtocolError::MissingType);
        };
        let tag = match obj.remove("type") {
            Some(Value::String(tag)) => tag,
            _ => return Err(ProtocolError::MissingType),
        };

        match tag.as_str() {
            "awaiting_player" => Ok(ServerMessage::AwaitingPlayer),
            "game_state" => decode_game_state(obj).map(ServerMessage::GameState),
            "game_end" => decode_game_end(obj),
            _ => Err(ProtocolError::UnknownType(tag)),
        }
    }
}

/// `winner` 必须存在；存在且为 null 表示没有赢家，键缺失则是协议错误
fn decode_game_end(mut obj: Map<String, Value>) -> Result<ServerMessage, ProtocolError> {
    let winner: Option<i64> = required(&mut obj, "winner")?;
    let winner = match winner {
        None | Some(NO_WINNER) => None,
        Some(seat) => Some(
            Seat::try_from(seat).map_err(|_| ProtocolError::invalid("winner", "negative seat"))?,
        ),
    };
    Ok(ServerMessage::GameEnd { winner })
}

fn decode_game_state(mut obj: Map<String, Value>) -> Result<GameState, ProtocolError> {
    // 按固定顺序取出字段，报告的是第一个缺失或类型错误的字段
    let personal_cards: Vec<i64> = required(&mut obj, "personal_cards")?;
    let personal_id: i64 = required(&mut obj, "personal_id")?;
    let middle_cards: Vec<i64> = required(&mut obj, "middle_cards")?;
    let player_names: Vec<String> = required(&mut obj, "player_names")?;
    let player_cards: Vec<Option<Vec<i64>>> = required(&mut obj, "player_cards")?;
    let player_betting_amount: Vec<u32> = required(&mut obj, "player_betting_amount")?;
    let player_money: Vec<u32> = required(&mut obj, "player_money")?;
    let player_has_folded: Vec<bool> = required(&mut obj, "player_has_folded")?;
    let player_is_out: Vec<bool> = required(&mut obj, "player_is_out")?;
    let round_number: u32 = required(&mut obj, "round_number")?;
    let is_started: bool = required(&mut obj, "is_started")?;
    let is_showdown: bool = required(&mut obj, "is_showdown")?;
    let hand_winner: i64 = required(&mut obj, "hand_winner")?;

    let seats = player_names.len();
    check_len("player_cards", seats, player_cards.len())?;
    check_len("player_betting_amount", seats, player_betting_amount.len())?;
    check_len("player_money", seats, player_money.len())?;
    check_len("player_has_folded", seats, player_has_folded.len())?;
    check_len("player_is_out", seats, player_is_out.len())?;

    let personal_id = seat_index("personal_id", personal_id, seats)?;
    let hand_winner = match hand_winner {
        NO_WINNER => None,
        seat => Some(seat_index("hand_winner", seat, seats)?),
    };

    let personal_cards = cards("personal_cards", &personal_cards, 2)?;
    let middle_cards = cards("middle_cards", &middle_cards, 5)?;

    let mut players = Vec::with_capacity(seats);
    for (i, (name, hand)) in player_names.into_iter().zip(player_cards).enumerate() {
        // 本地玩家的手牌来自 personal_cards，其他座位用各自的 player_cards[i]
        let hand = if i == personal_id {
            personal_cards.clone()
        } else {
            cards("player_cards", hand.as_deref().unwrap_or_default(), 2)?
        };
        players.push(Player {
            id: i.to_string(),
            name,
            hand,
            balance: player_money[i],
            current_bet: player_betting_amount[i],
            has_folded: player_has_folded[i],
            is_out: player_is_out[i],
        });
    }

    Ok(GameState {
        players,
        personal_id,
        round_number,
        is_started,
        middle_cards,
        is_showdown,
        hand_winner,
        my_turn: false,
    })
}

/// 取出一个必需字段：键不存在是 MissingField，类型不对是 InvalidField
fn required<T: DeserializeOwned>(
    obj: &mut Map<String, Value>,
    field: &'static str,
) -> Result<T, ProtocolError> {
    let value = obj.remove(field).ok_or(ProtocolError::MissingField(field))?;
    serde_json::from_value(value).map_err(|e| ProtocolError::invalid(field, e))
}

fn check_len(field: &'static str, seats: usize, actual: usize) -> Result<(), ProtocolError> {
    if actual == seats {
        Ok(())
    } else {
        Err(ProtocolError::LengthMismatch { field, seats, actual })
    }
}

fn seat_index(field: &'static str, seat: i64, seats: usize) -> Result<Seat, ProtocolError> {
    match Seat::try_from(seat) {
        Ok(index) if index < seats => Ok(index),
        _ => Err(ProtocolError::SeatOutOfRange { field, seat, seats }),
    }
}

fn cards(field: &'static str, values: &[i64], max: usize) -> Result<Vec<Card>, ProtocolError> {
    if values.len() > max {
        return Err(ProtocolError::TooManyCards {
            field,
            count: values.len(),
            max,
        });
    }
    values
        .iter()
        .map(|&v| {
            u8::try_from(v)
                .map_err(|_| ProtocolError::CardOutOfRange(v))
                .and_then(Card::new)
        })
        .collect()
}
