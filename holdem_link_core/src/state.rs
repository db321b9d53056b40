use crate::card::Card;
use std::fmt;

/// 座位号，即玩家在快照中 `players` 列表里的索引
pub type Seat = usize;

/// 线上表示"没有赢家"的哨兵值
pub const NO_WINNER: i64 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String, // 座位号的十进制字符串
    pub name: String,
    // 本地玩家总是持有自己的两张底牌；
    // 其他玩家只有在摊牌时才会被公开，平时为空
    pub hand: Vec<Card>,
    pub balance: u32,     // 剩余筹码
    pub current_bet: u32, // 本轮已下注额
    pub has_folded: bool,
    pub is_out: bool, // 已经输光筹码出局
}

/// 服务器推送的一份完整游戏状态快照。
///
/// 快照整体构造、整体替换。构造完成后唯一允许原地修改的字段是 `my_turn`，
/// 它不在线上协议里，由 `awaiting_player` 消息触发。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    pub players: Vec<Player>,
    pub personal_id: Seat,
    // 偶数轮是下注轮，可以加注；奇数轮只能跟注/过牌/弃牌
    pub round_number: u32,
    pub is_started: bool,
    pub middle_cards: Vec<Card>,
    pub is_showdown: bool,
    pub hand_winner: Option<Seat>,
    pub my_turn: bool,
}

/// 本地推导出的合法动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    Fold,
    Check,
    Call,
    Raise,
}

// --- GameState 的实现方法 ---

impl GameState {
    /// 本地玩家
    pub fn me(&self) -> &Player {
        &self.players[self.personal_id]
    }

    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat)
    }

    pub fn seat_count(&self) -> usize {
        self.players.len()
    }

    /// 所有座位中最高的本轮下注额
    pub fn highest_bet(&self) -> u32 {
        self.players.iter().map(|p| p.current_bet).max().unwrap_or(0)
    }

    pub fn amount_to_call(&self) -> u32 {
        self.highest_bet().saturating_sub(self.me().current_bet)
    }

    pub fn is_betting_round(&self) -> bool {
        self.round_number % 2 == 0
    }

    pub fn hand_winner_player(&self) -> Option<&Player> {
        self.hand_winner.and_then(|seat| self.player(seat))
    }

    /// 根据当前快照推导本地玩家可以执行的动作。
    ///
    /// - 不是自己的回合或已弃牌时没有任何动作；
    /// - 总是可以弃牌；
    /// - 有人下注比自己多时可以跟注，否则可以过牌；
    /// - 只有偶数轮可以加注。
    pub fn legal_actions(&self) -> Vec<PlayerAction> {
        if !self.my_turn || self.me().has_folded {
            return Vec::new();
        }

        let mut actions = vec![PlayerAction::Fold];
        if self.highest_bet() > self.me().current_bet {
            actions.push(PlayerAction::Call);
        } else {
            actions.push(PlayerAction::Check);
        }
        if self.is_betting_round() {
            actions.push(PlayerAction::Raise);
        }
        actions
    }
}

impl fmt::Display for PlayerAction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            PlayerAction::Fold => "fold",
            PlayerAction::Check => "check",
            PlayerAction::Call => "call",
            PlayerAction::Raise => "raise",
        })
    }
}
