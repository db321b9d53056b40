use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;
// --- 核心数据结构定义 ---

/// 花色 (Suit)
/// 顺序与线上编码一致：value / 13 依次为 梅花、方块、红心、黑桃
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Club,    // 梅花 ♣️
    Diamond, // 方块 ♦️
    Heart,   // 红心 ♥️
    Spade,   // 黑桃 ♠️
}

/// 点数 (Rank)
/// 判别值就是线上的点数 2..=14，J/Q/K/A 对应 11..=14
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Rank {
    Two = 2,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

/// 单张扑克牌 (Card)
///
/// 服务器用 0..=51 的整数标识一张牌。构造时校验范围，
/// 因此之后的花色/点数计算不会失败。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Card(u8);

impl Card {
    pub const DECK_SIZE: u8 = 52;

    pub fn new(value: u8) -> Result<Card, ProtocolError> {
        if value < Self::DECK_SIZE {
            Ok(Card(value))
        } else {
            Err(ProtocolError::CardOutOfRange(value.into()))
        }
    }

    /// 线上的原始整数
    pub fn value(self) -> u8 {
        self.0
    }

    pub fn suit(self) -> Suit {
        match self.0 / 13 {
            0 => Suit::Club,
            1 => Suit::Diamond,
            2 => Suit::Heart,
            3 => Suit::Spade,
            other => unreachable!("card {} has suit index {other}", self.0),
        }
    }

    pub fn rank(self) -> Rank {
        match self.0 % 13 + 2 {
            2 => Rank::Two,
            3 => Rank::Three,
            4 => Rank::Four,
            5 => Rank::Five,
            6 => Rank::Six,
            7 => Rank::Seven,
            8 => Rank::Eight,
            9 => Rank::Nine,
            10 => Rank::Ten,
            11 => Rank::Jack,
            12 => Rank::Queen,
            13 => Rank::King,
            14 => Rank::Ace,
            other => unreachable!("card {} has rank {other}", self.0),
        }
    }

    /// 素材文件名，例如 `ace_of_spades`
    pub fn asset_name(self) -> String {
        format!("{}_of_{}", self.rank().name(), self.suit().plural())
    }
}

impl TryFrom<u8> for Card {
    type Error = ProtocolError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Card::new(value)
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> u8 {
        card.0
    }
}

impl Suit {
    pub fn plural(self) -> &'static str {
        match self {
            Suit::Club => "clubs",
            Suit::Diamond => "diamonds",
            Suit::Heart => "hearts",
            Suit::Spade => "spades",
        }
    }
}

impl Rank {
    /// 数值点数 2..=14
    pub fn value(self) -> u8 {
        self as u8
    }

    /// 人类可读的名字："2".."10"，以及 jack/queen/king/ace
    pub fn name(self) -> String {
        match self {
            Rank::Jack => "jack".to_string(),
            Rank::Queen => "queen".to_string(),
            Rank::King => "king".to_string(),
            Rank::Ace => "ace".to_string(),
            other => other.value().to_string(),
        }
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Club => "♣",
            Suit::Diamond => "♦",
            Suit::Heart => "♥",
            Suit::Spade => "♠",
        })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "T",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank(), self.suit())
    }
}

// --- 单元测试 ---
