use crate::error::RulesError;
use crate::rules::Variant;
use rand::prelude::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

// --- 核心数据结构定义 ---

/// 花色 (Suit)
/// 大小王没有普通花色，统一记为 `Joker`
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Spade,   // 黑桃 ♠️
    Heart,   // 红心 ♥️
    Club,    // 梅花 ♣️
    Diamond, // 方块 ♦️
    Joker,   // 王
}

impl Suit {
    pub const NATURAL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Club, Suit::Diamond];
}

/// 点数 (Rank)
/// 判别值即牌力：3~10 为本身，J/Q/K/A/2 为 11~15，小王 16，大王 17。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    Three = 3,
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
    Two,
    BlackJoker,
    RedJoker,
}

impl Rank {
    /// 除大小王之外的 13 个点数，从小到大
    pub const NATURAL: [Rank; 13] = [
        Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven, Rank::Eight, Rank::Nine,
        Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace, Rank::Two,
    ];

    pub const fn value(self) -> u8 {
        self as u8
    }

    pub fn from_value(value: u8) -> Option<Rank> {
        match value {
            3..=15 => Some(Rank::NATURAL[(value - 3) as usize]),
            16 => Some(Rank::BlackJoker),
            17 => Some(Rank::RedJoker),
            _ => None,
        }
    }

    pub const fn is_joker(self) -> bool {
        matches!(self, Rank::BlackJoker | Rank::RedJoker)
    }
}

/// 单张牌 (Card)
///
/// `id` 在一次发牌中唯一，用来区分两副牌里花色点数都相同的两张牌。
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub id: u16,
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    pub fn new(id: u16, rank: Rank, suit: Suit) -> Card {
        Card { id, rank, suit }
    }

    pub const fn value(&self) -> u8 {
        self.rank.value()
    }

    pub const fn is_joker(&self) -> bool {
        self.rank.is_joker()
    }
}

// 先比点数，再比花色，最后比 id，保证排序稳定
impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank
            .cmp(&other.rank)
            .then(self.suit.cmp(&other.suit))
            .then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// 按点数统计张数，下标即点数 (0..=17，0~2 不用)
pub type ValueCounts = [u8; 18];

pub fn value_counts<'a>(cards: impl IntoIterator<Item = &'a Card>) -> ValueCounts {
    let mut counts = [0u8; 18];
    for card in cards {
        counts[card.value() as usize] += 1;
    }
    counts
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Spade => "♠️",
            Suit::Heart => "♥️",
            Suit::Club => "♣️",
            Suit::Diamond => "♦️",
            Suit::Joker => "",
        })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::BlackJoker => "小王",
            Rank::RedJoker => "大王",
        })
    }
}

impl FromStr for Rank {
    type Err = RulesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rank = match s.trim().to_ascii_uppercase().as_str() {
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" | "T" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            "A" => Rank::Ace,
            "2" => Rank::Two,
            "BJ" | "SJ" => Rank::BlackJoker,
            "RJ" => Rank::RedJoker,
            _ => return Err(RulesError::UnknownRank(s.to_string())),
        };
        Ok(rank)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.suit, self.rank)
    }
}

// --- 牌组生成与发牌 ---

/// 创建 `decks` 副完整的 54 张牌，id 从 0 开始连续编号
pub fn create_deck(decks: u8) -> Vec<Card> {
    let mut deck = Vec::with_capacity(54 * decks as usize);
    let mut id = 0u16;
    for _ in 0..decks {
        for &suit in &Suit::NATURAL {
            for &rank in &Rank::NATURAL {
                deck.push(Card { id, rank, suit });
                id += 1;
            }
        }
        for rank in [Rank::BlackJoker, Rank::RedJoker] {
            deck.push(Card { id, rank, suit: Suit::Joker });
            id += 1;
        }
    }
    deck
}

/// 一次发牌的结果：每个座位的手牌 + 底牌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub hands: Vec<Vec<Card>>,
    pub bottom: Vec<Card>,
}

/// 洗牌并发牌
///
/// 斗地主：54 张，3 人各 17 张，留 3 张底牌。
/// 掼蛋：108 张，4 人各 27 张，没有底牌。
pub fn deal<R: Rng + ?Sized>(variant: Variant, rng: &mut R) -> Deal {
    let mut deck = create_deck(variant.decks());
    deck.shuffle(rng);

    let players = variant.players();
    let share = (deck.len() - variant.bottom_cards()) / players;
    let bottom = deck.split_off(share * players);

    let mut hands = vec![Vec::with_capacity(share); players];
    // 轮流发牌
    for (i, card) in deck.into_iter().enumerate() {
        hands[i % players].push(card);
    }
    for hand in &mut hands {
        hand.sort();
    }

    Deal { hands, bottom }
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_rank_values() {
        assert_eq!(Rank::Three.value(), 3);
        assert_eq!(Rank::Ten.value(), 10);
        assert_eq!(Rank::Jack.value(), 11);
        assert_eq!(Rank::Ace.value(), 14);
        assert_eq!(Rank::Two.value(), 15);
        assert_eq!(Rank::BlackJoker.value(), 16);
        assert_eq!(Rank::RedJoker.value(), 17);
        for v in 3..=17 {
            assert_eq!(Rank::from_value(v).map(Rank::value), Some(v));
        }
        assert_eq!(Rank::from_value(2), None);
        assert_eq!(Rank::from_value(18), None);
    }

    #[test]
    fn test_rank_parse() {
        assert_eq!("2".parse::<Rank>(), Ok(Rank::Two));
        assert_eq!("t".parse::<Rank>(), Ok(Rank::Ten));
        assert_eq!(" a ".parse::<Rank>(), Ok(Rank::Ace));
        assert!("1".parse::<Rank>().is_err());
    }

    #[test]
    fn test_card_ordering_by_value_first() {
        let three = Card::new(9, Rank::Three, Suit::Diamond);
        let two = Card::new(0, Rank::Two, Suit::Spade);
        let joker = Card::new(1, Rank::BlackJoker, Suit::Joker);
        let mut cards = vec![joker, two, three];
        cards.sort();
        assert_eq!(cards, vec![three, two, joker]);
    }

    #[test]
    fn test_create_single_deck() {
        let deck = create_deck(1);
        assert_eq!(deck.len(), 54);
        let counts = value_counts(&deck);
        for v in 3..=15 {
            assert_eq!(counts[v], 4);
        }
        assert_eq!(counts[16], 1);
        assert_eq!(counts[17], 1);
    }

    #[test]
    fn test_create_double_deck_has_unique_ids() {
        let deck = create_deck(2);
        assert_eq!(deck.len(), 108);
        let ids: HashSet<u16> = deck.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 108);
    }

    #[test]
    fn test_deal_dou_dizhu() {
        let mut rng = StdRng::seed_from_u64(7);
        let deal = deal(Variant::DouDizhu, &mut rng);
        assert_eq!(deal.hands.len(), 3);
        assert!(deal.hands.iter().all(|h| h.len() == 17));
        assert_eq!(deal.bottom.len(), 3);

        let ids: HashSet<u16> = deal.hands.iter().flatten().chain(&deal.bottom).map(|c| c.id).collect();
        assert_eq!(ids.len(), 54);
    }

    #[test]
    fn test_deal_guandan() {
        let mut rng = StdRng::seed_from_u64(7);
        let deal = deal(Variant::Guandan, &mut rng);
        assert_eq!(deal.hands.len(), 4);
        assert!(deal.hands.iter().all(|h| h.len() == 27));
        assert!(deal.bottom.is_empty());
    }

    #[test]
    fn test_deal_is_seeded() {
        let a = deal(Variant::DouDizhu, &mut StdRng::seed_from_u64(42));
        let b = deal(Variant::DouDizhu, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
