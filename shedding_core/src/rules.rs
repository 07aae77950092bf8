use crate::card::{Card, Rank, Suit};
use crate::combo::{classify, Category, Combination};
use crate::error::RulesError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 玩法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Variant {
    /// 斗地主：三人，一副牌，一个地主对两个农民
    DouDizhu,
    /// 掼蛋：四人两队，两副牌，有级牌和逢人配
    Guandan,
}

impl Variant {
    pub const fn players(self) -> usize {
        match self {
            Variant::DouDizhu => 3,
            Variant::Guandan => 4,
        }
    }

    pub const fn decks(self) -> u8 {
        match self {
            Variant::DouDizhu => 1,
            Variant::Guandan => 2,
        }
    }

    pub const fn bottom_cards(self) -> usize {
        match self {
            Variant::DouDizhu => 3,
            Variant::Guandan => 0,
        }
    }
}

/// 一局牌使用的规则集
///
/// 掼蛋需要带上本局的级牌；红桃级牌就是百搭（逢人配）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ruleset {
    DouDizhu,
    Guandan { level: Rank },
}

impl Ruleset {
    /// 构造掼蛋规则，级牌不能是王
    pub fn guandan(level: Rank) -> Result<Ruleset, RulesError> {
        if level.is_joker() {
            return Err(RulesError::InvalidLevel(level));
        }
        Ok(Ruleset::Guandan { level })
    }

    pub const fn variant(&self) -> Variant {
        match self {
            Ruleset::DouDizhu => Variant::DouDizhu,
            Ruleset::Guandan { .. } => Variant::Guandan,
        }
    }

    pub const fn level(&self) -> Option<Rank> {
        match self {
            Ruleset::DouDizhu => None,
            Ruleset::Guandan { level } => Some(*level),
        }
    }

    pub fn level_value(&self) -> Option<u8> {
        self.level().map(Rank::value)
    }

    /// 这张牌在本局是否是百搭
    pub fn is_wild(&self, card: &Card) -> bool {
        match self {
            Ruleset::DouDizhu => false,
            Ruleset::Guandan { level } => card.rank == *level && card.suit == Suit::Heart,
        }
    }

    /// 炸弹的张数范围
    pub const fn bomb_lengths(&self) -> std::ops::RangeInclusive<usize> {
        match self {
            Ruleset::DouDizhu => 4..=4,
            Ruleset::Guandan { .. } => 4..=10,
        }
    }

    /// 连牌（顺子/连对/钢板）最少需要几组
    pub const fn min_groups(&self, width: u8) -> usize {
        match (self, width) {
            (_, 1) => 5,
            (Ruleset::DouDizhu, 2) => 3,
            (Ruleset::Guandan { .. }, 2) => 2,
            _ => 2,
        }
    }

    /// 该规则集下是否存在这种牌型
    pub fn allows(&self, category: Category) -> bool {
        match category {
            Category::TripleWithSingle
            | Category::PlaneWithSingles
            | Category::PlaneWithPairs
            | Category::FourWithTwo
            | Category::FourWithPairs
            | Category::Rocket => *self == Ruleset::DouDizhu,
            Category::FlushRun | Category::FourJokers => matches!(self, Ruleset::Guandan { .. }),
            Category::Bomb(n) => self.bomb_lengths().contains(&(n as usize)),
            _ => true,
        }
    }
}

/// 牌型所在的威力层级
///
/// 普通牌型为 0；同花顺高于普通牌型、低于所有炸弹；
/// 炸弹按张数逐级升高；王炸 / 四王在最顶层。
pub fn power_tier(category: Category) -> u8 {
    match category {
        Category::Rocket | Category::FourJokers => 100,
        Category::Bomb(n) => 10 + n,
        Category::FlushRun => 1,
        _ => 0,
    }
}

/// 判断 `candidate` 能否压过 `reference`
///
/// - 没有上家牌时，任何合法牌型都能出。
/// - 不同层级：层级高者胜，长炸弹永远大于短炸弹。
/// - 同为炸弹 / 同花顺：点数大者胜。
/// - 普通牌型：牌型相同、张数相同、点数更大才能压。
pub fn beats(candidate: &Combination, reference: Option<&Combination>, rules: &Ruleset) -> bool {
    if !rules.allows(candidate.category) {
        return false;
    }
    let Some(reference) = reference else {
        return true;
    };

    let (mine, theirs) = (power_tier(candidate.category), power_tier(reference.category));
    if mine != theirs {
        return mine > theirs;
    }
    match mine {
        // 王炸 / 四王只有一副
        100 => false,
        0 => {
            candidate.category == reference.category
                && candidate.len() == reference.len()
                && candidate.primary > reference.primary
        }
        _ => candidate.primary > reference.primary,
    }
}

/// 直接用两手牌判断能否压过
///
/// 出的牌不成牌型时返回“上家也不成牌型”，与三人版本的边界行为保持一致：
/// 双方都不成牌型时结果为 `true`，调用方应先用 `classify` 校验出牌。
pub fn beats_cards(played: &[Card], last: &[Card], rules: &Ruleset) -> bool {
    let last = classify(last, rules);
    match classify(played, rules) {
        None => last.is_none(),
        Some(played) => beats(&played, last.as_ref(), rules),
    }
}

/// 校验一手牌里没有重复的牌 id
pub fn validate_hand(hand: &[Card]) -> Result<(), RulesError> {
    let mut seen = HashSet::with_capacity(hand.len());
    for card in hand {
        if !seen.insert(card.id) {
            return Err(RulesError::DuplicateCard { id: card.id });
        }
    }
    Ok(())
}

// --- 单元测试 ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Rank::*;
    use crate::card::Suit::*;

    fn cards(layout: &[(Rank, Suit)]) -> Vec<Card> {
        layout.iter().enumerate().map(|(i, &(r, s))| Card::new(i as u16, r, s)).collect()
    }

    fn combo(layout: &[(Rank, Suit)], rules: &Ruleset) -> Combination {
        classify(&cards(layout), rules).expect("测试牌型应当合法")
    }

    #[test]
    fn test_opening_accepts_any_combination() {
        let rules = Ruleset::DouDizhu;
        let single = combo(&[(Three, Spade)], &rules);
        assert!(beats(&single, None, &rules));
    }

    #[test]
    fn test_pair_comparison() {
        let rules = Ruleset::DouDizhu;
        let eights = combo(&[(Eight, Spade), (Eight, Heart)], &rules);
        let other_eights = combo(&[(Eight, Club), (Eight, Diamond)], &rules);
        let nines = combo(&[(Nine, Spade), (Nine, Heart)], &rules);
        let triple_nines = combo(&[(Nine, Spade), (Nine, Heart), (Nine, Club)], &rules);

        assert!(!beats(&other_eights, Some(&eights), &rules));
        assert!(beats(&nines, Some(&eights), &rules));
        assert!(!beats(&triple_nines, Some(&eights), &rules));
    }

    #[test]
    fn test_runs_of_different_length_never_beat() {
        let rules = Ruleset::DouDizhu;
        let six = combo(&[(Three, Spade), (Four, Spade), (Five, Heart), (Six, Club), (Seven, Spade), (Eight, Diamond)], &rules);
        let five_high = combo(&[(Ten, Spade), (Jack, Spade), (Queen, Heart), (King, Club), (Ace, Spade)], &rules);
        assert!(!beats(&five_high, Some(&six), &rules));
        assert!(!beats(&six, Some(&five_high), &rules));
    }

    #[test]
    fn test_bomb_beats_ordinary_and_rocket_beats_bomb() {
        let rules = Ruleset::DouDizhu;
        let bomb = combo(&[(Three, Spade), (Three, Heart), (Three, Club), (Three, Diamond)], &rules);
        let twos = combo(&[(Two, Spade), (Two, Heart)], &rules);
        let rocket = combo(&[(BlackJoker, Joker), (RedJoker, Joker)], &rules);

        assert_eq!(rocket.category, Category::Rocket);
        assert!(beats(&bomb, Some(&twos), &rules));
        assert!(!beats(&twos, Some(&bomb), &rules));
        assert!(beats(&rocket, Some(&bomb), &rules));
        assert!(beats(&rocket, Some(&twos), &rules));
        assert!(!beats(&bomb, Some(&rocket), &rules));
    }

    #[test]
    fn test_guandan_bomb_length_beats_rank() {
        let rules = Ruleset::guandan(Rank::Two).unwrap();
        let four_aces = combo(&[(Ace, Spade), (Ace, Heart), (Ace, Club), (Ace, Diamond)], &rules);
        let five_threes = combo(&[(Three, Spade), (Three, Heart), (Three, Club), (Three, Diamond), (Three, Spade)], &rules);
        assert_eq!(five_threes.category, Category::Bomb(5));
        assert!(beats(&five_threes, Some(&four_aces), &rules));
        assert!(!beats(&four_aces, Some(&five_threes), &rules));
    }

    #[test]
    fn test_guandan_flush_run_sits_below_bombs() {
        let rules = Ruleset::guandan(Rank::Two).unwrap();
        let flush = combo(&[(Nine, Club), (Ten, Club), (Jack, Club), (Queen, Club), (King, Club)], &rules);
        let run = combo(&[(Ten, Spade), (Jack, Heart), (Queen, Club), (King, Diamond), (Ace, Spade)], &rules);
        let bomb = combo(&[(Four, Spade), (Four, Heart), (Four, Club), (Four, Diamond)], &rules);
        let four_jokers = combo(&[(BlackJoker, Joker), (BlackJoker, Joker), (RedJoker, Joker), (RedJoker, Joker)], &rules);

        assert_eq!(flush.category, Category::FlushRun);
        assert!(beats(&flush, Some(&run), &rules));
        assert!(beats(&bomb, Some(&flush), &rules));
        assert!(!beats(&flush, Some(&bomb), &rules));
        assert!(beats(&four_jokers, Some(&bomb), &rules));
    }

    #[test]
    fn test_categories_outside_ruleset_are_rejected() {
        let ddz = Ruleset::DouDizhu;
        let guandan = Ruleset::guandan(Rank::Two).unwrap();
        let plane = combo(&[(Three, Spade), (Three, Heart), (Three, Club), (Four, Spade), (Four, Heart), (Four, Club), (Nine, Spade), (Ten, Club)], &ddz);
        assert_eq!(plane.category, Category::PlaneWithSingles);
        assert!(!beats(&plane, None, &guandan));
    }

    #[test]
    fn test_beats_cards_invalid_boundary() {
        let rules = Ruleset::DouDizhu;
        let junk = cards(&[(Three, Spade), (Nine, Heart)]);
        let pair = cards(&[(Five, Spade), (Five, Heart)]);
        assert!(beats_cards(&junk, &junk, &rules));
        assert!(!beats_cards(&junk, &pair, &rules));
        assert!(beats_cards(&pair, &junk, &rules));
        assert!(beats_cards(&pair, &[], &rules));
    }

    #[test]
    fn test_guandan_rejects_joker_level() {
        assert_eq!(Ruleset::guandan(RedJoker), Err(RulesError::InvalidLevel(RedJoker)));
    }

    #[test]
    fn test_validate_hand_detects_duplicates() {
        let mut hand = cards(&[(Three, Spade), (Four, Spade)]);
        assert!(validate_hand(&hand).is_ok());
        hand.push(hand[0]);
        assert_eq!(validate_hand(&hand), Err(RulesError::DuplicateCard { id: 0 }));
    }
}
