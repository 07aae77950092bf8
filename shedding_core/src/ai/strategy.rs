//! 领出与跟牌的打分策略
//!
//! 两个阶段共用同一套做法：先列出候选，再给每个候选打一个优先级，取最大者。
//! 优先级相同时取点数更小的，再相同取用百搭更少的。

use super::candidates::{enumerate_index, HandIndex};
use crate::card::{value_counts, Card};
use crate::combo::{classify, Category, Combination};
use crate::config::AiConfig;
use crate::rules::{beats, power_tier, Ruleset};
use crate::state::{LastPlay, TableView};
use std::cmp::Ordering;
use tracing::debug;

/// 打过分的候选
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub combo: Combination,
    pub priority: i32,
}

impl Candidate {
    fn rank(&self, other: &Candidate) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then(other.combo.primary.cmp(&self.combo.primary))
            .then(other.combo.wilds.cmp(&self.combo.wilds))
    }
}

/// 取优先级最高的候选
pub fn pick(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates.into_iter().max_by(|a, b| a.rank(b))
}

const WILD_PENALTY: i32 = 20;
const ROCKET_SPLIT_PENALTY: i32 = 30;
const HIGH_SET_PENALTY: i32 = 40;
const HIGH_KICKER_PENALTY: i32 = 15;

/// 拆牌代价：某点数没有全部打出时，按原有张数扣分
fn breakage(index: &HandIndex, combo: &Combination) -> i32 {
    let rules = index.rules();
    let used = value_counts(combo.cards.iter().filter(|c| !rules.is_wild(c)));
    let mut penalty: i32 = (3..=17u8)
        .filter(|v| used[*v as usize] > 0)
        .map(|v| {
            let held = index.count(v);
            if used[v as usize] as usize >= held {
                return 0;
            }
            match held {
                4.. => 40,
                3 => 10,
                _ => 6,
            }
        })
        .sum();

    // 斗地主里拆开王炸
    if *rules == Ruleset::DouDizhu && index.count(16) > 0 && index.count(17) > 0 && used[16] + used[17] == 1 {
        penalty += ROCKET_SPLIT_PENALTY;
    }
    penalty
}

fn wild_cost(combo: &Combination) -> i32 {
    combo.wilds as i32 * WILD_PENALTY
}

/// 带出去的牌（不在主体点数范围内的牌）
fn kickers(combo: &Combination) -> impl Iterator<Item = &Card> {
    combo.cards.iter().filter(move |c| c.value() < combo.base || c.value() > combo.primary)
}

/// 领出时各牌型的额外分
fn lead_bonus(combo: &Combination) -> Option<i32> {
    let bonus = match combo.category {
        Category::Run => 20 + combo.primary as i32,
        Category::PairRun => 25,
        Category::Plate | Category::PlaneWithSingles | Category::PlaneWithPairs => 30,
        Category::FullHouse => 10,
        Category::TripleWithSingle => 8,
        Category::Triple => 5,
        Category::Pair => 2,
        Category::FourWithTwo | Category::FourWithPairs => -60,
        _ => return None,
    };
    Some(bonus)
}

fn lead_priority(index: &HandIndex, combo: &Combination, config: &AiConfig) -> Option<i32> {
    let mut priority = combo.len() as i32 * 10 + lead_bonus(combo)?;

    let is_set = matches!(
        combo.category,
        Category::Pair | Category::Triple | Category::FullHouse | Category::TripleWithSingle
    );
    if is_set && combo.primary >= config.conserve_value && index.len() > config.large_hand {
        priority -= HIGH_SET_PENALTY;
    }
    priority -= kickers(combo).filter(|c| c.value() >= config.conserve_value).count() as i32 * HIGH_KICKER_PENALTY;
    priority -= breakage(index, combo);
    priority -= wild_cost(combo);
    Some(priority)
}

/// 领出
pub fn lead(hand: &[Card], index: &HandIndex, config: &AiConfig) -> Option<Combination> {
    if let Some(whole) = classify(hand, index.rules()) {
        debug!(combo = %whole, "领出：整手牌一次出完");
        return Some(whole);
    }

    let all = enumerate_index(index);
    let ranked: Vec<Candidate> = all
        .iter()
        .filter_map(|combo| {
            let priority = lead_priority(index, combo, config)?;
            (priority > 0).then(|| Candidate { combo: combo.clone(), priority })
        })
        .collect();

    if let Some(best) = pick(ranked) {
        debug!(combo = %best.combo, priority = best.priority, "领出：结构牌");
        return Some(best.combo);
    }

    let single = lead_single(index, config, &all);
    if let Some(combo) = &single {
        debug!(combo = %combo, "领出：单张");
    }
    single
}

/// 没有结构牌可出时的单张：平时出最小的孤张，残局全是单张时出最大的
fn lead_single(index: &HandIndex, config: &AiConfig, all: &[Combination]) -> Option<Combination> {
    let singles = all.iter().filter(|c| c.category == Category::Single);
    let all_loose = index.wild_count() == 0 && index.values().all(|v| index.count(v) == 1);
    if all_loose && index.len() <= config.endgame_cards {
        return singles.max_by_key(|c| c.primary).cloned();
    }
    singles
        .min_by_key(|c| {
            let looseness = if c.wilds > 0 {
                3
            } else {
                match index.count(c.primary) {
                    1 => 0,
                    2 | 3 => 1,
                    _ => 2,
                }
            };
            (looseness, c.primary)
        })
        .cloned()
}

/// 跟牌时是否允许动用炸弹
fn bombs_allowed(index: &HandIndex, view: &TableView, last: &LastPlay, config: &AiConfig) -> bool {
    if view.is_teammate(last.seat) {
        return false;
    }
    let urgent = view.min_opponent_cards().is_some_and(|n| n <= config.urgent_opponent_cards)
        || index.len() <= config.urgent_own_cards;
    let intercept = view.streak(last.seat) >= config.interception_streak;
    let aggressive = matches!(index.rules(), Ruleset::Guandan { .. })
        && view.min_opponent_cards().is_some_and(|n| n <= config.aggressive_owner_cards);
    debug!(urgent, intercept, aggressive, "炸弹条件");
    urgent || intercept || aggressive
}

/// 掼蛋里队友出了弱牌、队友手牌还多、后面还有对手要出时，可以用普通牌接过来
fn rescue_teammate(view: &TableView, last: &LastPlay, config: &AiConfig) -> bool {
    let combo = &last.combo;
    let teammate_cards = view.remaining.get(last.seat).copied().unwrap_or(0);
    teammate_cards >= config.rescue_teammate_cards
        && !combo.category.is_bomb()
        && combo.primary <= config.weak_lead_value
        && view.opponents().next().is_some()
}

fn follow_priority(index: &HandIndex, combo: &Combination) -> i32 {
    let cost = breakage(index, combo) + wild_cost(combo);
    if combo.category.is_bomb() {
        400 - power_tier(combo.category) as i32 * 10 - combo.primary as i32 - cost
    } else {
        1000 - combo.primary as i32 * 4 - cost
    }
}

/// 跟牌：找能压过上家的最便宜的组合，没有则返回 `None`（过）
pub fn follow(
    hand: &[Card],
    index: &HandIndex,
    view: &TableView,
    last: &LastPlay,
    config: &AiConfig,
) -> Option<Combination> {
    let rules = index.rules();
    let reference = &last.combo;

    if let Some(whole) = classify(hand, rules).filter(|c| beats(c, Some(reference), rules)) {
        debug!(combo = %whole, "跟牌：整手牌压过后出完");
        return Some(whole);
    }

    let teammate = view.is_teammate(last.seat);
    if teammate && matches!(rules, Ruleset::Guandan { .. }) && !rescue_teammate(view, last, config) {
        debug!(seat = last.seat, "队友的牌，不压");
        return None;
    }
    let allow_bombs = bombs_allowed(index, view, last, config);

    let ranked: Vec<Candidate> = enumerate_index(index)
        .into_iter()
        .filter(|combo| beats(combo, Some(reference), rules))
        .filter(|combo| allow_bombs || !combo.category.is_bomb())
        .map(|combo| {
            let priority = follow_priority(index, &combo);
            Candidate { combo, priority }
        })
        .collect();

    let best = pick(ranked)?;
    debug!(combo = %best.combo, priority = best.priority, teammate, "跟牌");
    Some(best.combo)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Rank::{self, *};
    use crate::card::Suit::{self, *};

    fn cards(layout: &[(Rank, Suit)]) -> Vec<Card> {
        layout.iter().enumerate().map(|(i, &(r, s))| Card::new(i as u16, r, s)).collect()
    }

    fn combo(layout: &[(Rank, Suit)], rules: &Ruleset) -> Combination {
        classify(&cards(layout), rules).expect("测试牌型应当合法")
    }

    #[test]
    fn test_pick_prefers_lower_primary_on_tie() {
        let rules = Ruleset::DouDizhu;
        let low = Candidate { combo: combo(&[(Five, Spade)], &rules), priority: 10 };
        let high = Candidate { combo: combo(&[(King, Spade)], &rules), priority: 10 };
        let best = pick(vec![high, low.clone()]).unwrap();
        assert_eq!(best, low);
        assert_eq!(pick(Vec::new()), None);
    }

    #[test]
    fn test_breakage_counts_split_groups() {
        let rules = Ruleset::DouDizhu;
        let hand = cards(&[(Nine, Spade), (Nine, Heart), (Nine, Club), (Nine, Diamond), (Five, Club), (Five, Heart)]);
        let index = HandIndex::new(&hand, &rules);
        let pair_nines = classify(&hand[..2], &rules).unwrap();
        let pair_fives = classify(&hand[4..], &rules).unwrap();
        assert_eq!(breakage(&index, &pair_nines), 40);
        assert_eq!(breakage(&index, &pair_fives), 0);
    }

    #[test]
    fn test_splitting_rocket_is_penalized() {
        let rules = Ruleset::DouDizhu;
        let hand = cards(&[(BlackJoker, Joker), (RedJoker, Joker), (Three, Club)]);
        let index = HandIndex::new(&hand, &rules);
        let single = classify(&hand[..1], &rules).unwrap();
        assert_eq!(breakage(&index, &single), ROCKET_SPLIT_PENALTY);
    }

    #[test]
    fn test_high_pair_not_led_from_large_hand() {
        let rules = Ruleset::DouDizhu;
        let hand = cards(&[
            (Ace, Spade), (Ace, Heart), (Three, Club), (Five, Diamond), (Seven, Spade),
            (Nine, Club), (Jack, Heart), (King, Spade), (Eight, Diamond), (Four, Heart), (Six, Heart),
        ]);
        let index = HandIndex::new(&hand, &rules);
        let aces = classify(&hand[..2], &rules).unwrap();
        let priority = lead_priority(&index, &aces, &AiConfig::default()).unwrap();
        assert!(priority <= 0);
    }
}
