//! 候选牌型枚举
//!
//! 从一手牌里列出所有能组成的牌型。每个候选都会重新过一遍 `classify`，
//! 识别结果与生成时的意图（牌型 + 点数）不一致的直接丢弃，
//! 所以这里产出的组合一定能被牌型识别原样认出。

use crate::card::{Card, Suit};
use crate::combo::{classify, Category, Combination, RUN_MAX};
use crate::rules::Ruleset;

const BLACK_JOKER: u8 = 16;
const RED_JOKER: u8 = 17;

/// 按点数索引的手牌
pub struct HandIndex<'r> {
    by_value: Vec<Vec<Card>>,
    wilds: Vec<Card>,
    rules: &'r Ruleset,
    len: usize,
}

impl<'r> HandIndex<'r> {
    pub fn new(hand: &[Card], rules: &'r Ruleset) -> HandIndex<'r> {
        let mut by_value = vec![Vec::new(); 18];
        let mut wilds = Vec::new();
        for card in hand {
            if rules.is_wild(card) {
                wilds.push(*card);
            } else {
                by_value[card.value() as usize].push(*card);
            }
        }
        for cards in &mut by_value {
            cards.sort();
        }
        HandIndex { by_value, wilds, rules, len: hand.len() }
    }

    /// 某点数的自然牌张数（不含百搭）
    pub fn count(&self, value: u8) -> usize {
        self.by_value.get(value as usize).map_or(0, Vec::len)
    }

    pub fn wild_count(&self) -> usize {
        self.wilds.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn rules(&self) -> &Ruleset {
        self.rules
    }

    /// 手里有的点数，从小到大
    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        (3..=RED_JOKER).filter(move |v| self.count(*v) > 0)
    }

    pub fn naturals(&self, value: u8) -> &[Card] {
        &self.by_value[value as usize]
    }

    pub fn wild_cards(&self) -> &[Card] {
        &self.wilds
    }

    /// 每个 `(点数, 张数)` 先用自然牌，不足部分合计用百搭补齐
    ///
    /// 王不能由百搭替代；`allow_empty` 为假时每组至少要有一张自然牌（级牌除外）。
    fn fill(&self, groups: &[(u8, usize)], allow_empty: bool) -> Option<Vec<Card>> {
        let level = self.rules.level_value();
        let mut cards = Vec::new();
        let mut deficit = 0usize;
        for &(value, need) in groups {
            let have = self.count(value).min(need);
            if have < need {
                if value >= BLACK_JOKER {
                    return None;
                }
                if have == 0 && !allow_empty && Some(value) != level {
                    return None;
                }
            }
            cards.extend_from_slice(&self.by_value[value as usize][..have]);
            deficit += need - have;
        }
        if deficit > self.wilds.len() {
            return None;
        }
        cards.extend_from_slice(&self.wilds[..deficit]);
        Some(cards)
    }

    /// 挑选带牌：优先孤张、小点数，最后才用王
    fn wings(&self, exclude: &[u8], n: usize, width: usize) -> Option<Vec<Card>> {
        let mut values: Vec<u8> = self
            .values()
            .filter(|v| !exclude.contains(v) && self.count(*v) >= width)
            .filter(|v| width == 1 || *v < BLACK_JOKER)
            .collect();
        values.sort_by_key(|v| (*v >= BLACK_JOKER, self.count(*v) > width, *v));
        if values.len() < n {
            return None;
        }
        Some(values[..n].iter().flat_map(|v| self.by_value[*v as usize][..width].iter().copied()).collect())
    }
}

/// 列出手牌能组成的全部候选牌型
pub fn enumerate(hand: &[Card], rules: &Ruleset) -> Vec<Combination> {
    let index = HandIndex::new(hand, rules);
    enumerate_index(&index)
}

pub(crate) fn enumerate_index(index: &HandIndex) -> Vec<Combination> {
    let mut out = Vec::new();
    singles(index, &mut out);
    same_value_sets(index, &mut out);
    bombs(index, &mut out);
    full_houses(index, &mut out);
    runs(index, &mut out);
    if matches!(index.rules(), Ruleset::Guandan { .. }) {
        flush_runs(index, &mut out);
    } else {
        triples_with_single(index, &mut out);
        planes(index, &mut out);
        fours_with_attachments(index, &mut out);
    }
    out
}

/// 重新识别，确认与意图一致后收入
fn push(out: &mut Vec<Combination>, index: &HandIndex, cards: Vec<Card>, category: Category, primary: u8) {
    if let Some(combo) = classify(&cards, index.rules()) {
        if combo.category == category && combo.primary == primary {
            out.push(combo);
        }
    }
}

fn singles(index: &HandIndex, out: &mut Vec<Combination>) {
    for value in index.values() {
        let card = index.naturals(value)[0];
        push(out, index, vec![card], Category::Single, value);
    }
    // 手里没有自然级牌时，百搭本身也能当级牌单张出
    if let (Some(level), Some(&wild)) = (index.rules().level_value(), index.wild_cards().first()) {
        if index.count(level) == 0 {
            push(out, index, vec![wild], Category::Single, level);
        }
    }
}

fn same_value_sets(index: &HandIndex, out: &mut Vec<Combination>) {
    for value in 3..=RED_JOKER {
        for (n, category) in [(2, Category::Pair), (3, Category::Triple)] {
            if let Some(cards) = index.fill(&[(value, n)], false) {
                push(out, index, cards, category, value);
            }
        }
    }
}

fn bombs(index: &HandIndex, out: &mut Vec<Combination>) {
    for value in 3..=15u8 {
        let reach = index.count(value) + index.wild_count();
        for n in index.rules().bomb_lengths() {
            if n > reach {
                break;
            }
            if let Some(cards) = index.fill(&[(value, n)], false) {
                push(out, index, cards, Category::Bomb(n as u8), value);
            }
        }
    }

    let (black, red) = (index.naturals(BLACK_JOKER), index.naturals(RED_JOKER));
    match index.rules() {
        Ruleset::DouDizhu if !black.is_empty() && !red.is_empty() => {
            push(out, index, vec![black[0], red[0]], Category::Rocket, RED_JOKER);
        }
        Ruleset::Guandan { .. } if black.len() == 2 && red.len() == 2 => {
            let cards = black.iter().chain(red).copied().collect();
            push(out, index, cards, Category::FourJokers, RED_JOKER);
        }
        _ => {}
    }
}

fn full_houses(index: &HandIndex, out: &mut Vec<Combination>) {
    for head in 3..=15u8 {
        if index.count(head) == 0 && index.rules().level_value() != Some(head) {
            continue;
        }
        for tail in 3..=RED_JOKER {
            if tail == head {
                continue;
            }
            if let Some(cards) = index.fill(&[(head, 3), (tail, 2)], false) {
                push(out, index, cards, Category::FullHouse, head);
            }
        }
    }
}

fn triples_with_single(index: &HandIndex, out: &mut Vec<Combination>) {
    for head in index.values().filter(|v| index.count(*v) >= 3) {
        for kicker in index.values().filter(|v| *v != head) {
            let mut cards = index.naturals(head)[..3].to_vec();
            cards.push(index.naturals(kicker)[0]);
            push(out, index, cards, Category::TripleWithSingle, head);
        }
    }
}

/// 顺子、连对、钢板/飞机：枚举每个窗口
fn runs(index: &HandIndex, out: &mut Vec<Combination>) {
    let level = index.rules().level_value();
    for (width, category) in [(1usize, Category::Run), (2, Category::PairRun), (3, Category::Plate)] {
        let min = index.rules().min_groups(width as u8);
        for groups in min..=(RUN_MAX as usize - 2) {
            if groups * width > index.len() {
                break;
            }
            for base in 3..=(RUN_MAX as usize + 1 - groups) {
                let window: Vec<u8> = (base..base + groups).map(|v| v as u8).collect();
                if level.is_some_and(|l| window.contains(&l)) {
                    continue;
                }
                let need: Vec<(u8, usize)> = window.iter().map(|v| (*v, width)).collect();
                if let Some(cards) = index.fill(&need, true) {
                    push(out, index, cards, category, *window.last().unwrap_or(&0));
                }
            }
        }
    }
}

fn flush_runs(index: &HandIndex, out: &mut Vec<Combination>) {
    let level = index.rules().level_value();
    for suit in Suit::NATURAL {
        for base in 3..=(RUN_MAX - 4) {
            let top = base + 4;
            if level.is_some_and(|l| (base..=top).contains(&l)) {
                continue;
            }
            let cards: Option<Vec<Card>> = (base..=top)
                .map(|v| index.naturals(v).iter().find(|c| c.suit == suit).copied())
                .collect();
            if let Some(cards) = cards {
                push(out, index, cards, Category::FlushRun, top);
            }
        }
    }
}

/// 斗地主的飞机带翅膀
fn planes(index: &HandIndex, out: &mut Vec<Combination>) {
    for groups in 2..=(RUN_MAX as usize - 2) {
        for base in 3..=(RUN_MAX as usize + 1 - groups) {
            let window: Vec<u8> = (base..base + groups).map(|v| v as u8).collect();
            if !window.iter().all(|v| index.count(*v) >= 3) {
                continue;
            }
            let top = *window.last().unwrap_or(&0);
            let body: Vec<Card> = window.iter().flat_map(|v| index.naturals(*v)[..3].iter().copied()).collect();

            for (width, category) in [(1, Category::PlaneWithSingles), (2, Category::PlaneWithPairs)] {
                if let Some(wings) = index.wings(&window, groups, width) {
                    let mut cards = body.clone();
                    cards.extend(wings);
                    push(out, index, cards, category, top);
                }
            }
        }
    }
}

fn fours_with_attachments(index: &HandIndex, out: &mut Vec<Combination>) {
    for head in index.values().filter(|v| index.count(*v) == 4) {
        for (width, category) in [(1, Category::FourWithTwo), (2, Category::FourWithPairs)] {
            if let Some(wings) = index.wings(&[head], 2, width) {
                let mut cards = index.naturals(head).to_vec();
                cards.extend(wings);
                push(out, index, cards, category, head);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::Rank::{self, *};
    use crate::card::Suit::*;

    fn cards(layout: &[(Rank, Suit)]) -> Vec<Card> {
        layout.iter().enumerate().map(|(i, &(r, s))| Card::new(i as u16, r, s)).collect()
    }

    fn has(list: &[Combination], category: Category, primary: u8) -> bool {
        list.iter().any(|c| c.category == category && c.primary == primary)
    }

    #[test]
    fn test_enumerate_basic_dou_dizhu() {
        let hand = cards(&[
            (Three, Spade), (Three, Heart), (Three, Club),
            (Four, Spade), (Five, Heart), (Six, Club), (Seven, Diamond),
            (BlackJoker, Joker), (RedJoker, Joker),
        ]);
        let list = enumerate(&hand, &Ruleset::DouDizhu);
        assert!(has(&list, Category::Single, 3));
        assert!(has(&list, Category::Pair, 3));
        assert!(has(&list, Category::Triple, 3));
        assert!(has(&list, Category::TripleWithSingle, 3));
        assert!(has(&list, Category::Run, 7));
        assert!(has(&list, Category::Rocket, 17));
        assert!(!has(&list, Category::Pair, 4));
    }

    #[test]
    fn test_every_candidate_reclassifies() {
        let hand = cards(&[
            (Eight, Spade), (Eight, Heart), (Eight, Club),
            (Nine, Spade), (Nine, Heart), (Nine, Club),
            (Ten, Spade), (Ten, Heart), (Jack, Club), (Jack, Spade),
            (Queen, Diamond), (Two, Spade), (Two, Heart), (Two, Club), (Two, Diamond),
        ]);
        let rules = Ruleset::DouDizhu;
        let list = enumerate(&hand, &rules);
        assert!(has(&list, Category::Plate, 9));
        assert!(has(&list, Category::PlaneWithSingles, 9));
        assert!(has(&list, Category::PlaneWithPairs, 9));
        assert!(has(&list, Category::PairRun, 11));
        assert!(has(&list, Category::Bomb(4), 15));
        assert!(has(&list, Category::FourWithTwo, 15));
        for combo in &list {
            let again = classify(&combo.cards, &rules).unwrap();
            assert_eq!((again.category, again.primary), (combo.category, combo.primary));
        }
    }

    #[test]
    fn test_guandan_wild_assisted_candidates() {
        // 级牌 2，两张红桃 2 是百搭
        let hand = cards(&[
            (Three, Spade), (Four, Club), (Six, Diamond), (Seven, Club),
            (Nine, Spade), (Nine, Club), (Nine, Heart),
            (Two, Heart), (Two, Heart),
        ]);
        let rules = Ruleset::guandan(Two).unwrap();
        let list = enumerate(&hand, &rules);
        assert!(has(&list, Category::Run, 7));
        assert!(has(&list, Category::Bomb(5), 9));
        assert!(has(&list, Category::Bomb(4), 9));
        assert!(has(&list, Category::Pair, 3));
        assert!(has(&list, Category::FullHouse, 9));
        // 没有自然的 2，百搭可以当级牌单张
        assert!(has(&list, Category::Single, 15));
    }

    #[test]
    fn test_guandan_runs_skip_level() {
        let hand = cards(&[(Three, Spade), (Four, Club), (Five, Diamond), (Six, Club), (Seven, Spade), (Eight, Heart)]);
        let rules = Ruleset::guandan(Five).unwrap();
        let list = enumerate(&hand, &rules);
        assert!(!list.iter().any(|c| c.category == Category::Run));
    }

    #[test]
    fn test_guandan_flush_run_candidate() {
        let hand = cards(&[(Six, Club), (Seven, Club), (Eight, Club), (Nine, Club), (Ten, Club), (Ten, Spade)]);
        let rules = Ruleset::guandan(Two).unwrap();
        let list = enumerate(&hand, &rules);
        assert!(has(&list, Category::FlushRun, 10));
        assert!(has(&list, Category::Run, 10));
    }
}
