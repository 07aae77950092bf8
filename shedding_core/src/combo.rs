//! 牌型识别
//!
//! 每个规则集有一张按优先级排好的匹配表，从上往下依次尝试，第一个匹配的牌型胜出。
//! 4、5、6、8 张牌在不同牌型之间有歧义（比如四张可以是炸弹也可以是三带一），
//! 歧义完全由表中的顺序决定，所以这个顺序本身就是规则的一部分。
//!
//! 掼蛋的百搭按“缺口”求解：对每个候选形状算出还差几张，
//! 只有缺口正好等于百搭张数时才成立（选中的每一张牌都必须用上）。

use crate::card::{value_counts, Card, Suit, ValueCounts};
use crate::rules::Ruleset;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// 顺子类牌型能到达的最大点数 (A)
pub const RUN_MAX: u8 = 14;
const RUN_MIN: u8 = 3;
const BLACK_JOKER: u8 = 16;
const RED_JOKER: u8 = 17;

/// 牌型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Single,           // 单张
    Pair,             // 对子
    Triple,           // 三张
    TripleWithSingle, // 三带一
    FullHouse,        // 三带二 / 葫芦
    Run,              // 顺子
    PairRun,          // 连对
    Plate,            // 飞机不带 / 钢板
    PlaneWithSingles, // 飞机带单
    PlaneWithPairs,   // 飞机带对
    FourWithTwo,      // 四带二
    FourWithPairs,    // 四带两对
    FlushRun,         // 同花顺
    Bomb(u8),         // n 张炸弹
    FourJokers,       // 四王 / 天王炸
    Rocket,           // 王炸
}

impl Category {
    /// 炸弹类：炸弹、同花顺、四王、王炸
    pub fn is_bomb(&self) -> bool {
        matches!(self, Category::Bomb(_) | Category::FlushRun | Category::FourJokers | Category::Rocket)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Category::Single => write!(f, "单张"),
            Category::Pair => write!(f, "对子"),
            Category::Triple => write!(f, "三张"),
            Category::TripleWithSingle => write!(f, "三带一"),
            Category::FullHouse => write!(f, "三带二"),
            Category::Run => write!(f, "顺子"),
            Category::PairRun => write!(f, "连对"),
            Category::Plate => write!(f, "飞机"),
            Category::PlaneWithSingles => write!(f, "飞机带单"),
            Category::PlaneWithPairs => write!(f, "飞机带对"),
            Category::FourWithTwo => write!(f, "四带二"),
            Category::FourWithPairs => write!(f, "四带两对"),
            Category::FlushRun => write!(f, "同花顺"),
            Category::Bomb(n) => write!(f, "{}张炸弹", n),
            Category::FourJokers => write!(f, "四王"),
            Category::Rocket => write!(f, "王炸"),
        }
    }
}

/// 识别后的牌型
///
/// `primary` 用于同牌型比较（连牌取最高点）；`base` 是连牌的最低点，其它牌型与 `primary` 相同。
/// `cards` 就是组成该牌型的全部牌，按点数升序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combination {
    pub category: Category,
    pub primary: u8,
    pub base: u8,
    pub wilds: u8,
    pub cards: Vec<Card>,
}

impl Combination {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}[", self.category)?;
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", card)?;
        }
        write!(f, "]")
    }
}

/// 匹配器产出的形状，不含具体牌
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shape {
    category: Category,
    primary: u8,
    base: u8,
}

impl Shape {
    fn flat(category: Category, primary: u8) -> Option<Shape> {
        Some(Shape { category, primary, base: primary })
    }
}

/// 匹配用的统计信息
struct Tally {
    /// 非百搭牌按点数计数
    counts: ValueCounts,
    wilds: u8,
    len: usize,
    level: Option<u8>,
    /// 所有牌同一花色（王除外）时的花色
    flush: Option<Suit>,
}

impl Tally {
    fn new(cards: &[Card], rules: &Ruleset) -> Tally {
        let (wild, natural): (Vec<&Card>, Vec<&Card>) = cards.iter().partition(|c| rules.is_wild(c));
        let flush = cards
            .first()
            .map(|c| c.suit)
            .filter(|s| *s != Suit::Joker && cards.iter().all(|c| c.suit == *s));
        Tally {
            counts: value_counts(natural),
            wilds: wild.len() as u8,
            len: cards.len(),
            level: rules.level_value(),
            flush,
        }
    }

    /// 出现过的点数，从大到小
    fn values_desc(&self) -> impl Iterator<Item = u8> + '_ {
        (RUN_MIN..=RED_JOKER).rev().filter(move |v| self.counts[*v as usize] > 0)
    }

    fn count(&self, value: u8) -> u8 {
        self.counts[value as usize]
    }

    fn naturals(&self) -> usize {
        self.len - self.wilds as usize
    }

    /// 只有一种点数时返回该点数
    fn sole_value(&self) -> Option<u8> {
        let mut values = self.values_desc();
        let first = values.next()?;
        values.next().is_none().then_some(first)
    }
}

type Matcher = fn(&Tally) -> Option<Shape>;

/// 斗地主的识别顺序
const DOU_DIZHU_PRIORITY: &[(&str, Matcher)] = &[
    ("rocket", rocket),
    ("bomb", bomb),
    ("single", single),
    ("pair", pair),
    ("triple", triple),
    ("triple_with_single", triple_with_single),
    ("full_house", full_house),
    ("run", run),
    ("pair_run", pair_run),
    ("plate", plate),
    ("plane_with_singles", plane_with_singles),
    ("plane_with_pairs", plane_with_pairs),
    ("four_with_two", four_with_two),
    ("four_with_pairs", four_with_pairs),
];

/// 掼蛋的识别顺序
const GUANDAN_PRIORITY: &[(&str, Matcher)] = &[
    ("four_jokers", four_jokers),
    ("bomb", bomb),
    ("flush_run", flush_run),
    ("single", single),
    ("pair", pair),
    ("triple", triple),
    ("full_house", full_house),
    ("run", run),
    ("pair_run", pair_run),
    ("plate", plate),
];

/// 识别一组牌的牌型，不成牌型时返回 `None`
///
/// 调用方负责保证这些牌来自同一手牌。
pub fn classify(cards: &[Card], rules: &Ruleset) -> Option<Combination> {
    if cards.is_empty() {
        return None;
    }
    let tally = Tally::new(cards, rules);
    let table = match rules {
        Ruleset::DouDizhu => DOU_DIZHU_PRIORITY,
        Ruleset::Guandan { .. } => GUANDAN_PRIORITY,
    };
    let (name, shape) = table.iter().find_map(|(name, matcher)| {
        matcher(&tally)
            .filter(|shape| rules.allows(shape.category) && fits_ruleset(shape, &tally, rules))
            .map(|shape| (*name, shape))
    })?;
    trace!(matcher = name, primary = shape.primary, len = tally.len, "牌型识别");

    let mut cards = cards.to_vec();
    cards.sort();
    Some(Combination {
        category: shape.category,
        primary: shape.primary,
        base: shape.base,
        wilds: tally.wilds,
        cards,
    })
}

/// 斗地主的最短连牌要求与掼蛋不同
fn fits_ruleset(shape: &Shape, tally: &Tally, rules: &Ruleset) -> bool {
    let width = match shape.category {
        Category::Run | Category::FlushRun => 1,
        Category::PairRun => 2,
        Category::Plate => 3,
        _ => return true,
    };
    tally.len / width >= rules.min_groups(width as u8)
}

// --- 匹配器 ---

fn rocket(t: &Tally) -> Option<Shape> {
    if t.len == 2 && t.count(BLACK_JOKER) == 1 && t.count(RED_JOKER) == 1 {
        return Shape::flat(Category::Rocket, RED_JOKER);
    }
    None
}

fn four_jokers(t: &Tally) -> Option<Shape> {
    if t.len == 4 && t.count(BLACK_JOKER) == 2 && t.count(RED_JOKER) == 2 {
        return Shape::flat(Category::FourJokers, RED_JOKER);
    }
    None
}

fn bomb(t: &Tally) -> Option<Shape> {
    if t.len < 4 {
        return None;
    }
    let value = same_value(t, t.len as u8)?;
    Shape::flat(Category::Bomb(t.len as u8), value)
}

fn single(t: &Tally) -> Option<Shape> {
    Shape::flat(Category::Single, same_value(t, 1)?)
}

fn pair(t: &Tally) -> Option<Shape> {
    Shape::flat(Category::Pair, same_value(t, 2)?)
}

fn triple(t: &Tally) -> Option<Shape> {
    Shape::flat(Category::Triple, same_value(t, 3)?)
}

/// 所有牌（加上百搭）凑成同一点数的 `n` 张，返回该点数
///
/// 全是百搭时按级牌本身算；王不能由百搭替代。
fn same_value(t: &Tally, n: u8) -> Option<u8> {
    if t.len != n as usize {
        return None;
    }
    let value = match t.sole_value() {
        Some(v) => v,
        None if t.naturals() == 0 => t.level?,
        None => return None,
    };
    if value >= BLACK_JOKER && t.wilds > 0 {
        return None;
    }
    (t.count(value) + t.wilds == n || (t.naturals() == 0 && t.wilds == n)).then_some(value)
}

fn triple_with_single(t: &Tally) -> Option<Shape> {
    if t.len != 4 {
        return None;
    }
    let head = t.values_desc().find(|v| t.count(*v) == 3)?;
    Shape::flat(Category::TripleWithSingle, head)
}

/// 三带二：头取能成立的最大点数，缺口由百搭补齐
fn full_house(t: &Tally) -> Option<Shape> {
    if t.len != 5 {
        return None;
    }
    let values: Vec<u8> = t.values_desc().collect();
    for head in (RUN_MIN..=15).rev() {
        let have = t.count(head);
        if have > 3 {
            continue;
        }
        // 剩下的自然牌只能是同一个点数，作为对子
        let rest: Vec<u8> = values.iter().copied().filter(|v| *v != head).collect();
        let (tail, tail_have) = match rest.as_slice() {
            [tail] => (*tail, t.count(*tail)),
            _ => continue,
        };
        if tail_have > 2 || (tail >= BLACK_JOKER && tail_have != 2) {
            continue;
        }
        let deficit = (3 - have) + (2 - tail_have);
        if deficit == t.wilds {
            return Shape::flat(Category::FullHouse, head);
        }
    }
    None
}

fn run(t: &Tally) -> Option<Shape> {
    consecutive(t, 1, Category::Run)
}

fn pair_run(t: &Tally) -> Option<Shape> {
    consecutive(t, 2, Category::PairRun)
}

fn plate(t: &Tally) -> Option<Shape> {
    consecutive(t, 3, Category::Plate)
}

/// 同花顺：五张同花、连续、不用百搭
fn flush_run(t: &Tally) -> Option<Shape> {
    if t.len != 5 || t.wilds > 0 || t.flush.is_none() {
        return None;
    }
    consecutive(t, 1, Category::FlushRun)
}

/// 每个点数 `width` 张、点数连续的牌型
///
/// 窗口只能落在 3..=A 之间且不能包含级牌点数；从最高的窗口开始找，
/// 自然牌必须全部落在窗口内，缺口正好由百搭补齐。
fn consecutive(t: &Tally, width: u8, category: Category) -> Option<Shape> {
    if t.len % width as usize != 0 {
        return None;
    }
    let groups = (t.len / width as usize) as u8;
    if groups < 2 || groups > RUN_MAX - RUN_MIN + 1 {
        return None;
    }
    (RUN_MIN..=RUN_MAX + 1 - groups)
        .rev()
        .find(|base| window_fits(t, width, *base, groups))
        .map(|base| Shape { category, primary: base + groups - 1, base })
}

fn window_fits(t: &Tally, width: u8, base: u8, groups: u8) -> bool {
    let top = base + groups - 1;
    if t.level.is_some_and(|level| (base..=top).contains(&level)) {
        return false;
    }
    let mut inside = 0usize;
    let mut deficit = 0u8;
    for value in base..=top {
        let have = t.count(value);
        if have > width {
            return false;
        }
        inside += have as usize;
        deficit += width - have;
    }
    inside == t.naturals() && deficit == t.wilds
}

/// 飞机带单：k 组连续三张 + k 张任意单牌
fn plane_with_singles(t: &Tally) -> Option<Shape> {
    if t.len % 4 != 0 || t.len < 8 {
        return None;
    }
    let groups = (t.len / 4) as u8;
    plane_window(t, groups, |_| true, Category::PlaneWithSingles)
}

/// 飞机带对：k 组连续三张 + k 对，剩下的每个点数都必须是偶数张
fn plane_with_pairs(t: &Tally) -> Option<Shape> {
    if t.len % 5 != 0 || t.len < 10 {
        return None;
    }
    let groups = (t.len / 5) as u8;
    plane_window(t, groups, |rest| rest.iter().all(|c| c % 2 == 0), Category::PlaneWithPairs)
}

fn plane_window(t: &Tally, groups: u8, wings_ok: impl Fn(&ValueCounts) -> bool, category: Category) -> Option<Shape> {
    if groups > RUN_MAX - RUN_MIN + 1 {
        return None;
    }
    for base in (RUN_MIN..=RUN_MAX + 1 - groups).rev() {
        let top = base + groups - 1;
        if (base..=top).all(|v| t.count(v) >= 3) {
            let mut rest = t.counts;
            for v in base..=top {
                rest[v as usize] -= 3;
            }
            if wings_ok(&rest) {
                return Some(Shape { category, primary: top, base });
            }
        }
    }
    None
}

fn four_with_two(t: &Tally) -> Option<Shape> {
    if t.len != 6 {
        return None;
    }
    let head = t.values_desc().find(|v| t.count(*v) == 4)?;
    Shape::flat(Category::FourWithTwo, head)
}

fn four_with_pairs(t: &Tally) -> Option<Shape> {
    if t.len != 8 {
        return None;
    }
    t.values_desc()
        .filter(|v| t.count(*v) == 4)
        .find(|head| {
            let mut rest = t.counts;
            rest[*head as usize] = 0;
            rest.iter().all(|c| c % 2 == 0)
        })
        .and_then(|head| Shape::flat(Category::FourWithPairs, head))
}

// --- 单元测试 ---
