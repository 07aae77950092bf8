//! 叫地主时的手牌评分
//!
//! 纯启发式：大牌按张加权，炸弹、三张、大对子额外加分，孤立的小单张扣分。

use crate::card::{value_counts, Card};
use crate::config::BiddingConfig;
use rand::Rng;

/// 每张牌的基础权重，下标为点数
const CARD_WEIGHT: [f64; 18] = [
    0.0, 0.0, 0.0, // 占位
    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, // 3 ~ 10
    0.5, 0.5, // J Q
    1.0, // K
    1.5, // A
    3.0, // 2
    4.0, // 小王
    5.0, // 大王
];

const BOMB_BONUS: f64 = 6.0;
const TRIPLE_BONUS: f64 = 1.0;
const HIGH_TRIPLE_BONUS: f64 = 2.0;
const HIGH_PAIR_BONUS: f64 = 0.5;
const LOOSE_SINGLE_PENALTY: f64 = -0.5;

/// 计算一手牌的强度
pub fn hand_score(hand: &[Card]) -> f64 {
    let counts = value_counts(hand);
    let mut score: f64 = hand.iter().map(|c| CARD_WEIGHT[c.value() as usize]).sum();

    for (value, &count) in counts.iter().enumerate() {
        score += match count {
            0 => 0.0,
            1 if value <= 8 => LOOSE_SINGLE_PENALTY,
            1 => 0.0,
            2 if value >= 12 => HIGH_PAIR_BONUS,
            2 => 0.0,
            3 if value >= 11 => HIGH_TRIPLE_BONUS,
            3 => TRIPLE_BONUS,
            _ => BOMB_BONUS,
        };
    }
    score
}

/// 根据分数决定是否叫地主
pub fn should_claim<R: Rng + ?Sized>(score: f64, config: &BiddingConfig, rng: &mut R) -> bool {
    if score > config.claim_threshold {
        true
    } else if score > config.consider_threshold {
        rng.random_bool(config.claim_probability.clamp(0.0, 1.0))
    } else {
        false
    }
}
