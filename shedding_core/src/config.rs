//! AI 与叫地主的可调参数
//!
//! 这些都是平衡性参数而不是规则，调用方可以从 JSON 中加载覆盖，缺省字段取默认值。

use serde::{Deserialize, Serialize};

/// 出牌 AI 的阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// 任一对手剩余张数不超过该值时进入紧急状态，允许动用炸弹
    pub urgent_opponent_cards: usize,
    /// 自己剩余张数不超过该值时同样视为紧急
    pub urgent_own_cards: usize,
    /// 对手连续出牌达到该次数时拦截
    pub interception_streak: u32,
    /// 全是单张且不超过该张数时，领出最大的单张
    pub endgame_cards: usize,
    /// 手牌多于该张数时，不轻易领出大对子、大三张
    pub large_hand: usize,
    /// 被视为“大牌”的起始点数 (默认 A)
    pub conserve_value: u8,
    /// 掼蛋：队友还剩至少这么多张时，才考虑帮队友接过弱牌
    pub rescue_teammate_cards: usize,
    /// 掼蛋：队友出的非炸弹牌点数不超过该值时算“弱牌”
    pub weak_lead_value: u8,
    /// 掼蛋：任一对手剩余不超过该值时，进入激进炸弹模式
    pub aggressive_owner_cards: usize,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            urgent_opponent_cards: 3,
            urgent_own_cards: 5,
            interception_streak: 3,
            endgame_cards: 3,
            large_hand: 10,
            conserve_value: 14,
            rescue_teammate_cards: 10,
            weak_lead_value: 10,
            aggressive_owner_cards: 6,
        }
    }
}

/// 叫地主阈值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiddingConfig {
    /// 高于该分数一定叫
    pub claim_threshold: f64,
    /// 介于两个阈值之间按概率叫
    pub consider_threshold: f64,
    pub claim_probability: f64,
}

impl Default for BiddingConfig {
    fn default() -> Self {
        BiddingConfig {
            claim_threshold: 12.0,
            consider_threshold: 8.0,
            claim_probability: 0.5,
        }
    }
}
