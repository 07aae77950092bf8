//! 出牌 AI
//!
//! `select_move` 是唯一入口：校验输入，按是否需要领出分派到对应策略，
//! 最后把选中的组合重新识别、重新比较一遍，任何不一致都退化成“过”。

pub mod candidates;
pub mod strategy;

use crate::card::Card;
use crate::combo::{classify, Combination};
use crate::config::AiConfig;
use crate::error::RulesError;
use crate::rules::{beats, validate_hand, Ruleset};
use crate::state::TableView;
use candidates::HandIndex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// AI 的决定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    Play(Combination),
    Pass,
}

impl Move {
    /// 要从手牌中移除的牌
    pub fn cards(&self) -> &[Card] {
        match self {
            Move::Play(combo) => &combo.cards,
            Move::Pass => &[],
        }
    }
}

/// 为 `view.seat` 选择一步
///
/// 上家就是自己（其他人都过了）时按领出处理。
pub fn select_move(hand: &[Card], view: &TableView, rules: &Ruleset, config: &AiConfig) -> Result<Move, RulesError> {
    validate_hand(hand)?;
    view.validate(rules.variant())?;
    if hand.is_empty() {
        return Ok(Move::Pass);
    }

    let index = HandIndex::new(hand, rules);
    let last = view.last.as_ref().filter(|last| last.seat != view.seat);
    let chosen = match last {
        None => strategy::lead(hand, &index, config),
        Some(last) => strategy::follow(hand, &index, view, last, config),
    };

    let Some(combo) = chosen else {
        debug!(seat = view.seat, "没有合适的牌，过");
        return Ok(Move::Pass);
    };

    let reference = last.map(|last| &last.combo);
    if !self_check(hand, &combo, reference, rules) {
        warn!(seat = view.seat, combo = %combo, "选出的牌没有通过自检，改为过");
        return Ok(Move::Pass);
    }
    Ok(Move::Play(combo))
}

/// 选出的牌必须来自手牌、能被原样识别并且压得过上家
fn self_check(hand: &[Card], combo: &Combination, reference: Option<&Combination>, rules: &Ruleset) -> bool {
    let held: HashSet<u16> = hand.iter().map(|c| c.id).collect();
    let mut used = HashSet::with_capacity(combo.len());
    if !combo.cards.iter().all(|c| held.contains(&c.id) && used.insert(c.id)) {
        return false;
    }
    let Some(again) = classify(&combo.cards, rules) else {
        return false;
    };
    again.category == combo.category && again.primary == combo.primary && beats(&again, reference, rules)
}
