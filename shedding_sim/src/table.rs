use crate::event::{TableEvent, TableId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use shedding_core::{
    beats, classify, deal, hand_score, select_move, should_claim, AiConfig, BiddingConfig, Card, Combination,
    LastPlay, Move, RulesError, Ruleset, Seat, Seating, TableView, Variant,
};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

/// 牌桌拒绝一个动作的原因
#[derive(Debug, Error)]
pub enum TableError {
    #[error("还没轮到座位 {0}")]
    NotYourTurn(Seat),
    #[error("当前不在出牌阶段")]
    NotPlaying,
    #[error("出的牌不在手牌中")]
    CardsNotInHand,
    #[error("出的牌不成牌型")]
    InvalidCombination,
    #[error("{0} 压不过上家")]
    IllegalBeat(Combination),
    #[error("需要领出，不能过")]
    MustLead,
    #[error(transparent)]
    Rules(#[from] RulesError),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TablePhase {
    WaitingForDeal,
    Playing,
    RoundOver, // 一局结束
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PlayerAction {
    Play(Vec<Card>), // 出牌
    Pass,            // 过
}

/// 一张牌桌的完整状态（包括所有人的手牌）
#[derive(Debug, Clone)]
pub struct Table {
    pub id: TableId,
    pub rules: Ruleset,
    pub seating: Seating,
    pub hands: Vec<Vec<Card>>,
    pub bottom: Vec<Card>,
    pub phase: TablePhase,
    pub current: Seat, // 当前应该行动的座位
    pub last: Option<LastPlay>,
    pub passes: u32,
    pub streaks: Vec<u32>,
    pub finish_order: Vec<Seat>,
}

impl Table {
    pub fn new(rules: Ruleset) -> Table {
        let players = rules.variant().players();
        Table {
            id: Uuid::new_v4(),
            rules,
            seating: Seating::for_variant(rules.variant(), 0),
            hands: vec![Vec::new(); players],
            bottom: Vec::new(),
            phase: TablePhase::WaitingForDeal,
            current: 0,
            last: None,
            passes: 0,
            streaks: vec![0; players],
            finish_order: Vec::new(),
        }
    }

    pub fn players(&self) -> usize {
        self.hands.len()
    }

    /// 开始新的一局
    ///
    /// - 洗牌、发牌。
    /// - 斗地主：依次评估手牌叫地主，没人叫时分数最高者当地主；地主拿底牌并先出。
    /// - 掼蛋：随机一个座位先出。
    pub fn start_round<R: Rng + ?Sized>(&mut self, bidding: &BiddingConfig, rng: &mut R) -> Vec<TableEvent> {
        let variant = self.rules.variant();
        let dealt = deal(variant, rng);
        self.hands = dealt.hands;
        self.bottom = dealt.bottom;
        self.last = None;
        self.passes = 0;
        self.streaks = vec![0; self.players()];
        self.finish_order.clear();

        let mut events = vec![TableEvent::RoundStarted {
            variant,
            level: self.rules.level(),
            hand_sizes: self.hands.iter().map(Vec::len).collect(),
        }];

        match variant {
            Variant::DouDizhu => {
                let landlord = self.run_bidding(bidding, rng, &mut events);
                let bottom = std::mem::take(&mut self.bottom);
                self.hands[landlord].extend(bottom.iter().copied());
                self.hands[landlord].sort();
                self.seating = Seating::Landlord { landlord };
                self.current = landlord;
                info!(table = %self.id, landlord, "地主确定");
                events.push(TableEvent::LandlordChosen { seat: landlord, bottom });
            }
            Variant::Guandan => {
                self.seating = Seating::Partners;
                self.current = rng.random_range(0..self.players());
            }
        }

        self.phase = TablePhase::Playing;
        events
    }

    fn run_bidding<R: Rng + ?Sized>(&self, config: &BiddingConfig, rng: &mut R, events: &mut Vec<TableEvent>) -> Seat {
        let mut best: Option<(Seat, f64)> = None;
        for (seat, hand) in self.hands.iter().enumerate() {
            let score = hand_score(hand);
            let claimed = should_claim(score, config, rng);
            debug!(seat, score, claimed, "叫地主");
            events.push(TableEvent::Bid { seat, score, claimed });
            if claimed {
                return seat;
            }
            if best.is_none_or(|(_, top)| score > top) {
                best = Some((seat, score));
            }
        }
        best.map_or(0, |(seat, _)| seat)
    }

    /// 由电脑替某个座位决定动作
    pub fn ai_action(&self, seat: Seat, config: &AiConfig) -> Result<PlayerAction, TableError> {
        let view = self.view_for(seat);
        let chosen = select_move(&self.hands[seat], &view, &self.rules, config)?;
        let action = match chosen {
            Move::Play(_) => PlayerAction::Play(chosen.cards().to_vec()),
            Move::Pass => PlayerAction::Pass,
        };
        Ok(action)
    }

    /// 手里最小的一张牌，电脑领出失败时兜底用
    pub fn lowest_card(&self, seat: Seat) -> Option<Card> {
        self.hands[seat].iter().min().copied()
    }

    /// 为某个座位生成桌面快照
    pub fn view_for(&self, seat: Seat) -> TableView {
        TableView {
            seat,
            seating: self.seating,
            remaining: self.hands.iter().map(Vec::len).collect(),
            last: self.last.clone(),
            streaks: self.streaks.clone(),
            passes: self.passes,
        }
    }

    fn is_active(&self, seat: Seat) -> bool {
        !self.hands[seat].is_empty()
    }

    /// 从 `seat` 之后找下一个还有牌的座位
    fn next_active(&self, seat: Seat) -> Seat {
        let n = self.players();
        (1..=n).map(|step| (seat + step) % n).find(|s| self.is_active(*s)).unwrap_or(seat)
    }

    /// 处理单个座位的动作
    ///
    /// 重新校验出牌：必须轮到该座位、牌都在手里、能识别成牌型并且压得过上家。
    /// 校验通过后更新状态，判断本轮是否结束、本局是否结束，并把行动权交给下一位。
    pub fn handle_player_action(&mut self, seat: Seat, action: PlayerAction) -> Result<Vec<TableEvent>, TableError> {
        if self.phase != TablePhase::Playing {
            return Err(TableError::NotPlaying);
        }
        if seat != self.current {
            return Err(TableError::NotYourTurn(seat));
        }

        let mut events = Vec::new();
        match action {
            PlayerAction::Pass => {
                if self.last.is_none() {
                    return Err(TableError::MustLead);
                }
                self.passes += 1;
                events.push(TableEvent::Passed { seat });
            }
            PlayerAction::Play(cards) => {
                let combo = self.validate_play(seat, &cards)?;
                let ids: HashSet<u16> = cards.iter().map(|c| c.id).collect();
                self.hands[seat].retain(|c| !ids.contains(&c.id));

                // 上家被压过，连续出牌次数清零
                if let Some(prev) = &self.last {
                    if prev.seat != seat {
                        self.streaks[prev.seat] = 0;
                    }
                }
                self.streaks[seat] += 1;
                self.passes = 0;

                let remaining = self.hands[seat].len();
                events.push(TableEvent::Played { seat, combo: combo.clone(), remaining });
                self.last = Some(LastPlay { seat, combo });

                if remaining == 0 {
                    self.finish_order.push(seat);
                    events.push(TableEvent::PlayerFinished { seat, place: self.finish_order.len() });
                    if let Some(over) = self.check_round_over() {
                        events.push(over);
                        return Ok(events);
                    }
                }
            }
        }

        self.advance(&mut events);
        Ok(events)
    }

    fn validate_play(&self, seat: Seat, cards: &[Card]) -> Result<Combination, TableError> {
        let held: HashSet<u16> = self.hands[seat].iter().map(|c| c.id).collect();
        let mut used = HashSet::with_capacity(cards.len());
        if cards.is_empty() || !cards.iter().all(|c| held.contains(&c.id) && used.insert(c.id)) {
            return Err(TableError::CardsNotInHand);
        }
        let combo = classify(cards, &self.rules).ok_or(TableError::InvalidCombination)?;
        let reference = self.last.as_ref().map(|last| &last.combo);
        if !beats(&combo, reference, &self.rules) {
            return Err(TableError::IllegalBeat(combo));
        }
        Ok(combo)
    }

    /// 判断本轮是否结束并转移行动权
    fn advance(&mut self, events: &mut Vec<TableEvent>) {
        let Some(owner) = self.last.as_ref().map(|last| last.seat) else {
            self.current = self.next_active(self.current);
            return;
        };
        let contenders = (0..self.players()).filter(|s| *s != owner && self.is_active(*s)).count();

        if self.passes as usize >= contenders {
            let leader = self.trick_leader(owner);
            debug!(table = %self.id, winner = owner, leader, "一轮结束");
            events.push(TableEvent::TrickWon { seat: owner, next_leader: leader });
            self.last = None;
            self.passes = 0;
            self.current = leader;
        } else {
            self.current = self.next_active(self.current);
        }
    }

    /// 一轮的赢家出完了牌时，掼蛋由其队友接风，否则由下家领出
    fn trick_leader(&self, winner: Seat) -> Seat {
        if self.is_active(winner) {
            return winner;
        }
        if self.seating == Seating::Partners {
            let partner = (winner + 2) % self.players();
            if self.is_active(partner) {
                return partner;
            }
        }
        self.next_active(winner)
    }

    /// 斗地主任何人出完即结束；掼蛋一方两人都出完才结束
    fn check_round_over(&mut self) -> Option<TableEvent> {
        let first = *self.finish_order.first()?;
        let over = match self.seating {
            Seating::Landlord { .. } => true,
            Seating::Partners => (0..self.players()).any(|s| {
                (0..self.players()).filter(|p| self.seating.same_side(s, *p)).all(|p| !self.is_active(p))
            }),
        };
        if !over {
            return None;
        }
        // 还没出完的按座位顺序排在最后
        let stragglers: Vec<Seat> = (0..self.players()).filter(|s| !self.finish_order.contains(s)).collect();
        self.finish_order.extend(stragglers);
        let winners = (0..self.players()).filter(|s| self.seating.same_side(first, *s)).collect();
        self.phase = TablePhase::RoundOver;
        info!(table = %self.id, order = ?self.finish_order, "本局结束");
        Some(TableEvent::RoundOver { finish_order: self.finish_order.clone(), winners })
    }
}
