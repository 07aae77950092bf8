use crate::combo::Combination;
use crate::error::RulesError;
use crate::rules::Variant;
use serde::{Deserialize, Serialize};

pub type Seat = usize;

/// 座位与阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Seating {
    /// 斗地主：地主一人一队，其余两人是农民
    Landlord { landlord: Seat },
    /// 掼蛋：对家是队友（0、2 一队，1、3 一队）
    Partners,
}

impl Seating {
    pub fn for_variant(variant: Variant, landlord: Seat) -> Seating {
        match variant {
            Variant::DouDizhu => Seating::Landlord { landlord },
            Variant::Guandan => Seating::Partners,
        }
    }

    /// 两个座位是否同队（同一座位也算）
    pub fn same_side(&self, a: Seat, b: Seat) -> bool {
        match self {
            Seating::Landlord { landlord } => a == b || (a != *landlord && b != *landlord),
            Seating::Partners => a % 2 == b % 2,
        }
    }
}

/// 桌面上最近一次有效出牌
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastPlay {
    pub seat: Seat,
    pub combo: Combination,
}

/// 某个座位做决策时能看到的桌面快照
///
/// 只包含公开信息：各家剩余张数、上家出牌、连续出牌次数和过牌计数。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
    pub seat: Seat,
    pub seating: Seating,
    /// 各座位剩余张数，下标为座位号
    pub remaining: Vec<usize>,
    pub last: Option<LastPlay>,
    /// 各座位连续出牌（中间无人压过）的次数
    pub streaks: Vec<u32>,
    /// 当前牌型出现后的连续过牌数
    pub passes: u32,
}

impl TableView {
    /// 构造一个需要领出的快照
    pub fn leading(seat: Seat, seating: Seating, remaining: Vec<usize>) -> TableView {
        let streaks = vec![0; remaining.len()];
        TableView { seat, seating, remaining, last: None, streaks, passes: 0 }
    }

    /// 在快照上设置要跟的上家牌
    pub fn following(mut self, seat: Seat, combo: Combination) -> TableView {
        self.last = Some(LastPlay { seat, combo });
        self
    }

    pub fn streak(&self, seat: Seat) -> u32 {
        self.streaks.get(seat).copied().unwrap_or(0)
    }

    /// 还有牌的对手
    pub fn opponents(&self) -> impl Iterator<Item = Seat> + '_ {
        (0..self.remaining.len()).filter(move |s| !self.seating.same_side(self.seat, *s) && self.remaining[*s] > 0)
    }

    /// 还有牌的队友（不含自己）
    pub fn teammates(&self) -> impl Iterator<Item = Seat> + '_ {
        (0..self.remaining.len())
            .filter(move |s| *s != self.seat && self.seating.same_side(self.seat, *s) && self.remaining[*s] > 0)
    }

    pub fn min_opponent_cards(&self) -> Option<usize> {
        self.opponents().map(|s| self.remaining[s]).min()
    }

    pub fn is_teammate(&self, seat: Seat) -> bool {
        seat != self.seat && self.seating.same_side(self.seat, seat)
    }

    /// 检查快照的座位数与玩法一致
    pub fn validate(&self, variant: Variant) -> Result<(), RulesError> {
        let expected = variant.players();
        if self.remaining.len() != expected {
            return Err(RulesError::SeatCount { expected, found: self.remaining.len() });
        }
        if self.seat >= expected {
            return Err(RulesError::SeatOutOfRange(self.seat));
        }
        if let Some(last) = &self.last {
            if last.seat >= expected {
                return Err(RulesError::SeatOutOfRange(last.seat));
            }
        }
        if let Seating::Landlord { landlord } = self.seating {
            if landlord >= expected {
                return Err(RulesError::SeatOutOfRange(landlord));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landlord_sides() {
        let seating = Seating::Landlord { landlord: 1 };
        assert!(seating.same_side(0, 2));
        assert!(!seating.same_side(0, 1));
        assert!(seating.same_side(1, 1));
    }

    #[test]
    fn test_partner_sides() {
        let seating = Seating::Partners;
        assert!(seating.same_side(0, 2));
        assert!(seating.same_side(1, 3));
        assert!(!seating.same_side(0, 3));
    }

    #[test]
    fn test_opponents_skip_finished_players() {
        let view = TableView::leading(0, Seating::Partners, vec![5, 0, 7, 2]);
        assert_eq!(view.opponents().collect::<Vec<_>>(), vec![3]);
        assert_eq!(view.teammates().collect::<Vec<_>>(), vec![2]);
        assert_eq!(view.min_opponent_cards(), Some(2));
        assert!(view.is_teammate(2));
        assert!(!view.is_teammate(0));
    }

    #[test]
    fn test_validate_seat_count() {
        let view = TableView::leading(0, Seating::Partners, vec![5, 5, 5]);
        assert_eq!(view.validate(Variant::Guandan), Err(RulesError::SeatCount { expected: 4, found: 3 }));
        let view = TableView::leading(3, Seating::Landlord { landlord: 0 }, vec![5, 5, 5]);
        assert_eq!(view.validate(Variant::DouDizhu), Err(RulesError::SeatOutOfRange(3)));
    }
}
