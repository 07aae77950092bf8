use crate::card::Rank;
use thiserror::Error;

/// 规则层的输入错误
///
/// “不成牌型”“压不过”“无牌可出”都不是错误，分别用 `None`、`false`、`Move::Pass` 表示；
/// 这里只收录调用方传入了畸形数据的情况。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("手牌中出现重复的牌 (id = {id})")]
    DuplicateCard { id: u16 },

    #[error("级牌不能是 {0}")]
    InvalidLevel(Rank),

    #[error("无法识别的点数: {0}")]
    UnknownRank(String),

    #[error("座位数不符: 需要 {expected} 个，实际 {found} 个")]
    SeatCount { expected: usize, found: usize },

    #[error("座位 {0} 超出范围")]
    SeatOutOfRange(usize),
}
