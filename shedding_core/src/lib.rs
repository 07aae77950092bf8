//! # 出牌类扑克规则与 AI 核心库
//!
//! 这个 `core` crate 实现斗地主（三人）和掼蛋（四人）的规则层：
//! 牌型识别、大小比较、叫地主时的手牌评分，以及电脑玩家的出牌选择。
//! 它不持有任何牌局状态，所有函数都是对传入数据的纯计算，
//! 可以被模拟器、服务器或客户端直接复用。

pub mod ai;
mod card;
mod combo;
mod config;
mod error;
mod rules;
mod state;
mod strength;

pub use ai::{select_move, Move};

pub use card::*;

pub use combo::*;

pub use config::*;

pub use error::*;

pub use rules::*;

pub use state::*;

pub use strength::*;
