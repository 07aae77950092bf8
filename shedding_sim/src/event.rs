use serde::{Deserialize, Serialize};
use shedding_core::{Card, Combination, Rank, Seat, Variant};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use uuid::Uuid;

pub type TableId = Uuid;

// --- 牌桌 -> 记录 的事件 ---
// 牌桌每次状态改变都会产出事件，模拟器按需写入日志。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum TableEvent {
    /// 新的一局开始，发完牌
    RoundStarted {
        variant: Variant,
        level: Option<Rank>,
        hand_sizes: Vec<usize>,
    },
    /// 某个座位叫/不叫地主
    Bid { seat: Seat, score: f64, claimed: bool },
    /// 地主确定，拿走底牌
    LandlordChosen { seat: Seat, bottom: Vec<Card> },
    /// 出牌
    Played { seat: Seat, combo: Combination, remaining: usize },
    /// 过
    Passed { seat: Seat },
    /// 一轮结束，`next_leader` 获得领出权
    TrickWon { seat: Seat, next_leader: Seat },
    /// 出完手牌，`place` 从 1 开始
    PlayerFinished { seat: Seat, place: usize },
    /// 本局结束
    RoundOver { finish_order: Vec<Seat>, winners: Vec<Seat> },
}

/// 写入日志的一行
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub table_id: TableId,
    pub seq: u64,
    pub event: TableEvent,
}

/// JSON lines 事件日志，不指定路径时什么都不写
pub struct EventLog {
    writer: Option<BufWriter<File>>,
    seq: u64,
}

impl EventLog {
    pub fn disabled() -> EventLog {
        EventLog { writer: None, seq: 0 }
    }

    pub fn create(path: &Path) -> io::Result<EventLog> {
        let file = File::create(path)?;
        Ok(EventLog { writer: Some(BufWriter::new(file)), seq: 0 })
    }

    pub fn record(&mut self, table_id: TableId, events: &[TableEvent]) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Ok(());
        };
        for event in events {
            let record = EventRecord { table_id, seq: self.seq, event: event.clone() };
            serde_json::to_writer(&mut *writer, &record)?;
            writer.write_all(b"\n")?;
            self.seq += 1;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_as_json_line() {
        let record = EventRecord {
            table_id: Uuid::nil(),
            seq: 3,
            event: TableEvent::Passed { seat: 2 },
        };
        let line = serde_json::to_string(&record).unwrap();
        assert!(line.contains("\"Passed\""));
        let back: EventRecord = serde_json::from_str(&line).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_disabled_log_ignores_events() {
        let mut log = EventLog::disabled();
        log.record(Uuid::nil(), &[TableEvent::Passed { seat: 0 }]).unwrap();
        assert_eq!(log.seq, 0);
    }
}
