mod event;
mod table;

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use event::{EventLog, TableEvent};
use shedding_core::{AiConfig, BiddingConfig, Rank, Ruleset, Seat, Seating};
use table::{PlayerAction, Table, TableError, TablePhase};

#[derive(Parser)]
#[command(name = "shedding-sim")]
#[command(about = "斗地主 / 掼蛋 电脑自对局模拟")]
struct Args {
    /// 玩法
    #[arg(long, value_enum, default_value = "dou-dizhu")]
    variant: VariantArg,

    /// 模拟的局数
    #[arg(short, long, default_value = "1")]
    games: u32,

    /// 随机种子，不指定时随机生成并打印出来
    #[arg(long)]
    seed: Option<u64>,

    /// 掼蛋的级牌 (3..10, J, Q, K, A, 2)
    #[arg(long, default_value = "2")]
    level: Rank,

    /// JSON 配置文件，包含 `ai` 与 `bidding` 两部分
    #[arg(long)]
    config: Option<PathBuf>,

    /// 事件日志输出路径 (JSON lines)
    #[arg(long)]
    events: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    verbose: bool,

    /// 逐手显示出牌过程
    #[arg(long)]
    show: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VariantArg {
    DouDizhu,
    Guandan,
}

/// 模拟器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct SimConfig {
    ai: AiConfig,
    bidding: BiddingConfig,
    /// 单局最多行动次数，超过后放弃该局
    max_turns: usize,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            ai: AiConfig::default(),
            bidding: BiddingConfig::default(),
            max_turns: 2000,
        }
    }
}

impl SimConfig {
    fn load(path: Option<&Path>) -> Result<SimConfig, Box<dyn Error>> {
        let Some(path) = path else {
            return Ok(SimConfig::default());
        };
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// 一局的结果
#[derive(Debug, Clone, Default)]
struct RoundResult {
    winners: Vec<Seat>,
    landlord: Option<Seat>,
    turns: usize,
    bombs: usize,
    completed: bool,
}

/// 多局汇总
#[derive(Debug, Default)]
struct Summary {
    games: u32,
    completed: u32,
    wins: Vec<u32>,
    landlord_wins: u32,
    turns: usize,
    bombs: usize,
}

impl Summary {
    fn new(players: usize) -> Summary {
        Summary { wins: vec![0; players], ..Summary::default() }
    }

    fn add(&mut self, result: &RoundResult) {
        self.games += 1;
        self.turns += result.turns;
        self.bombs += result.bombs;
        if !result.completed {
            return;
        }
        self.completed += 1;
        for seat in &result.winners {
            self.wins[*seat] += 1;
        }
        if result.landlord.is_some_and(|l| result.winners.contains(&l)) {
            self.landlord_wins += 1;
        }
    }

    fn print(&self, seed: u64, rules: &Ruleset) {
        let games = self.games.max(1) as f64;
        println!("种子: {}", seed);
        println!("局数: {} (完成 {})", self.games, self.completed);
        for (seat, wins) in self.wins.iter().enumerate() {
            println!("座位 {} 胜: {} ({:.1}%)", seat, wins, *wins as f64 * 100.0 / games);
        }
        if *rules == Ruleset::DouDizhu {
            println!("地主胜: {} ({:.1}%)", self.landlord_wins, self.landlord_wins as f64 * 100.0 / games);
        }
        println!("平均行动次数: {:.1}", self.turns as f64 / games);
        println!("平均炸弹数: {:.2}", self.bombs as f64 / games);
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    // 默认只显示警告；RUST_LOG 优先
    let default_level = if args.verbose {
        "debug"
    } else if args.show {
        "info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = SimConfig::load(args.config.as_deref())?;
    let rules = match args.variant {
        VariantArg::DouDizhu => Ruleset::DouDizhu,
        VariantArg::Guandan => Ruleset::guandan(args.level)?,
    };
    let seed = args.seed.unwrap_or_else(|| rand::rng().random());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut log = match &args.events {
        Some(path) => EventLog::create(path)?,
        None => EventLog::disabled(),
    };
    info!(seed, ?rules, games = args.games, "开始模拟");

    let mut summary = Summary::new(rules.variant().players());
    for game in 0..args.games {
        let mut table = Table::new(rules);
        let result = play_round(&mut table, &config, &mut rng, &mut log)?;
        info!(game, table = %table.id, turns = result.turns, winners = ?result.winners, "对局结束");
        summary.add(&result);
    }
    log.flush()?;
    summary.print(seed, &rules);
    Ok(())
}

/// 让电脑打完一局
///
/// 电脑的动作同样要经过牌桌校验；被拒绝时领出改为出最小的一张，跟牌改为过。
fn play_round(table: &mut Table, config: &SimConfig, rng: &mut StdRng, log: &mut EventLog) -> Result<RoundResult, Box<dyn Error>> {
    let events = table.start_round(&config.bidding, rng);
    log.record(table.id, &events)?;

    let landlord = match table.seating {
        Seating::Landlord { landlord } => Some(landlord),
        Seating::Partners => None,
    };
    let mut result = RoundResult { landlord, ..RoundResult::default() };

    while table.phase == TablePhase::Playing {
        if result.turns >= config.max_turns {
            warn!(table = %table.id, turns = result.turns, "超过最大行动次数，放弃本局");
            return Ok(result);
        }
        let seat = table.current;
        let action = table.ai_action(seat, &config.ai)?;
        let events = match table.handle_player_action(seat, action) {
            Ok(events) => events,
            Err(
                err @ (TableError::MustLead
                | TableError::IllegalBeat(_)
                | TableError::InvalidCombination
                | TableError::CardsNotInHand),
            ) => {
                warn!(seat, %err, "电脑的动作被拒绝，改用兜底动作");
                let fallback = match (&table.last, table.lowest_card(seat)) {
                    (None, Some(card)) => PlayerAction::Play(vec![card]),
                    _ => PlayerAction::Pass,
                };
                table.handle_player_action(seat, fallback)?
            }
            Err(err) => return Err(err.into()),
        };

        for event in &events {
            match event {
                TableEvent::Played { seat, combo, remaining } => {
                    if combo.category.is_bomb() {
                        result.bombs += 1;
                    }
                    info!(seat, remaining, "出牌 {}", combo);
                }
                TableEvent::Passed { seat } => info!(seat, "过"),
                TableEvent::RoundOver { winners, .. } => {
                    result.winners = winners.clone();
                    result.completed = true;
                }
                _ => {}
            }
        }
        log.record(table.id, &events)?;
        result.turns += 1;
    }
    Ok(result)
}
