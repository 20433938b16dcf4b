use colored::Colorize;
use unmoor_core::{Criticality, Reporter, StageStatus};

/// ステージ進捗をコンソールに表示する Reporter 実装
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn stage_started(&mut self, index: usize, total: usize, label: &str) {
        println!();
        println!(
            "{}",
            format!("【Step {}/{}】{}...", index, total, label)
                .yellow()
                .bold()
        );
    }

    fn stage_completed(&mut self, _index: usize, _label: &str, status: StageStatus) {
        match status {
            StageStatus::Done => println!("  ✓ 完了"),
            StageStatus::AlreadyAbsent => println!("  ℹ 既に削除されています"),
        }
    }

    fn stage_failed(
        &mut self,
        _index: usize,
        _label: &str,
        criticality: Criticality,
        message: &str,
    ) {
        match criticality {
            Criticality::BestEffort => {
                println!("  ⚠ 失敗しましたが続行します: {}", message);
            }
            Criticality::Critical => {
                println!("  {} {}", "✗".red().bold(), format!("失敗: {}", message).red());
            }
        }
    }
}
