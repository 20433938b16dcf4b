mod commands;
mod prompt;
mod report;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "unmoor")]
#[command(about = "積み上げた環境を、順番どおりに畳む。", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 環境を解体（順序つきテアダウン + 孤児リソース掃除）
    Down {
        /// 環境定義ファイル (KDL)
        #[arg(short = 'c', long = "config", env = "UNMOOR_CONFIG")]
        config: PathBuf,
        /// Terraform の作業ディレクトリ
        #[arg(short = 'w', long, default_value = ".")]
        workdir: PathBuf,
        /// Karpenter 変種（オートスケーラ解体の追加ステージを実行）
        #[arg(long)]
        karpenter: bool,
        /// 確認プロンプトをスキップ
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// 事前チェック（読み取り専用: 設定・認証・ワークスペース）
    Check {
        /// 環境定義ファイル (KDL)
        #[arg(short = 'c', long = "config", env = "UNMOOR_CONFIG")]
        config: PathBuf,
        /// Terraform の作業ディレクトリ
        #[arg(short = 'w', long, default_value = ".")]
        workdir: PathBuf,
    },
    /// バージョン情報を表示
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 進捗は stdout、診断ログは stderr に分ける
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Down {
            config,
            workdir,
            karpenter,
            yes,
        } => {
            commands::down::handle(&config, &workdir, karpenter, yes).await?;
        }
        Commands::Check { config, workdir } => {
            commands::check::handle(&config, &workdir).await?;
        }
        Commands::Version => {
            println!("unmoor {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
