use colored::Colorize;
use std::path::Path;
use unmoor_terraform::Terraform;

/// 読み取り専用の事前チェック。破壊的な呼び出しは一切行わない。
pub async fn handle(config_path: &Path, workdir: &Path) -> anyhow::Result<()> {
    println!("{}", "事前チェックを実行します...".blue().bold());

    // 1. 環境定義
    let env = unmoor_core::load_environment(config_path)?;
    println!("  ✓ 環境定義: {} ({})", env.name.cyan(), env.region);
    println!("    クラスタ: {}", env.cluster_name().cyan());

    // 2. AWS 認証
    let sdk_config = unmoor_cloud_aws::load_sdk_config(&env.region).await;
    let identity = unmoor_cloud_aws::check_caller(&sdk_config)
        .await
        .map_err(|e| anyhow::anyhow!("認証に失敗しました: {e}"))?;
    println!("  ✓ AWS 認証: アカウント {}", identity.account_id.cyan());

    // 3. Terraform とワークスペース
    Terraform::check_installed().await?;
    println!("  ✓ terraform が見つかりました");

    let terraform = Terraform::new(workdir);
    match terraform.workspace_exists(&env.name).await {
        Ok(true) => println!("  ✓ ワークスペース: {}", env.name.cyan()),
        Ok(false) => {
            println!(
                "  ⚠ ワークスペース '{}' が見つかりません（未プロビジョニングか、破棄済み）",
                env.name
            );
        }
        Err(e) => {
            // バックエンド未初期化のディレクトリでは workspace list 自体が
            // 失敗する。チェックは読み取り専用なので init はしない。
            println!("  ⚠ ワークスペースを確認できませんでした: {}", e);
        }
    }

    println!();
    println!("{}", "✓ 事前チェックを通過しました".green().bold());
    Ok(())
}
