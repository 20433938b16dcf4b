use crate::prompt;
use crate::report::ConsoleReporter;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use unmoor_cloud_aws::{NodeTerminator, OrphanReclaimer, SweepCounts, TerminationOutcome};
use unmoor_core::{Environment, NodeMode, Stage, StageStatus, WaitConfig};
use unmoor_kube::{DeleteOutcome, Kubectl};
use unmoor_terraform::{InitOutcome, Terraform};

// Terraform 側のリソースアドレス。プロビジョニング定義と対になっている。
const WORKLOAD_TARGET: &str = "kubernetes_deployment.app";
const STORAGE_CLAIM_TARGET: &str = "kubernetes_persistent_volume_claim.data";
const INGRESS_TARGET: &str = "kubernetes_ingress_v1.app";
const KARPENTER_HELM_TARGET: &str = "helm_release.karpenter";
const KARPENTER_MODULE_TARGET: &str = "module.karpenter";

// AWS Load Balancer Controller の admission webhook 名
const LB_WEBHOOK_NAME: &str = "aws-load-balancer-webhook";

pub async fn handle(
    config_path: &Path,
    workdir: &Path,
    karpenter_flag: bool,
    yes: bool,
) -> anyhow::Result<()> {
    println!("{}", "環境のテアダウンを開始します...".yellow().bold());

    // 環境定義の読み込み（この時点ではまだ何にも触れない）
    let env = unmoor_core::load_environment(config_path)?;
    let karpenter = karpenter_flag || env.node_mode == NodeMode::Karpenter;

    println!("  環境:       {}", env.name.cyan());
    println!("  リージョン: {}", env.region.cyan());
    println!("  クラスタ:   {}", env.cluster_name().cyan());
    if karpenter {
        println!("  ノード管理: {}", "karpenter".cyan());
    }

    // 確認はクラウド API を呼ぶより前。拒否なら何も起きていない状態で終了。
    if !yes && !prompt::confirm_teardown(&env)? {
        println!("{}", "キャンセルしました。".yellow());
        std::process::exit(1);
    }

    // AWS 認証チェック（読み取り専用）
    println!();
    println!("{}", "AWS 認証情報を確認中...".blue());
    let sdk_config = unmoor_cloud_aws::load_sdk_config(&env.region).await;
    let identity = unmoor_cloud_aws::check_caller(&sdk_config)
        .await
        .map_err(|e| anyhow::anyhow!("認証に失敗しました: {e}"))?;
    println!("  ✓ アカウント: {}", identity.account_id.cyan());

    // Terraform バックエンド初期化 + ワークスペース選択
    println!();
    println!("{}", "Terraform バックエンドを初期化中...".blue());
    Terraform::check_installed().await?;
    let terraform = Arc::new(Terraform::new(workdir));
    match terraform.init().await? {
        InitOutcome::Clean => println!("  ✓ 初期化完了"),
        InitOutcome::StateChecksumMismatch => {
            // S3/DynamoDB の整合性遅延。既知の挙動なので続行する。
            println!("  ℹ ステートのダイジェスト不整合を検出しました。続行します");
        }
    }
    terraform.select_workspace(&env.name).await?;
    println!("  ✓ ワークスペース: {}", env.name.cyan());

    // ステージ組み立て（順序が正しさの本体。並べ替えは regression）
    let kubectl = Arc::new(Kubectl::new());
    let stages = build_stages(&env, karpenter, &sdk_config, &terraform, &kubectl);

    println!();
    println!(
        "{}",
        format!("テアダウンステージ ({} 個):", stages.len()).bold()
    );
    for stage in &stages {
        println!("  • {}", stage.label().cyan());
    }

    let mut reporter = ConsoleReporter::new();
    let report = unmoor_core::run_teardown(stages, &mut reporter).await?;

    // 孤児リソース掃除（コントローラが消し損ねた LB / TG / SG）
    println!();
    println!("{}", "孤児リソースを掃除中...".blue());
    let reclaimer = OrphanReclaimer::new(&sdk_config, env.cluster_name());
    let sweep = reclaimer.sweep().await;
    print_sweep_line("ロードバランサー", &sweep.load_balancers);
    print_sweep_line("ターゲットグループ", &sweep.target_groups);
    print_sweep_line("セキュリティグループ", &sweep.security_groups);

    println!();
    if report.is_clean() && sweep.total_failed() == 0 {
        println!("{}", "✓ テアダウンが完了しました！".green().bold());
    } else {
        println!(
            "{}",
            "✓ テアダウンが完了しました（警告あり）".green().bold()
        );
        for warning in &report.warnings {
            println!("  ⚠ {}: {}", warning.label, warning.message);
        }
        if sweep.total_failed() > 0 {
            println!(
                "  ⚠ 掃除できなかった孤児リソースが {} 件あります。再実行で解消することがあります",
                sweep.total_failed()
            );
        }
    }

    Ok(())
}

/// テアダウンステージを依存順に組み立てる。
///
/// アプリ層 → プラットフォーム層 → インフラ層の順。クラスタ内コントローラの
/// 非同期削除（LB 解放、ボリューム切り離し）が先に走れるように、所有側の
/// インフラは必ず最後に壊す。
fn build_stages(
    env: &Environment,
    karpenter: bool,
    sdk_config: &unmoor_cloud_aws::SdkConfig,
    terraform: &Arc<Terraform>,
    kubectl: &Arc<Kubectl>,
) -> Vec<Stage> {
    let mut stages = Vec::new();

    if karpenter {
        // Karpenter が直接起動したノードは Terraform ステートの外にいる。
        // 先に止めておかないと後段のクラスタ削除がハングする。
        let terminator = NodeTerminator::new(sdk_config, env.cluster_name());
        stages.push(Stage::best_effort("Karpenter ノードの終了", move || async move {
            match terminator.terminate_and_wait(&WaitConfig::default()).await? {
                TerminationOutcome::NoneFound => Ok(StageStatus::AlreadyAbsent),
                TerminationOutcome::Terminated(_) => Ok(StageStatus::Done),
                TerminationOutcome::TimedOut(count) => Err(anyhow::anyhow!(
                    "{} 台のノードが時間内に terminated になりませんでした",
                    count
                )),
            }
        }));

        let tf = Arc::clone(terraform);
        stages.push(Stage::best_effort("Karpenter Helm リリースの破棄", move || async move {
            tf.destroy_target(KARPENTER_HELM_TARGET).await?;
            Ok(StageStatus::Done)
        }));

        let tf = Arc::clone(terraform);
        stages.push(Stage::best_effort(
            "Karpenter モジュールの破棄（IAM ロール・クラスタ登録を含む）",
            move || async move {
                tf.destroy_target(KARPENTER_MODULE_TARGET).await?;
                Ok(StageStatus::Done)
            },
        ));
    }

    // ワークロードは必須成功。ここで詰まると以降すべてが塞がる。
    let tf = Arc::clone(terraform);
    stages.push(Stage::critical("アプリケーションワークロードの破棄", move || async move {
        tf.destroy_target(WORKLOAD_TARGET).await?;
        Ok(StageStatus::Done)
    }));

    // PVC はワークロード削除のカスケードで既に消えていることがある。
    let tf = Arc::clone(terraform);
    stages.push(Stage::best_effort("永続ストレージクレームの破棄", move || async move {
        tf.destroy_target(STORAGE_CLAIM_TARGET).await?;
        Ok(StageStatus::Done)
    }));

    // Ingress 削除を妨げるものを先に外す: admission webhook と finalizer。
    let kc = Arc::clone(kubectl);
    stages.push(Stage::best_effort("Ingress ブロッカーの解除", move || async move {
        let webhook = kc.delete_validating_webhook(LB_WEBHOOK_NAME).await?;

        let ingresses = kc.list_ingresses().await?;
        let mut stripped = 0;
        for ingress in ingresses.iter().filter(|i| i.has_finalizers()) {
            kc.strip_ingress_finalizers(&ingress.namespace, &ingress.name)
                .await?;
            stripped += 1;
        }

        if webhook == DeleteOutcome::NotFound && stripped == 0 {
            Ok(StageStatus::AlreadyAbsent)
        } else {
            Ok(StageStatus::Done)
        }
    }));

    let tf = Arc::clone(terraform);
    stages.push(Stage::best_effort("Ingress の破棄", move || async move {
        tf.destroy_target(INGRESS_TARGET).await?;
        Ok(StageStatus::Done)
    }));

    // 最終パス。ここが唯一の権威的な全削除で、失敗は致命的。
    let tf = Arc::clone(terraform);
    stages.push(Stage::critical("残りの全リソースの破棄", move || async move {
        tf.destroy_all().await?;
        Ok(StageStatus::Done)
    }));

    stages
}

fn print_sweep_line(kind: &str, counts: &SweepCounts) {
    if counts.found == 0 {
        println!("  ℹ {}: 残存なし", kind);
    } else if counts.failed == 0 {
        println!("  ✓ {}: {} 件を削除しました", kind, counts.deleted);
    } else {
        println!(
            "  ⚠ {}: {} 件中 {} 件を削除（{} 件失敗）",
            kind, counts.found, counts.deleted, counts.failed
        );
    }
}
