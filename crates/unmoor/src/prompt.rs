use colored::Colorize;
use std::io::Write;
use unmoor_core::Environment;

/// 破壊的操作の前の確認プロンプト
///
/// クラウド API には一切触れない。拒否された場合は呼び出し側が
/// 非ゼロ終了する。
pub fn confirm_teardown(env: &Environment) -> anyhow::Result<bool> {
    println!();
    println!(
        "{}",
        "警告: 以下の環境のリソースをすべて削除します。".yellow().bold()
    );
    println!("  環境:       {}", env.name.cyan());
    println!("  リージョン: {}", env.region.cyan());
    println!("  クラスタ:   {}", env.cluster_name().cyan());
    println!("{}", "  データは復旧できません。".yellow());
    print!("続行しますか？ [y/N]: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(is_affirmative(&input))
}

/// "y" / "yes"（大文字小文字不問）だけを承認として扱う
pub fn is_affirmative(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.eq_ignore_ascii_case("y") || trimmed.eq_ignore_ascii_case("yes")
}
