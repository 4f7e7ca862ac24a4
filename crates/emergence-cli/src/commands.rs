use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use emergence_common::{MissingScorePolicy, RankingConfig};
use emergence_ranker::output::{read_ranking, RankingTable};
use emergence_ranker::pipeline;
use emergence_ranker::weights::GainFactors;
use tracing::info;

pub async fn rank(
    config_path: Option<&Path>,
    output_dir: Option<PathBuf>,
    missing_policy: Option<MissingScorePolicy>,
) -> anyhow::Result<()> {
    let mut config = RankingConfig::resolve(config_path).context("loading configuration")?;
    if let Some(dir) = output_dir {
        config.output.dir = dir;
    }
    if let Some(policy) = missing_policy {
        config.scoring.missing_policy = policy;
    }
    info!(
        "Ranking with missing policy `{}`, output to {:?}",
        config.scoring.missing_policy, config.output.dir
    );

    let report = pipeline::run(&config).await.context("ranking run failed")?;
    for path in &report.written {
        println!("{}", path.display());
    }
    Ok(())
}

pub async fn show(table: &Path, top: usize) -> anyhow::Result<()> {
    let table = read_ranking(table)
        .await
        .with_context(|| format!("reading {}", table.display()))?;
    print!("{}", render_top(&table, top));
    Ok(())
}

pub(crate) fn render_top(table: &RankingTable, top: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:>5}  {:>10}  {:>8}  {:>11}  {}", "rank", "taxonKey", "points", "mean_growth", "canonicalName");
    for row in table.rows.iter().take(top) {
        let points = row.points.map(|p| format!("{p:.1}")).unwrap_or_else(|| "NA".to_string());
        let growth = row
            .taxon
            .mean_growth
            .map(|g| format!("{g:.3}"))
            .unwrap_or_else(|| "NA".to_string());
        let _ = writeln!(
            out,
            "{:>5}  {:>10}  {:>8}  {:>11}  {}",
            row.rank,
            row.taxon.taxon_key,
            points,
            growth,
            row.taxon.canonical_name.as_deref().unwrap_or("NA"),
        );
    }
    out
}

pub fn gain_factors(config_path: Option<&Path>) -> anyhow::Result<()> {
    let config = RankingConfig::resolve(config_path).context("loading configuration")?;
    let gains = GainFactors::with_overrides(&config.scoring.gain_factors)?;
    for (column, factor) in gains.iter() {
        println!("{:<28} {factor:.2}", column.name());
    }
    Ok(())
}

pub fn init_config(path: &Path, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    let content = RankingConfig::default().to_toml_string()?;
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote default configuration to {:?}", path);
    Ok(())
}
