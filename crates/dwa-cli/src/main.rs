use clap::Parser;
use dwa_core::{AnalysisConfig, MeterId, SectorId};
use dwa_engine::{builder, validate, waste, SectorAnalysisResult, SectorAnalyzer};
use dwa_io::{import_csv_path, import_json_path, ImportReport, MemoryStore};
use std::io::{self, Write};
use std::path::Path;
use tabwriter::TabWriter;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

mod cli;

use cli::{Cli, Commands};

fn load_snapshot(path: &Path) -> anyhow::Result<MemoryStore> {
    let is_csv = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        .unwrap_or(false);
    let (records, report): (_, ImportReport) = if is_csv {
        import_csv_path(path)?
    } else {
        import_json_path(path)?
    };
    info!("imported {}: {}", path.display(), report.summary());
    for issue in &report.diagnostics.issues {
        warn!("{}", issue);
    }
    Ok(MemoryStore::new(records)?)
}

fn run_analyze(
    snapshot: &Path,
    sector: u64,
    compare: bool,
    json: bool,
    price: Option<f64>,
    root_override: Option<u64>,
) -> anyhow::Result<()> {
    let store = load_snapshot(snapshot)?;
    let sector = SectorId::new(sector);

    let mut config = AnalysisConfig::default();
    if let Some(price) = price {
        config = config.with_price(price);
    }
    if let Some(root) = root_override {
        config = config.with_root_override(sector, MeterId::new(root));
    }

    let analyzer = SectorAnalyzer::new(config);
    let result = if compare {
        analyzer.analyze_with_comparison(&store, sector)?
    } else {
        analyzer.analyze(&store, sector)?
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_analysis(&result)?;
    }
    Ok(())
}

fn print_analysis(result: &SectorAnalysisResult) -> anyhow::Result<()> {
    let summary = &result.summary;
    println!("Sector {} analysis", result.sector);
    println!(
        "  Nodes: {} generators, {} boxes, {} meters, {} customers",
        summary.generator_count,
        summary.box_count,
        summary.meter_count,
        summary.customer_count
    );
    println!(
        "  Network efficiency: {:.1}% ({})",
        summary.network_efficiency_pct, summary.health
    );
    println!(
        "  Network loss: {:.1} kWh ({:.1}%) over {} customers",
        result.waste.network_loss.loss_kwh,
        result.waste.network_loss.loss_pct,
        result.waste.network_loss.customer_count
    );
    println!(
        "  Pre-distribution waste: {:.1} kWh ({:.1}%)",
        summary.breakdown.pre_distribution_waste_kwh, summary.breakdown.pre_distribution_waste_pct
    );

    println!("\nDistribution boxes");
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "ID\tNAME\tLEVEL\tOWN kWh\tCHILDREN kWh\tWASTE kWh\tWASTE %\tSTATUS")?;
    for row in &result.waste.boxes.rows {
        let record = &row.record;
        writeln!(
            writer,
            "{}\t{}\t{}\t{:.1}\t{:.1}\t{:.1}\t{:.1}\t{}",
            row.id,
            row.name,
            row.level,
            record.own_withdrawal,
            record.children_sum,
            record.waste_amount,
            record.waste_pct,
            record.status
        )?;
    }
    let totals = &result.waste.boxes.totals;
    writeln!(
        writer,
        "TOTAL\t\t\t{:.1}\t{:.1}\t{:.1}\t\t{:.1}% eff",
        totals.total_withdrawal_kwh,
        totals.total_children_kwh,
        totals.total_absolute_waste_kwh,
        totals.overall_efficiency_pct
    )?;
    writer.flush()?;

    println!("\nMain meters");
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "ID\tNAME\tBOX\tCUSTOMERS\tOWN kWh\tWASTE kWh\tWASTE %\tSTATUS")?;
    for row in &result.waste.meters.rows {
        let record = &row.record;
        writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{:.1}\t{:.1}\t{:.1}\t{}",
            row.id,
            row.name,
            row.parent_box.as_deref().unwrap_or("-"),
            row.customer_count,
            record.own_withdrawal,
            record.waste_amount,
            record.waste_pct,
            record.status
        )?;
    }
    writer.flush()?;

    println!("\nFinancial impact (at {:.2}/kWh)", result.financial.price_per_kwh);
    println!("  Daily:   {:.0}", result.financial.daily_cost);
    println!("  Monthly: {:.0}", result.financial.monthly_cost);
    println!("  Annual:  {:.0}", result.financial.annual_cost);

    println!("\nForecast");
    for point in &result.forecast.points {
        println!(
            "  {}: {:.1}% efficiency, {} customers",
            point.horizon, point.efficiency_pct, point.projected_customers
        );
    }
    for warning in &result.forecast.warnings {
        println!("  warning: {}", warning);
    }

    if let Some(comparison) = &result.comparison {
        println!("\nSector ranking");
        let mut writer = TabWriter::new(io::stdout());
        writeln!(writer, "RANK\tSECTOR\tEFFICIENCY %\tLOSS %")?;
        for standing in &comparison.rankings {
            writeln!(
                writer,
                "{}\t{}\t{:.1}\t{:.1}",
                standing.rank, standing.sector, standing.network_efficiency_pct, standing.loss_pct
            )?;
        }
        writer.flush()?;
        for excluded in &comparison.excluded {
            println!("  sector {} excluded: {}", excluded.sector, excluded.reason);
        }
        for gap in &comparison.benchmark_gaps {
            println!(
                "  gap to {:.0}% target ({:.0}% loss tier): {:+.1}%",
                gap.tier.target_efficiency_pct, gap.tier.max_loss_pct, gap.gap_pct
            );
        }
    }

    if !result.actions.is_empty() {
        println!("\nAction plan");
        let mut writer = TabWriter::new(io::stdout());
        writeln!(writer, "PRIORITY\tACTION\tSAVING kWh\tTIMELINE\tROLE")?;
        for action in &result.actions {
            let saving = action
                .estimated_saving_kwh
                .map(|kwh| format!("{:.1}", kwh))
                .unwrap_or_else(|| "-".to_string());
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                action.priority, action.description, saving, action.timeline, action.role
            )?;
        }
        writer.flush()?;
    }

    println!(
        "\nValidation: {} ({} high, {} medium)",
        result.validation.status, result.validation.high_count, result.validation.medium_count
    );
    if result.diagnostics.has_issues() {
        println!("Diagnostics: {}", result.diagnostics.summary());
    }
    Ok(())
}

fn run_validate(snapshot: &Path, sector: u64) -> anyhow::Result<()> {
    let store = load_snapshot(snapshot)?;
    let sector = SectorId::new(sector);
    let config = AnalysisConfig::default();

    // Only the stages the re-check needs: build, compute, validate.
    let outcome = builder::build(&store, sector, &config)?;
    let waste = waste::compute(&outcome.hierarchy, &config);
    let validation = validate::validate(&outcome.hierarchy, &waste);

    println!("Validation for sector {}: {}", sector, validation.status);
    if validation.issues.is_empty() {
        return Ok(());
    }
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "METER\tNAME\tSEVERITY\tDETAIL")?;
    for issue in &validation.issues {
        writeln!(
            writer,
            "{}\t{}\t{}\t{}",
            issue.meter, issue.name, issue.severity, issue.detail
        )?;
    }
    writer.flush()?;
    Ok(())
}

fn run_sectors(snapshot: &Path) -> anyhow::Result<()> {
    let store = load_snapshot(snapshot)?;
    let mut writer = TabWriter::new(io::stdout());
    writeln!(writer, "SECTOR\tRECORDS")?;
    for (sector, count) in store.sector_counts() {
        writeln!(writer, "{}\t{}", sector, count)?;
    }
    writer.flush()?;
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so that `--json` output stays parseable.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let result = match &cli.command {
        Commands::Analyze {
            snapshot,
            sector,
            compare,
            json,
            price,
            root_override,
        } => run_analyze(snapshot, *sector, *compare, *json, *price, *root_override),
        Commands::Validate { snapshot, sector } => run_validate(snapshot, *sector),
        Commands::Sectors { snapshot } => run_sectors(snapshot),
    };

    if let Err(err) = result {
        error!("{:#}", err);
        std::process::exit(1);
    }
}
