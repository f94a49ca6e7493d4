use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dwa", author, version, about = "Distribution waste analyzer", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full waste analysis for one sector
    Analyze {
        /// Path to the snapshot file (.csv or .json)
        #[arg(long)]
        snapshot: PathBuf,
        /// Sector to analyze
        #[arg(long)]
        sector: u64,
        /// Rank the sector against every other active sector
        #[arg(long)]
        compare: bool,
        /// Emit the full result as JSON instead of tables
        #[arg(long)]
        json: bool,
        /// Tariff price per kWh for the financial impact section
        #[arg(long)]
        price: Option<f64>,
        /// Force this meter id as the sector root
        #[arg(long)]
        root_override: Option<u64>,
    },
    /// Re-check the computed waste figures for one sector
    Validate {
        /// Path to the snapshot file (.csv or .json)
        #[arg(long)]
        snapshot: PathBuf,
        /// Sector to validate
        #[arg(long)]
        sector: u64,
    },
    /// List the sectors present in a snapshot
    Sectors {
        /// Path to the snapshot file (.csv or .json)
        #[arg(long)]
        snapshot: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_args() {
        let cli = Cli::parse_from([
            "dwa",
            "analyze",
            "--snapshot",
            "grid.csv",
            "--sector",
            "4",
            "--compare",
            "--price",
            "7200",
        ]);
        match cli.command {
            Commands::Analyze {
                sector,
                compare,
                json,
                price,
                ..
            } => {
                assert_eq!(sector, 4);
                assert!(compare);
                assert!(!json);
                assert_eq!(price, Some(7200.0));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
