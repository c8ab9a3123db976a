use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about = "Prepares power plant unit data for the dispatch and investment model", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, global = true, help = "JSON preparation config, defaults are used when omitted")]
    config: Option<String>,

    #[arg(short, long, global = true, default_value = "prepared")]
    out: String,

    #[arg(long, global = true, default_value_t = false, help = "Write results into a timestamped subfolder")]
    timestamped: bool,

    #[arg(long, global = true, default_value_t = false)]
    enable_timing: bool,

    #[arg(long, global = true, help = "Random seed for the k-means initialisation")]
    seed: Option<u64>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Cluster conventional units per group and aggregate each cluster
    Cluster {
        #[arg(short, long)]
        units: String,
    },
    /// Build clustered transformers for the existing renewable fleet
    ResTransformers {
        #[arg(short, long)]
        units: String,
    },
    /// Project LCOE ranges over the configured years
    Lcoe {
        #[arg(long)]
        costs: String,
    },
    /// Synthesize new-build units from projected costs and expansion targets
    NewBuild {
        #[arg(long)]
        costs: String,

        #[arg(short, long)]
        targets: String,

        #[arg(short, long, help = "Raw energy source name, e.g. Wind_Onshore")]
        source: String,

        #[arg(long, help = "Existing new-build table to append to")]
        existing: Option<String>,
    },
}

impl Args {
    pub fn command(&self) -> &Command {
        &self.command
    }

    pub fn config(&self) -> Option<&str> {
        self.config.as_deref()
    }

    pub fn out(&self) -> &str {
        &self.out
    }

    pub fn timestamped(&self) -> bool {
        self.timestamped
    }

    pub fn enable_timing(&self) -> bool {
        self.enable_timing
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_flags_after_subcommand() {
        let args = Args::parse_from([
            "unitprep", "new-build", "--costs", "costs.csv", "--targets", "targets.csv",
            "--source", "Solar", "--seed", "7", "--enable-timing",
        ]);
        assert_eq!(args.seed(), Some(7));
        assert!(args.enable_timing());
        assert_eq!(args.out(), "prepared");
        match args.command() {
            Command::NewBuild { source, existing, .. } => {
                assert_eq!(source, "Solar");
                assert!(existing.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn cluster_requires_units() {
        assert!(Args::try_parse_from(["unitprep", "cluster"]).is_err());
    }
}
