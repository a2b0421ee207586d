use std::path::PathBuf;

use clap::Parser;
use gramatch_common::{Config, ConfigError, DedupeMode};

/// gramatch - match graph-transformation patterns against synthetic host graphs
#[derive(Parser, Debug)]
#[command(name = "gramatch")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Canned pattern to match
    #[arg(short = 'p', long, value_enum, default_value = "edge")]
    pub pattern: PatternArg,

    /// Number of person nodes in each host graph
    #[arg(short = 'n', long, default_value_t = 200)]
    pub nodes: usize,
    /// Outgoing `knows` edges per person
    #[arg(short = 'd', long, default_value_t = 3)]
    pub degree: usize,
    /// Number of host graphs, searched in parallel when more than one
    #[arg(long, default_value_t = 1)]
    pub hosts: usize,

    /// JSON match configuration; flags below override it
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,
    /// Allow distinct pattern nodes to share a host node
    #[arg(long, default_value_t = false)]
    pub non_injective: bool,
    /// Report duplicate matches
    #[arg(long, default_value_t = false)]
    pub no_dedupe: bool,
    /// Labels to match as early as possible
    #[arg(long, value_delimiter = ',')]
    pub rare: Vec<String>,

    /// Print at most this many matches
    #[arg(short = 'l', long, default_value_t = 5)]
    pub limit: usize,
}

impl Args {
    /// Merge the configuration file with the command-line switches.
    pub fn to_config(&self) -> Result<Config, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => Config::from_json_str(&std::fs::read_to_string(path)?)?,
            None => Config::default(),
        };
        if self.non_injective {
            config.injective = false;
        }
        if self.no_dedupe {
            config.dedupe = DedupeMode::None;
        }
        if !self.rare.is_empty() {
            config.rare_labels.clone_from(&self.rare);
        }
        if let Some(label) = config.rare_labels.iter().find(|l| config.common_labels.contains(l)) {
            return Err(ConfigError::ConflictingPriority(label.clone()).into());
        }
        Ok(config)
    }
}

/// Canned patterns over the synthetic social graph
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PatternArg {
    /// Two persons joined by `knows`
    #[value(name = "edge")]
    Edge,
    /// Three persons knowing each other in a cycle
    #[value(name = "triangle")]
    Triangle,
    /// Persons that know nobody older than themselves
    #[value(name = "eldest")]
    Eldest,
    /// Persons reachable over one or more `knows` steps
    #[value(name = "reach")]
    Reach,
    /// Persons with their number of acquaintances and summed ages
    #[value(name = "popular")]
    Popular,
}
