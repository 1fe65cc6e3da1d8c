use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "drip-doctor",
    about = "Validate Drip SDK operations against a live backend"
)]
pub struct Cli {
    /// Run only checks whose names match (comma-separated, substring match)
    #[arg(long)]
    pub only: Option<String>,

    /// Run quick checks only
    #[arg(long)]
    pub quick: bool,

    /// Show detailed output
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Target environment (reserved)
    #[arg(long)]
    pub env: Option<String>,

    /// Skip cleanup after checks
    #[arg(long)]
    pub no_cleanup: bool,
}
