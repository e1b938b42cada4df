use clap::{Parser, Subcommand, ValueEnum};
use skip_times::VoteType;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "rewind")]
#[command(about = "Inspect quality ladders, skip times and playback sessions")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 15)]
    pub timeout: u64,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Self-hosted skip-time service to use instead of the public one
    #[arg(long, global = true, env = "REWIND_SKIP_TIMES_INSTANCE")]
    pub instance: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a master playlist and print its quality ladder
    Ladder {
        /// Manifest URL
        url: Url,

        /// Preferred quality label, e.g. "720p"
        #[arg(short, long)]
        preferred: Option<String>,
    },

    /// Resolve the intro/outro skip intervals of an episode
    Skips {
        /// Display title of the series
        title: String,

        /// Episode number or label ("Episode 3")
        episode: String,

        /// Catalog id of the series; nothing is resolved without one
        #[arg(long)]
        catalog_id: Option<i64>,
    },

    /// Vote on a skip interval
    Vote {
        /// Skip id reported by `skips`
        skip_id: String,

        #[arg(value_enum)]
        vote: VoteArg,
    },

    /// Replay a playback session against a simulated media clock
    Simulate(SimulateArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Media or manifest URL
    #[arg(default_value = "https://media.example.org/show/episode-1.mp4")]
    pub source: String,

    #[arg(long, default_value = "Show")]
    pub title: String,

    #[arg(long, default_value = "Episode 1")]
    pub episode: String,

    /// Media duration in seconds
    #[arg(long, default_value_t = 1440.0)]
    pub duration: f64,

    /// Media seconds played per wall-clock second
    #[arg(long, default_value_t = 60.0)]
    pub time_scale: f64,

    /// Intro interval as `start:end` seconds
    #[arg(long, value_parser = parse_interval)]
    pub intro: Option<(f64, f64)>,

    /// Outro interval as `start:end` seconds
    #[arg(long, value_parser = parse_interval)]
    pub outro: Option<(f64, f64)>,

    /// Skip the intro automatically
    #[arg(long)]
    pub auto_skip_intro: bool,

    /// Skip the outro automatically
    #[arg(long)]
    pub auto_skip_outro: bool,

    /// Resolve skip times online for this catalog id instead of the scripted intervals
    #[arg(long)]
    pub catalog_id: Option<i64>,

    /// Resume from this position (seconds)
    #[arg(long)]
    pub resume: Option<f64>,

    /// Playback rate
    #[arg(long, default_value_t = 1.0)]
    pub rate: f32,

    /// Vote on the skipped intervals once the episode ends
    #[arg(long, value_enum)]
    pub vote: Option<VoteArg>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable lines
    Pretty,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VoteArg {
    Up,
    Down,
}

impl From<VoteArg> for VoteType {
    fn from(vote: VoteArg) -> Self {
        match vote {
            VoteArg::Up => VoteType::Upvote,
            VoteArg::Down => VoteType::Downvote,
        }
    }
}

/// Parse a `start:end` pair of seconds.
fn parse_interval(input: &str) -> Result<(f64, f64), String> {
    let (start, end) = input
        .split_once(':')
        .ok_or_else(|| format!("expected start:end, got {input:?}"))?;
    let start: f64 = start
        .trim()
        .parse()
        .map_err(|e| format!("invalid start {start:?}: {e}"))?;
    let end: f64 = end
        .trim()
        .parse()
        .map_err(|e| format!("invalid end {end:?}: {e}"))?;
    if !(start.is_finite() && end.is_finite()) || end <= start || start < 0.0 {
        return Err(format!("invalid interval {input:?}"));
    }
    Ok((start, end))
}
