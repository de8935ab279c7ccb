use std::path::PathBuf;

use clap::Subcommand;
use reqwest::Url;

#[derive(Clone, Subcommand)]
#[cfg_attr(test, derive(PartialEq, Eq, Debug))]
pub enum MonitorCommand {
    /// Poll a beacon node and record fork choice snapshots
    /// (example: confirmation_monitor collect --beacon-url http://localhost:5052 --data-dir data --period 86400)
    Collect {
        /// Beacon node REST API base URL
        #[clap(long, value_name = "URL")]
        beacon_url: Url,

        /// Directory to write snapshot files to
        #[clap(long, value_name = "DIRECTORY")]
        data_dir: PathBuf,

        /// How long to keep collecting, in seconds of wall clock time
        #[clap(long, value_name = "SECONDS")]
        period: u64,

        /// Target spacing between consecutive samples
        #[clap(long, value_name = "SECONDS", default_value_t = 10)]
        interval: u64,

        /// How long to wait before resampling a slot the fork choice dump has not caught up with
        #[clap(long, value_name = "SECONDS", default_value_t = 2)]
        adjust_delay: u64,

        /// How long to wait before retrying after a failed poll
        #[clap(long, value_name = "SECONDS", default_value_t = 2)]
        retry_delay: u64,
    },

    /// Replay recorded snapshots and report confirmation statistics
    /// (example: confirmation_monitor analyze --data-dir data --output-dir results
    ///  --byzantine-threshold 20 --slashing-threshold 0)
    Analyze {
        /// Directory containing snapshot files produced by collect
        #[clap(long, value_name = "DIRECTORY")]
        data_dir: PathBuf,

        /// Directory to write analysis results to
        #[clap(long, value_name = "DIRECTORY")]
        output_dir: PathBuf,

        /// Assumed upper bound on adversarial stake as an integer percentage
        #[clap(long, value_name = "PERCENT")]
        byzantine_threshold: u64,

        /// Assumed upper bound on adversarial stake willing to be slashed,
        /// as an integer percentage no greater than the byzantine threshold
        #[clap(long, value_name = "PERCENT")]
        slashing_threshold: u64,
    },
}
