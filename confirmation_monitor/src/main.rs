use core::{future::Future, time::Duration};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Error as ClapError, Parser as _};
use confirmation_rule::RuleConfig;
use log::error;
use tokio::runtime::Builder;
use types::preset::{Mainnet, Minimal, PresetName};

use crate::{
    collect::CollectOptions, commands::MonitorCommand, monitor_args::MonitorArgs,
    monitor_config::MonitorConfig,
};

mod analyze;
mod collect;
mod commands;
mod monitor_args;
mod monitor_config;

fn main() -> ExitCode {
    if let Err(error) = try_main() {
        error.downcast_ref().map(ClapError::exit);
        error!("{error:?}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    binary_utils::initialize_logger(module_path!(), cfg!(feature = "logger-always-write-style"))?;

    let config = MonitorArgs::try_parse()?.into_config();

    config.report();

    let MonitorConfig {
        chain_config,
        command,
    } = config;

    match command {
        MonitorCommand::Collect {
            beacon_url,
            data_dir,
            period,
            interval,
            adjust_delay,
            retry_delay,
        } => {
            let options = CollectOptions {
                beacon_url,
                data_dir,
                period: Duration::from_secs(period),
                interval: Duration::from_secs(interval),
                adjust_delay: Duration::from_secs(adjust_delay),
                retry_delay: Duration::from_secs(retry_delay),
            };

            block_on(collect::run(&chain_config, options))
        }
        MonitorCommand::Analyze {
            data_dir,
            output_dir,
            byzantine_threshold,
            slashing_threshold,
        } => {
            let rule_config = RuleConfig::new(byzantine_threshold, slashing_threshold)
                .map_err(MonitorArgs::clap_error)?;

            match chain_config.preset_base {
                PresetName::Mainnet => {
                    analyze::run::<Mainnet>(chain_config, &data_dir, &output_dir, rule_config)
                }
                PresetName::Minimal => {
                    analyze::run::<Minimal>(chain_config, &data_dir, &output_dir, rule_config)
                }
            }
        }
    }
}

// This is roughly what `#[tokio::main]` expands to.
// See <https://github.com/tokio-rs/tokio/blob/7096a8007502526b23ee1707a6cb37c68c4f0a84/tokio-macros/src/entry.rs#L361-L398>.
fn block_on(future: impl Future<Output = Result<()>>) -> Result<()> {
    Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
