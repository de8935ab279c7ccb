use std::sync::Arc;

use log::info;
use types::config::Config as ChainConfig;

use crate::commands::MonitorCommand;

#[cfg_attr(test, derive(Debug))]
pub struct MonitorConfig {
    pub chain_config: Arc<ChainConfig>,
    pub command: MonitorCommand,
}

impl MonitorConfig {
    pub fn report(&self) {
        let Self {
            chain_config,
            command,
        } = self;

        info!(
            "network: {} with {} preset",
            chain_config.config_name, chain_config.preset_base,
        );

        match command {
            MonitorCommand::Collect {
                beacon_url,
                data_dir,
                period,
                interval,
                ..
            } => {
                info!("collecting snapshots from {beacon_url} into {data_dir:?}");
                info!("collection period: {period} s with a sample every {interval} s");
            }
            MonitorCommand::Analyze {
                data_dir,
                output_dir,
                byzantine_threshold,
                slashing_threshold,
            } => {
                info!("analyzing snapshots in {data_dir:?} into {output_dir:?}");
                info!(
                    "assumed adversarial stake: {byzantine_threshold}% byzantine, \
                     {slashing_threshold}% slashable",
                );
            }
        }
    }
}
