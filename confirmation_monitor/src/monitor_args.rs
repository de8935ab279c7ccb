use core::fmt::Display;
use std::sync::Arc;

use clap::{error::ErrorKind, Args, CommandFactory as _, Error as ClapError, Parser, ValueEnum};
use types::config::Config as ChainConfig;

use crate::{commands::MonitorCommand, monitor_config::MonitorConfig};

/// Grandine Team <info@grandine.io>
/// Confirmation rule monitor for Ethereum consensus networks
#[derive(Parser)]
#[clap(display_name = "confirmation_monitor", verbatim_doc_comment)]
pub struct MonitorArgs {
    #[clap(flatten)]
    chain_options: ChainOptions,

    #[clap(subcommand)]
    command: MonitorCommand,
}

#[derive(Args)]
struct ChainOptions {
    /// Name of the Eth2 network the beacon node follows
    #[clap(long, value_enum, default_value_t = Network::default())]
    network: Network,
}

#[derive(Clone, Copy, Default, ValueEnum)]
enum Network {
    #[default]
    Mainnet,
    Minimal,
}

impl Network {
    const fn chain_config(self) -> ChainConfig {
        match self {
            Self::Mainnet => ChainConfig::mainnet(),
            Self::Minimal => ChainConfig::minimal(),
        }
    }
}

impl MonitorArgs {
    pub fn into_config(self) -> MonitorConfig {
        let Self {
            chain_options,
            command,
        } = self;

        let ChainOptions { network } = chain_options;

        MonitorConfig {
            chain_config: Arc::new(network.chain_config()),
            command,
        }
    }

    #[must_use]
    pub fn clap_error(message: impl Display) -> ClapError {
        Self::command().error(ErrorKind::ValueValidation, message)
    }
}
