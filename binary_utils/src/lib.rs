use std::io::Write as _;

use anyhow::Result;
use chrono::{Local, SecondsFormat};
use env_logger::{Builder, WriteStyle};
use log::LevelFilter;

pub fn initialize_logger(module_path: &str, always_write_style: bool) -> Result<()> {
    let mut builder = Builder::new();

    builder
        .filter_level(LevelFilter::Warn)
        .filter_module("beacon_api", LevelFilter::Info)
        .filter_module("confirmation_rule", LevelFilter::Info)
        .filter_module(module_path, LevelFilter::Info)
        .filter_module(module_path!(), LevelFilter::Info)
        .format(|formatter, record| {
            let level_style = formatter.default_level_style(record.level());

            writeln!(
                formatter,
                "[{}] {level_style}{:<5}{level_style:#} {}: {}",
                Local::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                record.level(),
                record.target(),
                record.args(),
            )
        })
        .parse_default_env();

    if always_write_style {
        builder.write_style(WriteStyle::Always);
    }

    builder.try_init().map_err(Into::into)
}
