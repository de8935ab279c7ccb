use core::time::Duration;
use std::{path::PathBuf, time::Instant};

use anyhow::{Context as _, Result};
use beacon_api::{BeaconApiClient, Error as ApiError};
use clock::Tick;
use log::{debug, info, warn};
use reqwest::{Client, Url};
use types::{
    config::Config as ChainConfig, containers::ForkChoiceSnapshot, primitives::UnixSeconds,
};

pub struct CollectOptions {
    pub beacon_url: Url,
    pub data_dir: PathBuf,
    pub period: Duration,
    pub interval: Duration,
    pub adjust_delay: Duration,
    pub retry_delay: Duration,
}

/// Polls the beacon node once per `interval` and records one snapshot file per poll.
///
/// Failed polls do not stop the run. A poll that catches the node before it has
/// processed the current slot backs off by `adjust_delay` so the next attempt sees
/// updated fork choice data. Any other failure backs off by `retry_delay`. Time
/// spent in failed polls still counts toward `period`.
pub async fn run(chain_config: &ChainConfig, options: CollectOptions) -> Result<()> {
    let CollectOptions {
        beacon_url,
        data_dir,
        period,
        interval,
        adjust_delay,
        retry_delay,
    } = options;

    let client = BeaconApiClient::new(Client::new(), beacon_url);

    let genesis_time = client
        .genesis_time()
        .await
        .context("failed to fetch genesis time")?;

    fs_err::tokio::create_dir_all(&data_dir).await?;

    info!("collecting fork choice snapshots every {interval:?} for {period:?}");

    let started_at = Instant::now();

    while started_at.elapsed() < period {
        let iteration_started_at = Instant::now();

        match collect_snapshot(&client, chain_config, genesis_time).await {
            Ok(snapshot) => {
                let file_path = data_dir.join(format!(
                    "{}_{}.json",
                    snapshot.current_slot, snapshot.current_time_in_slot,
                ));

                let contents = serde_json::to_string_pretty(&snapshot)?;

                fs_err::tokio::write(file_path, contents).await?;

                info!(
                    "recorded a snapshot of {} blocks at slot {}",
                    snapshot.nodes.len(),
                    snapshot.current_slot,
                );

                tokio::time::sleep(interval.saturating_sub(iteration_started_at.elapsed())).await;
            }
            Err(error) => match error.downcast_ref::<ApiError>() {
                Some(ApiError::ForkChoiceNotUpdated { slot }) => {
                    info!(
                        "fork choice not yet updated for slot {slot}, \
                         retrying in {adjust_delay:?}",
                    );

                    tokio::time::sleep(adjust_delay).await;
                }
                _ => {
                    warn!("failed to collect a snapshot: {error:?}, retrying in {retry_delay:?}");

                    tokio::time::sleep(retry_delay).await;
                }
            },
        }
    }

    info!("collection period of {period:?} elapsed");

    Ok(())
}

async fn collect_snapshot(
    client: &BeaconApiClient,
    chain_config: &ChainConfig,
    genesis_time: UnixSeconds,
) -> Result<ForkChoiceSnapshot> {
    let tick = Tick::current(chain_config, genesis_time)?;
    let head_header = client.head_header().await?;

    if head_header.slot < tick.slot {
        debug!(
            "head header is at slot {} while the wall clock is at slot {}",
            head_header.slot, tick.slot,
        );
    }

    let context = client.fork_choice_context().await?;
    let committee_size = client.committee_size(tick.slot).await?;

    let nodes = context
        .fork_choice_nodes
        .into_iter()
        .map(|node| (node.block_root, node))
        .collect();

    Ok(ForkChoiceSnapshot {
        current_slot: tick.slot,
        current_time_in_slot: tick.time_in_slot,
        justified_checkpoint: context.justified_checkpoint,
        finalized_checkpoint: context.finalized_checkpoint,
        nodes,
        head_root: Some(head_header.root),
        committee_size,
    })
}
