use core::fmt::Write as _;
use std::{
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

use anyhow::{ensure, Context as _, Result};
use confirmation_rule::{Engine, RuleConfig};
use fs_err as fs;
use log::info;
use regex::Regex;
use types::{
    config::Config as ChainConfig,
    containers::ForkChoiceSnapshot,
    preset::Preset,
    primitives::Slot,
};

const SECONDS_PER_MINUTE: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: u64 = 24 * SECONDS_PER_HOUR;

// The collector names files `<slot>_<time_in_slot>.json`. Anything else in the
// data directory is not a snapshot and is skipped.
static FILE_NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)_(\d+)\.json$").expect("file name pattern should be valid"));

struct SnapshotFile {
    slot: Slot,
    time_in_slot: u64,
    path: PathBuf,
}

/// Replays recorded snapshots through a fresh [`Engine`] and persists the results.
///
/// Snapshots are applied in the slot order encoded in their file names. A file that
/// fails to decode or arrives out of order aborts the run. Silently skipping either
/// would bias the statistics.
pub fn run<P: Preset>(
    chain_config: Arc<ChainConfig>,
    data_dir: &Path,
    output_dir: &Path,
    rule_config: RuleConfig,
) -> Result<()> {
    let snapshot_files = discover_snapshot_files(data_dir)?;

    ensure!(
        !snapshot_files.is_empty(),
        "no snapshot files found in {data_dir:?}",
    );

    info!(
        "replaying {} snapshot files from {data_dir:?}",
        snapshot_files.len(),
    );

    let seconds_per_slot = chain_config.seconds_per_slot.get();
    let mut engine = Engine::<P>::new(chain_config, rule_config);

    for file in &snapshot_files {
        let contents = fs::read_to_string(&file.path)?;

        let snapshot = serde_json::from_str::<ForkChoiceSnapshot>(&contents)
            .with_context(|| format!("failed to decode snapshot file {:?}", file.path))?;

        engine
            .update_confirmed_head(&snapshot)
            .with_context(|| format!("failed to apply snapshot file {:?}", file.path))?;
    }

    report_summary(&engine, seconds_per_slot);
    persist_results(&engine, output_dir, rule_config)
}

fn discover_snapshot_files(data_dir: &Path) -> Result<Vec<SnapshotFile>> {
    let mut snapshot_files = vec![];

    for entry in fs::read_dir(data_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();

        let Some((slot, time_in_slot)) = file_name.to_str().and_then(parse_snapshot_file_name)
        else {
            continue;
        };

        snapshot_files.push(SnapshotFile {
            slot,
            time_in_slot,
            path: entry.path(),
        });
    }

    snapshot_files.sort_unstable_by_key(|file| (file.slot, file.time_in_slot));

    Ok(snapshot_files)
}

fn parse_snapshot_file_name(file_name: &str) -> Option<(Slot, u64)> {
    let captures = FILE_NAME_PATTERN.captures(file_name)?;
    let slot = captures.get(1)?.as_str().parse().ok()?;
    let time_in_slot = captures.get(2)?.as_str().parse().ok()?;

    Some((slot, time_in_slot))
}

fn report_summary<P: Preset>(engine: &Engine<P>, seconds_per_slot: u64) {
    let processed_slots = engine.processed_slot_count();
    let confirmation_times = engine.confirmation_times();

    info!("slots processed: {processed_slots}");
    info!("blocks confirmed: {}", confirmation_times.len());

    if let Some(max) = confirmation_times.iter().copied().max() {
        info!(
            "mean confirmation time: {} s",
            format_mean(confirmation_times),
        );
        info!("max confirmation time: {max} s");
    } else {
        info!("no blocks were confirmed during the collection period");
    }

    info!(
        "forked or empty slots: {}",
        engine.empty_or_forked_slots().len(),
    );

    if engine.head_regressions() > 0 {
        info!("confirmed head regressions: {}", engine.head_regressions());
    }

    if engine.confirmed_chain_reorgs() > 0 {
        info!("confirmed chain reorgs: {}", engine.confirmed_chain_reorgs());
    }

    let processed_slots =
        u64::try_from(processed_slots).expect("processed slot count should fit in u64");

    info!(
        "data collection period: {}",
        format_period(seconds_per_slot * processed_slots),
    );
}

fn persist_results<P: Preset>(
    engine: &Engine<P>,
    output_dir: &Path,
    rule_config: RuleConfig,
) -> Result<()> {
    fs::create_dir_all(output_dir)?;

    let byzantine = rule_config.byzantine_threshold();
    let slashing = rule_config.slashing_threshold();

    let confirmation_times_path = output_dir.join(format!("conf_time_{byzantine}_{slashing}.json"));

    fs::write(
        &confirmation_times_path,
        serde_json::to_string(engine.confirmation_times())?,
    )?;

    info!("confirmation times written to {confirmation_times_path:?}");

    let anomalous_slots_path =
        output_dir.join(format!("forked_or_empty_slots_{byzantine}_{slashing}.txt"));

    let mut contents = String::new();

    for slot in engine.empty_or_forked_slots() {
        writeln!(contents, "{slot}")?;
    }

    fs::write(&anomalous_slots_path, contents)?;

    info!("forked or empty slots written to {anomalous_slots_path:?}");

    Ok(())
}

// Samples are whole seconds, so the mean is reported with exactly two
// fractional digits computed without going through floats.
fn format_mean(samples: &[u64]) -> String {
    let sum = samples.iter().sum::<u64>();
    let count = u64::try_from(samples.len()).expect("sample count should fit in u64");

    let whole = sum / count;
    let fraction = sum % count * 100 / count;

    format!("{whole}.{fraction:02}")
}

fn format_period(total_seconds: u64) -> String {
    let days = total_seconds / SECONDS_PER_DAY;
    let hours = total_seconds % SECONDS_PER_DAY / SECONDS_PER_HOUR;
    let minutes = total_seconds % SECONDS_PER_HOUR / SECONDS_PER_MINUTE;

    format!("{days} days {hours} hours {minutes} minutes")
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;
    use test_case::test_case;
    use types::{
        containers::{Checkpoint, ForkChoiceNode},
        preset::Minimal,
        primitives::{Gwei, H256},
    };

    use super::*;

    #[test]
    fn analysis_replays_snapshots_and_writes_results() -> Result<()> {
        let data_dir = TempDir::new()?;
        let output_dir = TempDir::new()?;

        // One block confirmed through finality two seconds into slot 13,
        // with nothing confirmed at slots 11 and 12.
        let base = node(10, 1, 0, 0);

        write_snapshot(data_dir.path(), &snapshot(10, 0, 1, &[base]))?;
        write_snapshot(data_dir.path(), &snapshot(11, 0, 1, &[base]))?;
        write_snapshot(data_dir.path(), &snapshot(12, 0, 1, &[base]))?;
        write_snapshot(
            data_dir.path(),
            &snapshot(13, 2, 4, &[base, node(13, 4, 1, 0)]),
        )?;

        run::<Minimal>(
            Arc::new(ChainConfig::minimal()),
            data_dir.path(),
            output_dir.path(),
            rule_config(),
        )?;

        let confirmation_times =
            fs::read_to_string(output_dir.path().join("conf_time_10_5.json"))?;

        assert_eq!(confirmation_times, "[2]");

        let anomalous_slots =
            fs::read_to_string(output_dir.path().join("forked_or_empty_slots_10_5.txt"))?;

        assert_eq!(anomalous_slots, "11\n12\n");

        Ok(())
    }

    #[test]
    fn snapshot_files_are_discovered_in_slot_order() -> Result<()> {
        let data_dir = TempDir::new()?;

        for file_name in ["10_0.json", "2_5.json", "2_0.json", "10.json", "notes.txt"] {
            fs::write(data_dir.path().join(file_name), "{}")?;
        }

        let snapshot_files = discover_snapshot_files(data_dir.path())?;

        itertools::assert_equal(
            snapshot_files
                .iter()
                .map(|file| (file.slot, file.time_in_slot)),
            [(2, 0), (2, 5), (10, 0)],
        );

        Ok(())
    }

    #[test]
    fn out_of_order_snapshot_files_abort_the_run() -> Result<()> {
        let data_dir = TempDir::new()?;
        let output_dir = TempDir::new()?;

        let base = node(4, 1, 0, 0);

        write_snapshot(data_dir.path(), &snapshot(4, 0, 1, &[base]))?;

        // Misnamed file. The slot in the contents is behind the slot in the name.
        fs::write(
            data_dir.path().join("5_0.json"),
            serde_json::to_string_pretty(&snapshot(3, 0, 1, &[base]))?,
        )?;

        let error = run::<Minimal>(
            Arc::new(ChainConfig::minimal()),
            data_dir.path(),
            output_dir.path(),
            rule_config(),
        )
        .expect_err("snapshots going backwards in time must abort the run");

        assert!(error.to_string().contains("failed to apply snapshot file"));

        Ok(())
    }

    #[test]
    fn corrupt_snapshot_files_abort_the_run() -> Result<()> {
        let data_dir = TempDir::new()?;
        let output_dir = TempDir::new()?;

        fs::write(data_dir.path().join("1_0.json"), "not JSON")?;

        let error = run::<Minimal>(
            Arc::new(ChainConfig::minimal()),
            data_dir.path(),
            output_dir.path(),
            rule_config(),
        )
        .expect_err("undecodable snapshots must abort the run");

        assert!(error.to_string().contains("failed to decode snapshot file"));

        Ok(())
    }

    #[test]
    fn an_empty_data_directory_is_an_error() -> Result<()> {
        let data_dir = TempDir::new()?;
        let output_dir = TempDir::new()?;

        run::<Minimal>(
            Arc::new(ChainConfig::minimal()),
            data_dir.path(),
            output_dir.path(),
            rule_config(),
        )
        .expect_err("there is nothing to analyze in an empty directory");

        Ok(())
    }

    #[test_case("123_4.json" => Some((123, 4)))]
    #[test_case("0_0.json" => Some((0, 0)))]
    #[test_case("123_4.json.bak" => None; "trailing suffix")]
    #[test_case("123.json" => None; "no time in slot")]
    #[test_case("a123_4.json" => None; "leading garbage")]
    #[test_case("99999999999999999999999_0.json" => None; "slot out of range")]
    fn snapshot_file_names_parse_fully_or_not_at_all(file_name: &str) -> Option<(Slot, u64)> {
        parse_snapshot_file_name(file_name)
    }

    #[test_case(0 => "0 days 0 hours 0 minutes")]
    #[test_case(59 => "0 days 0 hours 0 minutes")]
    #[test_case(3600 => "0 days 1 hours 0 minutes")]
    #[test_case(90_061 => "1 days 1 hours 1 minutes")]
    fn period_is_formatted_in_days_hours_and_minutes(total_seconds: u64) -> String {
        format_period(total_seconds)
    }

    #[test_case(&[2] => "2.00")]
    #[test_case(&[1, 2] => "1.50")]
    #[test_case(&[3, 3, 4] => "3.33")]
    fn mean_is_formatted_with_two_fractional_digits(samples: &[u64]) -> String {
        format_mean(samples)
    }

    fn rule_config() -> RuleConfig {
        RuleConfig::new(10, 5).expect("thresholds are within bounds")
    }

    fn node(slot: Slot, root_byte: u8, parent_byte: u8, weight: Gwei) -> ForkChoiceNode {
        ForkChoiceNode {
            slot,
            block_root: H256::repeat_byte(root_byte),
            parent_root: H256::repeat_byte(parent_byte),
            weight,
        }
    }

    fn snapshot(
        current_slot: Slot,
        current_time_in_slot: u64,
        checkpoint_byte: u8,
        nodes: &[ForkChoiceNode],
    ) -> ForkChoiceSnapshot {
        let checkpoint = Checkpoint {
            epoch: 0,
            root: H256::repeat_byte(checkpoint_byte),
        };

        ForkChoiceSnapshot {
            current_slot,
            current_time_in_slot,
            justified_checkpoint: checkpoint,
            finalized_checkpoint: checkpoint,
            nodes: nodes.iter().map(|node| (node.block_root, *node)).collect(),
            head_root: None,
            committee_size: 100,
        }
    }

    fn write_snapshot(data_dir: &Path, snapshot: &ForkChoiceSnapshot) -> Result<()> {
        let file_name = format!(
            "{}_{}.json",
            snapshot.current_slot, snapshot.current_time_in_slot,
        );

        fs::write(
            data_dir.join(file_name),
            serde_json::to_string_pretty(snapshot)?,
        )?;

        Ok(())
    }
}
