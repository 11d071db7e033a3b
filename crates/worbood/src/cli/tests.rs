use camino::Utf8PathBuf;
use clap::Parser;
use tempfile::TempDir;
use worboo_config::ConfigFile;
use worboo_primitives::address::PlayerAddress;
use worboo_primitives::record::{GameRecord, TimestampSource};

use super::*;

const REGISTRY: &str = "0x00000000000000000000000000000000000a11ce";

fn home(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join("home")).unwrap()
}

fn parse(args: &[&str]) -> RootCommand {
    RootCommand::try_parse_from(["worbood"].iter().chain(args)).unwrap()
}

fn record(position: u64) -> GameRecord {
    GameRecord {
        player: PlayerAddress::new("0xabc"),
        day_id: position,
        victory: true,
        streak: 1,
        total_games: position,
        total_wins: 1,
        position,
        log_index: Some(0),
        transaction_hash: None,
        timestamp: 0,
        timestamp_source: TimestampSource::Ledger,
    }
}

#[test]
fn test_init_writes_config() {
    let dir = tempfile::tempdir().unwrap();
    let home = home(&dir);

    let command = parse(&[
        "--home",
        home.as_str(),
        "init",
        "--rpc-url",
        "http://127.0.0.1:8545",
        "--registry",
        REGISTRY,
        "--from-block",
        "120",
        "--batch-size",
        "50",
    ]);

    let SubCommands::Init(init) = command.action else {
        panic!("expected init");
    };
    init.run(&command.args).unwrap();

    let config = ConfigFile::load(&home).unwrap();
    assert_eq!(config.ledger.registry, REGISTRY);
    assert_eq!(config.ledger.from_block, 120);
    assert_eq!(config.sync.batch_size, 50);
    assert_eq!(config.cache.path, "leaderboard-cache.json");
}

#[test]
fn test_init_refuses_invalid_registry_and_overwrite() {
    let dir = tempfile::tempdir().unwrap();
    let home = home(&dir);

    let init = |registry: &str, force: bool| {
        let mut args = vec![
            "--home",
            home.as_str(),
            "init",
            "--rpc-url",
            "http://127.0.0.1:8545",
            "--registry",
            registry,
        ];
        if force {
            args.push("--force");
        }

        let command = parse(&args);
        let SubCommands::Init(init) = command.action else {
            panic!("expected init");
        };
        init.run(&command.args)
    };

    assert!(init("0x0000000000000000000000000000000000000000", false).is_err());
    assert!(!ConfigFile::exists(&home));

    init(REGISTRY, false).unwrap();
    assert!(init(REGISTRY, false).is_err());
    init(REGISTRY, true).unwrap();
}

#[test]
fn test_load_config_requires_init() {
    let dir = tempfile::tempdir().unwrap();
    let home = home(&dir);

    let command = parse(&["--home", home.as_str(), "sync"]);

    let err = command.args.load_config().unwrap_err();
    assert!(err.to_string().contains("not initialized"));
}

#[test]
fn test_report_range_filter() {
    let command = parse(&["--home", "/tmp", "report", "--from", "5", "--to", "7"]);

    let SubCommands::Report(report) = command.action else {
        panic!("expected report");
    };

    let included: Vec<u64> = (3..=9)
        .map(record)
        .filter(|record| report.includes(record))
        .map(|record| record.position)
        .collect();

    assert_eq!(included, [5, 6, 7]);
}

#[test]
fn test_output_format_flag() {
    let command = parse(&["--home", "/tmp", "--output-format", "json", "player", "0xABC"]);

    assert!(matches!(command.args.output_format, Format::Json));

    let SubCommands::Player(player) = command.action else {
        panic!("expected player");
    };
    assert_eq!(player.address, "0xABC");
}
