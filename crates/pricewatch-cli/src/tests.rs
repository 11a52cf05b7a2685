use super::*;

#[test]
fn parses_db_ping_command() {
    let cli =
        Cli::try_parse_from(["pricewatch-cli", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["pricewatch-cli", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn parses_db_seed_command() {
    let cli =
        Cli::try_parse_from(["pricewatch-cli", "db", "seed"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Seed
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["pricewatch-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn collect_without_filter_covers_all_stores() {
    let cli = Cli::try_parse_from(["pricewatch-cli", "collect"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Collect {
            store: None,
            dry_run: false
        })
    ));
}

#[test]
fn collect_with_store_and_dry_run() {
    let cli = Cli::try_parse_from(["pricewatch-cli", "collect", "--store", "spar", "--dry-run"])
        .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Collect {
            store: Some(ref s),
            dry_run: true,
        }) if s == "spar"
    ));
}

#[test]
fn verify_defaults_to_ten_minute_window() {
    let cli = Cli::try_parse_from(["pricewatch-cli", "verify"]).unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Verify {
            store: None,
            window_minutes: 10,
            json: false,
        })
    ));
}

#[test]
fn verify_with_store_window_and_json() {
    let cli = Cli::try_parse_from([
        "pricewatch-cli",
        "verify",
        "--store",
        "nabiji",
        "--window-minutes",
        "30",
        "--json",
    ])
    .unwrap();
    assert!(matches!(
        cli.command,
        Some(Commands::Verify {
            store: Some(ref s),
            window_minutes: 30,
            json: true,
        }) if s == "nabiji"
    ));
}

#[test]
fn unknown_db_subcommand_is_rejected() {
    assert!(Cli::try_parse_from(["pricewatch-cli", "db", "drop"]).is_err());
}
