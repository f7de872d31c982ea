//! Loading and saving game configuration files

use guess_game::config::{ConfigLoader, LogLevel};
use guess_game::{
    Address, ConfigurationError, Game, GameError, GuessGameConfig, LocalVrfCoordinator, VrfProver,
};
use std::fs;

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("guess_game.toml");

    let mut config = GuessGameConfig::local_development();
    config.game.guess_range = 100;
    config.game.entrance_fee = 25;
    config.oracle.subscription_id = 4;

    ConfigLoader::save(&config, &path).expect("Failed to save config");
    let loaded = ConfigLoader::new()
        .with_path(&path)
        .load_with(|_| None)
        .expect("Failed to load config");

    assert_eq!(loaded, config);
}

#[test]
fn test_environment_overrides_file_values() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("guess_game.toml");
    ConfigLoader::save(&GuessGameConfig::default(), &path).unwrap();

    let owner = "0x0909090909090909090909090909090909090909";
    let loaded = ConfigLoader::new()
        .with_path(&path)
        .load_with(|key| match key {
            "GUESS_GAME_OWNER" => Some(owner.to_string()),
            "GUESS_GAME_SUBSCRIPTION_ID" => Some("12".to_string()),
            "GUESS_GAME_LOG_LEVEL" => Some("trace".to_string()),
            _ => None,
        })
        .unwrap();

    assert_eq!(loaded.game.owner, Address::repeat_byte(0x09));
    assert_eq!(loaded.oracle.subscription_id, 12);
    assert_eq!(loaded.monitoring.log_level, LogLevel::Trace);
}

#[test]
fn test_missing_file_fails_to_load() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let result = ConfigLoader::new()
        .with_path(dir.path().join("missing.toml"))
        .load_with(|_| None);

    assert!(matches!(result, Err(ConfigurationError::LoadFailed(_))));
}

#[test]
fn test_malformed_address_in_file() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        r#"
            [game]
            owner = "0x1234"
            address = "0x0202020202020202020202020202020202020202"
            entrance_fee = 5

            [oracle]
            coordinator = "0x0303030303030303030303030303030303030303"
            subscription_id = 1
            key_hash = "0x79d3d8832d904592c0bf9818b621522c988bb8b0c05cdc3b15aea1b6e8db0c15"
        "#,
    )
    .unwrap();

    let result = ConfigLoader::new().with_path(&path).load_with(|_| None);
    assert!(matches!(result, Err(ConfigurationError::LoadFailed(_))));
}

#[test]
fn test_invalid_config_cannot_deploy() {
    let mut config = GuessGameConfig::default();
    config.game.guess_range = 0;
    let coordinator = LocalVrfCoordinator::new(config.oracle.coordinator, VrfProver::new_random());

    let result = Game::new(&config, coordinator);
    assert!(matches!(
        result,
        Err(GameError::Configuration(ConfigurationError::InvalidValue { .. }))
    ));
}
