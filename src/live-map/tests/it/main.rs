#![deny(warnings)]
#![deny(rust_2018_idioms)]

use config::{Config, File};
use live_map::settings::Settings;

pub mod helper;
pub mod push;
pub mod runtime;

fn load_settings(file: &str, environment: &str) -> Settings {
    Config::builder()
        .add_source(File::with_name(file).required(true))
        .set_override("environment", environment)
        .unwrap()
        .set_override("api_token", "test")
        .unwrap()
        .build()
        .unwrap()
        .try_deserialize::<Settings>()
        .unwrap()
}

#[test]
fn test_local_settings_are_valid() {
    load_settings("config/local.yml", "Local");
}

#[test]
fn test_development_settings_are_valid() {
    load_settings("config/development.yml", "Development");
}

#[test]
fn test_production_settings_are_valid() {
    let settings = load_settings("config/production.yml", "Production");
    assert!(settings.push_url.is_some());
}

#[test]
fn test_test_settings_are_valid() {
    let settings = load_settings("config/test.yml", "Test");
    assert!(settings.push_url.is_none());
}
