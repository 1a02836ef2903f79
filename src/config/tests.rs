use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Value, json};
use tempfile::tempdir;

use super::types::{ConfigFile, DurationValue};
use super::{
    ConfigOverrides, Preset, TrafficConfig, load_config_file, parse_duration_value,
    parse_interval_value, preset_config, resolve_config,
};
use crate::args::TrafficArgs;
use crate::catalog::{Classification, RequestContext};
use crate::error::{AppError, AppResult, ConfigError};

fn write_config(dir: &Path, name: &str, content: &str) -> AppResult<std::path::PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, content)?;
    Ok(path)
}

fn resolve(file: ConfigFile) -> AppResult<TrafficConfig> {
    TrafficConfig::resolve(file, &ConfigOverrides::default())
}

const YAML_CONFIG: &str = r#"
target: localhost:3000
rps: 2.5
concurrency: 4
duration: 10m
summary_interval: 15s
headers:
  X-Team: qa
vars:
  restaurant_id: [esthers, sakura]
endpoints:
  - name: list
    path: /api/restaurant
    weight: 3
  - name: order
    method: post
    path: /api/order
    weight: 1
    error_rate: 0.5
    error_variants: [missing_fields, oversized]
    payload:
      items:
        - name: Pizza
          qty: 2
  - name: bogus
    path: /api/nope
    classification: bad
"#;

#[test]
fn load_yaml_config_with_endpoints() -> AppResult<()> {
    let dir = tempdir()?;
    let path = write_config(dir.path(), "traffic.yaml", YAML_CONFIG)?;
    let config = resolve(load_config_file(&path)?)?;

    if config.base_url != "http://localhost:3000" {
        return Err(AppError::validation(format!("Unexpected base_url {}", config.base_url)));
    }
    if config.rate.to_bits() != 2.5_f64.to_bits() || config.concurrency != 4 {
        return Err(AppError::validation("Unexpected rate or concurrency"));
    }
    if config.duration != Some(Duration::from_secs(600))
        || config.summary_interval != Duration::from_secs(15)
    {
        return Err(AppError::validation("Unexpected durations"));
    }
    if config.catalog.len() != 3 {
        return Err(AppError::validation("Expected three endpoints"));
    }
    let bogus = config
        .catalog
        .iter()
        .find(|endpoint| endpoint.name() == "bogus")
        .ok_or_else(|| AppError::validation("Missing bogus endpoint"))?;
    if bogus.classification() != Classification::Bad {
        return Err(AppError::validation("Expected bogus to be bad"));
    }
    if config.headers != [("X-Team".to_owned(), "qa".to_owned())] {
        return Err(AppError::validation("Unexpected headers"));
    }
    if config.vars.names() != ["restaurant_id"] {
        return Err(AppError::validation("Unexpected vars"));
    }
    Ok(())
}

#[test]
fn load_json_and_toml_configs() -> AppResult<()> {
    let dir = tempdir()?;
    let json = write_config(
        dir.path(),
        "traffic.json",
        r#"{"base_url": "http://localhost:3000/", "rate": 5, "duration": 30,
            "endpoints": [{"path": "/", "weight": 1}]}"#,
    )?;
    let toml = write_config(
        dir.path(),
        "traffic.toml",
        r#"
base_url = "https://example.com"
rate = 0.5
timeout = "2s"

[[endpoints]]
name = "root"
path = "/"
"#,
    )?;

    let from_json = resolve(load_config_file(&json)?)?;
    if from_json.base_url != "http://localhost:3000" {
        return Err(AppError::validation("Expected trailing slash to be trimmed"));
    }
    if from_json.duration != Some(Duration::from_secs(30)) {
        return Err(AppError::validation("Expected numeric seconds duration"));
    }
    if from_json.catalog.iter().next().map(|entry| entry.name()) != Some("endpoint_1") {
        return Err(AppError::validation("Expected positional endpoint name"));
    }

    let from_toml = resolve(load_config_file(&toml)?)?;
    if from_toml.request_timeout != Duration::from_secs(2) || from_toml.duration.is_some() {
        return Err(AppError::validation("Unexpected toml timings"));
    }
    Ok(())
}

#[test]
fn load_rejects_unknown_extension_and_fields() -> AppResult<()> {
    let dir = tempdir()?;
    let ini = write_config(dir.path(), "traffic.ini", "rate=1")?;
    if !matches!(
        load_config_file(&ini),
        Err(AppError::Config(ConfigError::UnsupportedExtension { .. }))
    ) {
        return Err(AppError::validation("Expected unsupported extension"));
    }
    let typo = write_config(dir.path(), "traffic.yaml", "base_url: x\nrtae: 3\n")?;
    if !matches!(
        load_config_file(&typo),
        Err(AppError::Config(ConfigError::ParseYaml { .. }))
    ) {
        return Err(AppError::validation("Expected unknown field to fail"));
    }
    Ok(())
}

#[test]
fn empty_endpoint_list_is_rejected() -> AppResult<()> {
    let dir = tempdir()?;
    let path = write_config(
        dir.path(),
        "traffic.yaml",
        "base_url: http://localhost:3000\nendpoints: []\n",
    )?;
    match resolve(load_config_file(&path)?) {
        Err(AppError::Config(ConfigError::EmptyCatalog)) => Ok(()),
        Err(err) => Err(AppError::validation(format!("Unexpected error: {}", err))),
        Ok(_) => Err(AppError::validation("Expected empty endpoints to fail")),
    }
}

#[test]
fn resolve_rejects_invalid_values() -> AppResult<()> {
    let base = preset_config(Preset::Good, "http://localhost:3000");
    let cases = [
        ConfigFile {
            base_url: None,
            ..base.clone()
        },
        ConfigFile {
            base_url: Some("ftp://localhost".to_owned()),
            ..base.clone()
        },
        ConfigFile {
            rate: Some(0.0),
            ..base.clone()
        },
        ConfigFile {
            rate: Some(f64::INFINITY),
            ..base.clone()
        },
        ConfigFile {
            concurrency: Some(0),
            ..base.clone()
        },
        ConfigFile {
            duration: Some(DurationValue::Seconds(0)),
            ..base.clone()
        },
        ConfigFile {
            duration: Some(DurationValue::Text("5 parsecs".to_owned())),
            ..base.clone()
        },
        ConfigFile {
            vars: Some([("id".to_owned(), Vec::new())].into_iter().collect()),
            ..base.clone()
        },
        ConfigFile {
            vars: Some([("id".to_owned(), vec![json!({"nested": 1})])].into_iter().collect()),
            ..base.clone()
        },
        ConfigFile {
            headers: Some([("Bad Header".to_owned(), "x".to_owned())].into_iter().collect()),
            ..base.clone()
        },
    ];
    for (index, file) in cases.into_iter().enumerate() {
        match resolve(file) {
            Err(err) if err.is_config() => {}
            Err(err) => {
                return Err(AppError::validation(format!(
                    "Case {} failed with a non-config error: {}",
                    index, err
                )));
            }
            Ok(_) => {
                return Err(AppError::validation(format!("Case {} should fail", index)));
            }
        }
    }
    Ok(())
}

#[test]
fn duplicate_endpoint_names_are_rejected() -> AppResult<()> {
    let mut file = preset_config(Preset::Good, "http://localhost:3000");
    let first = file
        .endpoints
        .as_ref()
        .and_then(|endpoints| endpoints.first().cloned())
        .ok_or_else(|| AppError::validation("Preset has no endpoints"))?;
    if let Some(endpoints) = file.endpoints.as_mut() {
        endpoints.push(first);
    }
    match resolve(file) {
        Err(AppError::Config(ConfigError::DuplicateEndpoint { name })) if name == "get_root" => {
            Ok(())
        }
        Err(err) => Err(AppError::validation(format!("Unexpected error: {}", err))),
        Ok(_) => Err(AppError::validation("Expected duplicate names to fail")),
    }
}

#[test]
fn cli_overrides_win_over_file() -> AppResult<()> {
    let file = preset_config(Preset::Bad, "localhost:3000");
    let overrides = ConfigOverrides {
        rate: Some(40.0),
        duration: Some(Duration::from_secs(5)),
        concurrency: Some(2),
        summary_interval: Some(Duration::ZERO),
        seed: Some(9),
        headers: vec![("X-Run".to_owned(), "ci".to_owned())],
        ..ConfigOverrides::default()
    };
    let config = TrafficConfig::resolve(file, &overrides)?;
    if config.rate.to_bits() != 40.0_f64.to_bits()
        || config.concurrency != 2
        || config.duration != Some(Duration::from_secs(5))
        || !config.summary_interval.is_zero()
        || config.seed != Some(9)
    {
        return Err(AppError::validation("Overrides were not applied"));
    }
    if !config.headers.iter().any(|(name, _)| name == "X-Run") {
        return Err(AppError::validation("Expected CLI header"));
    }
    Ok(())
}

#[test]
fn presets_resolve_with_expected_shape() -> AppResult<()> {
    let good = resolve(preset_config(Preset::Good, "localhost:3000"))?;
    if good.catalog.len() != 4 || good.duration.is_some() || good.traffic_type != "good" {
        return Err(AppError::validation("Unexpected good preset"));
    }
    if good.catalog.iter().any(|entry| entry.error_rate() > 0.0) {
        return Err(AppError::validation("Good preset must not inject errors"));
    }

    let bad = resolve(preset_config(Preset::Bad, "localhost:3000"))?;
    if bad.catalog.len() != 5
        || bad.concurrency != 50
        || bad.duration != Some(Duration::from_secs(300))
        || bad.traffic_type != "chaos"
    {
        return Err(AppError::validation("Unexpected bad preset"));
    }
    Ok(())
}

#[test]
fn good_preset_order_quantity_varies() -> AppResult<()> {
    let config = resolve(preset_config(Preset::Good, "localhost:3000"))?;
    let order = config
        .catalog
        .iter()
        .find(|entry| entry.name() == "post_order")
        .ok_or_else(|| AppError::validation("Missing post_order"))?;
    let context = RequestContext {
        base_url: &config.base_url,
        headers: &config.headers,
        vars: &config.vars,
    };
    let mut rng = StdRng::seed_from_u64(11);
    let mut seen = BTreeSet::new();
    for seq in 0..60 {
        let request = order.prepare(&context, seq, false, &mut rng)?;
        let body = request
            .body
            .ok_or_else(|| AppError::validation("Expected an order body"))?;
        let value: Value = serde_json::from_slice(&body)
            .map_err(|err| AppError::validation(format!("Invalid JSON: {}", err)))?;
        let qty = value
            .pointer("/items/0/qty")
            .and_then(Value::as_u64)
            .ok_or_else(|| AppError::validation(format!("qty is not a number in {}", value)))?;
        if !(1..=3).contains(&qty) {
            return Err(AppError::validation(format!("qty {} out of range", qty)));
        }
        seen.insert(qty);
    }
    if seen.len() < 2 {
        return Err(AppError::validation("Expected quantities to vary"));
    }
    Ok(())
}

#[test]
fn resolve_config_uses_preset_subcommand() -> AppResult<()> {
    let args = TrafficArgs::try_parse_from([
        "trafficgen",
        "--rate",
        "1",
        "bad",
        "--target",
        "http://localhost:3000",
    ])?;
    let config = resolve_config(&args)?;
    if config.rate.to_bits() != 1.0_f64.to_bits() || config.base_url != "http://localhost:3000" {
        return Err(AppError::validation("Expected preset with rate override"));
    }
    Ok(())
}

#[test]
fn parse_duration_value_accepts_units() -> AppResult<()> {
    let cases = [
        ("250ms", Duration::from_millis(250)),
        ("10", Duration::from_secs(10)),
        ("10s", Duration::from_secs(10)),
        ("5m", Duration::from_secs(300)),
        ("2h", Duration::from_secs(7200)),
    ];
    for (input, expected) in cases {
        if parse_duration_value(input)? != expected {
            return Err(AppError::validation(format!("Unexpected value for {}", input)));
        }
    }
    for input in ["", "0", "m", "10x", "-5s"] {
        if parse_duration_value(input).is_ok() {
            return Err(AppError::validation(format!("Expected '{}' to fail", input)));
        }
    }
    if parse_interval_value("0")? != Duration::ZERO {
        return Err(AppError::validation("Interval should accept zero"));
    }
    Ok(())
}
