//! Built-in traffic profiles for the FoodMe demo API. Both resolve through
//! the same [`super::TrafficConfig::resolve`] path as a config file.
use std::collections::BTreeMap;

use serde_json::{Value, json};

use crate::args::HttpMethod;
use crate::catalog::Classification;

use super::types::{ConfigFile, DurationValue, EndpointConfig};

const RESTAURANT_IDS: [&str; 39] = [
    "esthers",
    "robatayaki",
    "tofuparadise",
    "bateaurouge",
    "khartoum",
    "sallys",
    "saucy",
    "czechpoint",
    "speisewagen",
    "beijing",
    "satay",
    "cancun",
    "curryup",
    "carthage",
    "burgerama",
    "littlepigs",
    "littleprague",
    "kohlhaus",
    "dragon",
    "babythai",
    "wholetamale",
    "bhangra",
    "taqueria",
    "pedros",
    "superwonton",
    "naansequitur",
    "sakura",
    "shandong",
    "currygalore",
    "north",
    "beans",
    "jeeves",
    "zardoz",
    "angular",
    "flavia",
    "luigis",
    "thick",
    "wheninrome",
    "pizza76",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Good,
    Bad,
}

/// Weights and error rates for the five FoodMe endpoints.
struct Profile {
    root: f64,
    list: f64,
    one: f64,
    order: f64,
    bogus: Option<f64>,
    one_error_rate: f64,
    order_error_rate: f64,
}

#[must_use]
pub fn preset_config(preset: Preset, target: &str) -> ConfigFile {
    match preset {
        Preset::Good => ConfigFile {
            base_url: Some(target.to_owned()),
            rate: Some(3.0),
            concurrency: Some(10),
            duration: None,
            summary_interval: Some(DurationValue::Seconds(60)),
            traffic_type: Some("good".to_owned()),
            vars: Some(foodme_vars()),
            endpoints: Some(foodme_endpoints(&Profile {
                root: 10.0,
                list: 40.0,
                one: 30.0,
                order: 20.0,
                bogus: None,
                one_error_rate: 0.0,
                order_error_rate: 0.0,
            })),
            ..ConfigFile::default()
        },
        Preset::Bad => ConfigFile {
            base_url: Some(target.to_owned()),
            rate: Some(15.0),
            concurrency: Some(50),
            duration: Some(DurationValue::Seconds(300)),
            summary_interval: Some(DurationValue::Seconds(30)),
            traffic_type: Some("chaos".to_owned()),
            vars: Some(foodme_vars()),
            endpoints: Some(foodme_endpoints(&Profile {
                root: 5.0,
                list: 15.0,
                one: 20.0,
                order: 40.0,
                bogus: Some(20.0),
                one_error_rate: 0.3,
                order_error_rate: 0.5,
            })),
            ..ConfigFile::default()
        },
    }
}

fn foodme_vars() -> BTreeMap<String, Vec<Value>> {
    let mut vars = BTreeMap::new();
    vars.insert(
        "restaurant_id".to_owned(),
        RESTAURANT_IDS.iter().map(|id| Value::from(*id)).collect(),
    );
    vars.insert("pizza_qty".to_owned(), (1..=3).map(Value::from).collect());
    vars
}

fn foodme_endpoints(profile: &Profile) -> Vec<EndpointConfig> {
    let mut endpoints = vec![
        endpoint("get_root", HttpMethod::Get, "/", profile.root),
        endpoint("get_list", HttpMethod::Get, "/api/restaurant", profile.list),
        EndpointConfig {
            error_path: Some("/api/restaurant/invalid_restaurant".to_owned()),
            error_rate: Some(profile.one_error_rate),
            ..endpoint(
                "get_one",
                HttpMethod::Get,
                "/api/restaurant/{{restaurant_id}}",
                profile.one,
            )
        },
        EndpointConfig {
            payload: Some(json!({
                "items": [
                    { "name": "Pizza", "qty": "{{pizza_qty}}" },
                    { "name": "Salad", "qty": 1 }
                ],
                "deliverTo": { "name": "Test User" },
                "restaurant": { "name": "Demo" }
            })),
            error_rate: Some(profile.order_error_rate),
            ..endpoint("post_order", HttpMethod::Post, "/api/order", profile.order)
        },
    ];
    if let Some(weight) = profile.bogus {
        endpoints.push(EndpointConfig {
            classification: Classification::Bad,
            error_path: Some("/totally-invalid".to_owned()),
            ..endpoint("bogus", HttpMethod::Get, "/api/nope", weight)
        });
    }
    endpoints
}

fn endpoint(name: &str, method: HttpMethod, path: &str, weight: f64) -> EndpointConfig {
    EndpointConfig {
        name: Some(name.to_owned()),
        method,
        path: path.to_owned(),
        weight,
        classification: Classification::Good,
        payload: None,
        error_path: None,
        error_rate: None,
        error_variants: None,
        headers: None,
    }
}
