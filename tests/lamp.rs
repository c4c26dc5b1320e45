mod common;

use common::FakeDriver;
use dali_gate::address::Address;
use dali_gate::consts::GATE_VERSION;
use dali_gate::driver::Command;
use dali_gate::lamp::Lamp;
use serde_json::{json, Value};

const MIN_PHYSICAL_BRIGHTNESS: u8 = 1;
const MIN_BRIGHTNESS: u8 = 2;
const MAX_BRIGHTNESS: u8 = 250;
const ACTUAL_BRIGHTNESS: u8 = 100;

fn fake_driver() -> FakeDriver {
    FakeDriver::new(&[
        MIN_PHYSICAL_BRIGHTNESS,
        MIN_BRIGHTNESS,
        MAX_BRIGHTNESS,
        ACTUAL_BRIGHTNESS,
        ACTUAL_BRIGHTNESS,
    ])
}

fn config_json(lamp: &Lamp, prefix: &str) -> Value {
    serde_json::from_str(&lamp.gen_ha_config(prefix).serialize()).unwrap()
}

#[test]
fn short_address_queries_bus_in_order() {
    let mut driver = fake_driver();
    let addr = Address::Short(1);
    let lamp = Lamp::new(&mut driver, "my lamp", addr).unwrap();

    assert_eq!(
        driver.sent(),
        vec![
            (addr, Command::QueryPhysicalMinimum),
            (addr, Command::QueryMinLevel),
            (addr, Command::QueryMaxLevel),
            (addr, Command::QueryActualLevel),
        ]
    );
    assert_eq!(lamp.min_physical_level(), Some(MIN_PHYSICAL_BRIGHTNESS));
    assert_eq!(lamp.min_level(), MIN_BRIGHTNESS);
    assert_eq!(lamp.max_level(), MAX_BRIGHTNESS);
    assert_eq!(lamp.level(), ACTUAL_BRIGHTNESS);
    assert!(!lamp.is_group());
}

#[test]
fn ha_config() {
    let mut driver = fake_driver();
    let lamp = Lamp::new(&mut driver, "my lamp", Address::Short(1)).unwrap();

    assert_eq!(lamp.device_name(), "my-lamp");
    assert_eq!(lamp.address().value(), 1);
    assert_eq!(
        lamp.to_string(),
        "my-lamp - address: 1, actual brightness level: 100 (minimum: 2, max: 250, physical minimum: 1)"
    );

    assert_eq!(
        config_json(&lamp, "test"),
        json!({
            "name": "my lamp",
            "def_ent_id": "dali_light_my-lamp",
            "uniq_id": "Mock_1",
            "stat_t": "test/my-lamp/light/status",
            "cmd_t": "test/my-lamp/light/switch",
            "pl_off": "OFF",
            "bri_stat_t": "test/my-lamp/light/brightness/status",
            "bri_cmd_t": "test/my-lamp/light/brightness/set",
            "bri_scl": MAX_BRIGHTNESS,
            "on_cmd_type": "brightness",
            "avty_t": "test/status",
            "pl_avail": "online",
            "pl_not_avail": "offline",
            "device": {
                "ids": "dali2mqtt",
                "name": "DALI Lights",
                "sw": format!("dali2mqtt {}", GATE_VERSION),
                "mdl": "Mock",
                "mf": "dali2mqtt",
            },
        })
    );
}

#[test]
fn actual_level_requeries_device() {
    let mut driver = FakeDriver::new(&[1, 2, 250, 100, 42]);
    let mut lamp = Lamp::new(&mut driver, "my lamp", Address::Short(7)).unwrap();
    driver.clear();

    assert_eq!(lamp.actual_level(&mut driver).unwrap(), 42);
    assert_eq!(lamp.level(), 42);
    assert_eq!(
        driver.sent(),
        vec![(Address::Short(7), Command::QueryActualLevel)]
    );
}

#[test]
fn bootstrap_failure_propagates() {
    // Only three answers: the actual level query fails.
    let mut driver = FakeDriver::new(&[1, 2, 250]);
    assert!(Lamp::new(&mut driver, "broken", Address::Short(1)).is_err());
    assert_eq!(driver.sent().len(), 4);
}

#[test]
fn level_setter_sends_dapc() {
    let mut driver = fake_driver();
    let mut lamp = Lamp::new(&mut driver, "my lamp", Address::Short(1)).unwrap();
    driver.clear();

    lamp.set_level(&mut driver, 128).unwrap();
    assert_eq!(lamp.level(), 128);
    assert_eq!(driver.sent(), vec![(Address::Short(1), Command::Dapc(128))]);
}

#[test]
fn failed_write_keeps_cached_level() {
    let mut driver = fake_driver();
    let mut lamp = Lamp::new(&mut driver, "my lamp", Address::Short(1)).unwrap();
    driver.break_bus();

    assert!(lamp.set_level(&mut driver, 10).is_err());
    assert_eq!(lamp.level(), ACTUAL_BRIGHTNESS);
    assert!(lamp.off(&mut driver).is_err());
    assert_eq!(lamp.level(), ACTUAL_BRIGHTNESS);
}

#[test]
fn off_zeroes_cached_level() {
    let mut driver = fake_driver();
    let mut lamp = Lamp::new(&mut driver, "my lamp", Address::Short(1)).unwrap();
    driver.clear();

    lamp.off(&mut driver).unwrap();
    assert_eq!(lamp.level(), 0);
    assert_eq!(driver.sent(), vec![(Address::Short(1), Command::Off)]);
}

#[test]
fn group_lamp_initialization() {
    let mut driver = fake_driver();
    let lamp = Lamp::new(&mut driver, "group 1", Address::Group(1)).unwrap();

    assert!(lamp.is_group());
    assert_eq!(lamp.device_name(), "group-1");
    assert_eq!(lamp.address(), Address::Group(1));
    assert_eq!(lamp.min_physical_level(), None);
    assert_eq!(lamp.min_level(), 1);
    assert_eq!(lamp.max_level(), 254);
    assert_eq!(lamp.level(), 0);
    assert!(driver.sent().is_empty());
}

#[test]
fn group_lamp_str() {
    let mut driver = fake_driver();
    let lamp = Lamp::new(&mut driver, "group 2", Address::Group(2)).unwrap();

    let text = lamp.to_string();
    assert_eq!(
        text,
        "group-2 - address: <group 2>, actual brightness level: 0 (minimum: 1, max: 254)"
    );
    assert!(!text.contains("physical minimum"));
}

#[test]
fn group_lamp_ha_config() {
    let mut driver = fake_driver();
    let lamp = Lamp::new(&mut driver, "group 3", Address::Group(3)).unwrap();

    let config = config_json(&lamp, "test");
    assert_eq!(config["name"], "group 3");
    assert_eq!(config["def_ent_id"], "dali_light_group-3");
    assert_eq!(config["uniq_id"], "Mock_group_<group 3>");
    assert_eq!(config["bri_scl"], 254);
    assert_eq!(config["stat_t"], "test/group-3/light/status");
    assert_eq!(config["cmd_t"], "test/group-3/light/switch");
    assert_eq!(config["bri_stat_t"], "test/group-3/light/brightness/status");
    assert_eq!(config["bri_cmd_t"], "test/group-3/light/brightness/set");
    assert_eq!(config["avty_t"], "test/status");
}

#[test]
fn group_and_short_ids_differ() {
    let mut driver = FakeDriver::new(&[1, 2, 250, 100]);
    let short = Lamp::new(&mut driver, "lamp", Address::Short(3)).unwrap();
    let group = Lamp::new(&mut driver, "lamp", Address::Group(3)).unwrap();

    assert_ne!(
        short.gen_ha_config("test").unique_id,
        group.gen_ha_config("test").unique_id
    );
}

#[test]
fn group_lamp_actual_level() {
    let mut driver = fake_driver();
    let mut lamp = Lamp::new(&mut driver, "group 1", Address::Group(1)).unwrap();

    assert_eq!(lamp.actual_level(&mut driver).unwrap(), 0);
    assert_eq!(lamp.level(), 0);
    assert!(driver.sent().is_empty());
}

#[test]
fn group_lamp_level_setter() {
    let mut driver = FakeDriver::new(&[]);
    let mut lamp = Lamp::new(&mut driver, "group 1", Address::Group(1)).unwrap();
    assert!(driver.sent().is_empty());

    lamp.set_level(&mut driver, 128).unwrap();
    assert_eq!(lamp.level(), 128);
    assert_eq!(driver.sent(), vec![(Address::Group(1), Command::Dapc(128))]);

    // Writes are cached, reads are still not attempted.
    assert_eq!(lamp.actual_level(&mut driver).unwrap(), 128);
    assert_eq!(driver.sent().len(), 1);
}

#[test]
fn group_lamp_off() {
    let mut driver = FakeDriver::new(&[]);
    let mut lamp = Lamp::new(&mut driver, "group 1", Address::Group(1)).unwrap();
    lamp.set_level(&mut driver, 200).unwrap();
    driver.clear();

    lamp.off(&mut driver).unwrap();
    assert_eq!(driver.sent(), vec![(Address::Group(1), Command::Off)]);
    assert_eq!(lamp.level(), 0);
}

#[test]
fn brightness_scale_follows_max_level() {
    let mut driver = FakeDriver::new(&[10, 20, 180, 0]);
    let lamp = Lamp::new(&mut driver, "Hall", Address::Short(12)).unwrap();

    let config = lamp.gen_ha_config("dali2mqtt");
    assert_eq!(config.brightness_scale, 180);
    assert_eq!(config.unique_id, "Mock_12");
}

#[test]
fn inconsistent_answers_are_kept_and_flagged() {
    // Minimum above maximum, MASK (255) as the actual level.
    let mut driver = FakeDriver::new(&[1, 200, 100, 255]);
    let lamp = Lamp::new(&mut driver, "odd lamp", Address::Short(5)).unwrap();

    assert_eq!(lamp.min_level(), 200);
    assert_eq!(lamp.max_level(), 100);
    assert_eq!(lamp.level(), 255);
    assert!(!lamp.levels_consistent());
}

#[test]
fn reported_levels_are_consistent() {
    let mut driver = fake_driver();
    let lamp = Lamp::new(&mut driver, "my lamp", Address::Short(1)).unwrap();
    assert!(lamp.levels_consistent());

    let group = Lamp::new(&mut driver, "group", Address::Group(1)).unwrap();
    assert!(group.levels_consistent());
}
