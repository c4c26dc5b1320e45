use crate::address::Address;
use crate::consts;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Short address (0-63), or group number (0-15) with `group: true`.
    pub address: u8,
    #[serde(default)]
    pub group: bool,
}

impl DeviceConfig {
    pub fn to_address(&self) -> anyhow::Result<Address> {
        Address::new(self.address, self.group)
    }
}

fn default_base_topic() -> String {
    consts::MQTT_BASE_TOPIC.to_string()
}

fn default_discovery_prefix() -> String {
    consts::HA_DISCOVERY_PREFIX.to_string()
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default = "default_base_topic")]
    pub mqtt_base_topic: String,
    #[serde(default = "default_discovery_prefix")]
    pub ha_discovery_prefix: String,
    /// Friendly name -> device.
    pub devices: HashMap<String, DeviceConfig>,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(filename: P) -> anyhow::Result<Self> {
        let mut handle = File::open(filename)?;
        let mut data = String::new();
        handle.read_to_string(&mut data)?;
        Self::parse(&data)
    }

    /// Parse and check that every device has a valid address.
    pub fn parse(data: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(data)?;
        for (name, device) in &config.devices {
            if let Err(err) = device.to_address() {
                anyhow::bail!("Invalid address of device '{}': {}", name, err);
            }
        }
        Ok(config)
    }

    /// Devices with their addresses, sorted by name for a stable startup order.
    pub fn addresses(&self) -> anyhow::Result<Vec<(String, Address)>> {
        let mut devices = self
            .devices
            .iter()
            .map(|(name, device)| Ok((name.clone(), device.to_address()?)))
            .collect::<anyhow::Result<Vec<_>>>()?;
        devices.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(devices)
    }
}
