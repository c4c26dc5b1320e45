use crate::address::Address;
use crate::consts::{DALI_MAX_LEVEL, DALI_MIN_LEVEL};
use crate::driver::{Command, Driver};
use crate::homeassistant::discovery::{self, LightDiscovery};
use std::fmt;
use tracing::{debug, info, warn};

/// Turn a friendly name into a topic-safe identifier: transliterated to
/// ASCII, lowercase, with runs of anything else collapsed to a single dash.
pub fn slugify(name: &str) -> String {
    slug::slugify(name)
}

/// Cached state of a single DALI device or a DALI group.
///
/// Individual devices are interrogated once on creation. Groups have no
/// single device behind them, so they are never queried: limits default to
/// the DALI range and the level is assumed off.
#[derive(Debug, Clone)]
pub struct Lamp {
    address: Address,
    friendly_name: String,
    device_name: String,
    /// Driver kind that serves this lamp; published as the model.
    model: String,

    min_physical_level: Option<u8>,
    min_level: u8,
    max_level: u8,
    level: u8,
}

impl Lamp {
    /// Create a lamp, reading its limits and current level from the bus for
    /// individual addresses. Bus errors are returned as-is.
    pub fn new(
        driver: &mut dyn Driver,
        friendly_name: &str,
        address: Address,
    ) -> anyhow::Result<Self> {
        let mut lamp = Self {
            address,
            friendly_name: friendly_name.to_string(),
            device_name: slugify(friendly_name),
            model: driver.name().to_string(),
            min_physical_level: None,
            min_level: DALI_MIN_LEVEL,
            max_level: DALI_MAX_LEVEL,
            level: 0,
        };

        match address {
            Address::Short(_) => {
                // Order matters: some firmwares answer based on earlier queries.
                let physical = lamp.query(driver, Command::QueryPhysicalMinimum)?;
                lamp.min_physical_level = Some(physical);
                lamp.min_level = lamp.query(driver, Command::QueryMinLevel)?;
                lamp.max_level = lamp.query(driver, Command::QueryMaxLevel)?;
                lamp.level = lamp.query(driver, Command::QueryActualLevel)?;
                lamp.levels_consistent();
            }
            Address::Group(_) => {
                debug!("{} is a group, using default levels", lamp.device_name);
            }
        }

        info!("Initialized lamp {}", lamp);
        Ok(lamp)
    }

    fn query(&self, driver: &mut dyn Driver, command: Command) -> anyhow::Result<u8> {
        let value = driver.send(self.address, command)?.require_value()?;
        debug!("{} {:?} -> {}", self.device_name, command, value);
        Ok(value)
    }

    /// Check the cached levels against each other. Device answers are kept
    /// as reported; a mismatch (eg. a 255 MASK answer) is only logged.
    pub fn levels_consistent(&self) -> bool {
        let mut consistent = true;
        if self.min_level > self.max_level {
            warn!(
                "{}: minimum level {} is above maximum {}",
                self.device_name, self.min_level, self.max_level
            );
            consistent = false;
        }
        if let Some(physical) = self.min_physical_level {
            if physical > self.min_level {
                warn!(
                    "{}: physical minimum {} is above minimum level {}",
                    self.device_name, physical, self.min_level
                );
                consistent = false;
            }
        }
        if self.level > self.max_level {
            warn!(
                "{}: level {} is above maximum {}",
                self.device_name, self.level, self.max_level
            );
            consistent = false;
        }
        consistent
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn friendly_name(&self) -> &str {
        &self.friendly_name
    }

    /// Slug of the friendly name, used in topics and identifiers.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn is_group(&self) -> bool {
        self.address.is_group()
    }

    pub fn min_physical_level(&self) -> Option<u8> {
        self.min_physical_level
    }

    pub fn min_level(&self) -> u8 {
        self.min_level
    }

    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    /// Last known level. 0 means off.
    pub fn level(&self) -> u8 {
        self.level
    }

    /// Set brightness with a DAPC command. Callers keep `level` within
    /// `0..=max_level`. The new value is cached without reading it back.
    pub fn set_level(&mut self, driver: &mut dyn Driver, level: u8) -> anyhow::Result<()> {
        driver.send(self.address, Command::Dapc(level))?;
        self.level = level;
        debug!("Set {} to level {}", self.device_name, level);
        Ok(())
    }

    /// Refresh the cached level from the device. No-op for groups.
    pub fn actual_level(&mut self, driver: &mut dyn Driver) -> anyhow::Result<u8> {
        if !self.is_group() {
            self.level = self.query(driver, Command::QueryActualLevel)?;
            self.levels_consistent();
        }
        Ok(self.level)
    }

    /// Switch off. The cached level drops to 0 right away.
    pub fn off(&mut self, driver: &mut dyn Driver) -> anyhow::Result<()> {
        driver.send(self.address, Command::Off)?;
        self.level = 0;
        debug!("Switched {} off", self.device_name);
        Ok(())
    }

    /// Discovery document for HA, built from the current state.
    pub fn gen_ha_config(&self, topic_prefix: &str) -> LightDiscovery {
        discovery::new_light(self, topic_prefix)
    }
}

impl fmt::Display for Lamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - address: {}, actual brightness level: {} (minimum: {}, max: {}",
            self.device_name, self.address, self.level, self.min_level, self.max_level
        )?;
        if let Some(physical) = self.min_physical_level {
            write!(f, ", physical minimum: {}", physical)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("my lamp"), "my-lamp");
        assert_eq!(slugify("Group 3"), "group-3");
        assert_eq!(slugify("  Living   Room -- Ceiling! "), "living-room-ceiling");
        assert_eq!(slugify("desk_lamp.2"), "desk-lamp-2");
        assert_eq!(slugify("Küche Süd"), "kuche-sud");
        assert_eq!(slugify("Éclairage ÉTÉ"), "eclairage-ete");
        assert_eq!(slugify(""), "");
    }
}
