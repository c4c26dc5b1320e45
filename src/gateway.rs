use crate::address::Address;
use crate::driver::Driver;
use crate::homeassistant::{discovery, Incoming, Outgoing};
use crate::lamp::Lamp;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// What HA asked a single lamp to do.
#[derive(Debug, Clone, Copy)]
enum LampCommand {
    On,
    Off,
    /// Requested level, before clamping.
    Level(u32),
}

/// Owner of the bus driver and all configured lamps.
///
/// Every bus interaction goes through `&mut self`, so commands coming from
/// MQTT are executed one at a time and never interleave on the bus.
pub struct Gateway {
    driver: Box<dyn Driver + Send>,
    /// Topic prefix of light topics.
    base: String,
    lamps: Vec<Lamp>,
    /// Device name (slug) -> index in `lamps`.
    by_name: HashMap<String, usize>,
}

impl Gateway {
    /// Bootstrap all lamps. Any bus failure aborts.
    pub fn new(
        mut driver: Box<dyn Driver + Send>,
        base: &str,
        devices: &[(String, Address)],
    ) -> anyhow::Result<Self> {
        let mut lamps = Vec::with_capacity(devices.len());
        let mut by_name = HashMap::new();

        for (friendly_name, address) in devices {
            let lamp = Lamp::new(&mut *driver, friendly_name, *address)?;
            if lamp.device_name().is_empty() {
                anyhow::bail!("Device name '{}' has no usable characters", friendly_name);
            }
            if by_name.insert(lamp.device_name().to_string(), lamps.len()).is_some() {
                anyhow::bail!(
                    "Device name '{}' collides with another device ({})",
                    friendly_name,
                    lamp.device_name()
                );
            }
            lamps.push(lamp);
        }

        Ok(Self {
            driver,
            base: base.to_string(),
            lamps,
            by_name,
        })
    }

    pub fn lamps(&self) -> &[Lamp] {
        &self.lamps
    }

    pub fn lamp(&self, device_name: &str) -> Option<&Lamp> {
        self.by_name.get(device_name).map(|idx| &self.lamps[*idx])
    }

    fn status(lamp: &Lamp) -> [Outgoing; 2] {
        [
            Outgoing::State {
                device_name: lamp.device_name().to_string(),
                on: lamp.level() > 0,
            },
            Outgoing::Brightness {
                device_name: lamp.device_name().to_string(),
                level: lamp.level(),
            },
        ]
    }

    /// Subscriptions, discovery and current state for every lamp.
    pub fn announce(&self) -> Vec<Outgoing> {
        let mut messages = Vec::new();
        for lamp in &self.lamps {
            let name = lamp.device_name();
            messages.push(Outgoing::Subscribe(discovery::command_topic(&self.base, name)));
            messages.push(Outgoing::Subscribe(discovery::brightness_command_topic(
                &self.base, name,
            )));
            messages.push(Outgoing::Discovery {
                device_name: name.to_string(),
                config: lamp.gen_ha_config(&self.base),
            });
            messages.extend(Self::status(lamp));
        }
        messages
    }

    /// Availability followed by the full announcement.
    pub fn reannounce(&self) -> Vec<Outgoing> {
        let mut messages = vec![Outgoing::Online];
        messages.extend(self.announce());
        messages
    }

    /// Execute a command from HA and return the state to publish back.
    /// Bus failures are logged; nothing is published for them.
    pub fn handle(&mut self, message: Incoming) -> Vec<Outgoing> {
        match message {
            Incoming::Reconnected => {
                info!("MQTT reconnected, announcing {} lamps again", self.lamps.len());
                self.reannounce()
            }
            Incoming::Switch { device_name, on } => {
                let command = if on { LampCommand::On } else { LampCommand::Off };
                self.execute(&device_name, command)
            }
            Incoming::Brightness { device_name, level } => {
                self.execute(&device_name, LampCommand::Level(level))
            }
        }
    }

    fn execute(&mut self, device_name: &str, command: LampCommand) -> Vec<Outgoing> {
        let lamp = match self.by_name.get(device_name) {
            Some(idx) => &mut self.lamps[*idx],
            None => {
                warn!("Command for unknown device {}, ignoring", device_name);
                return Vec::new();
            }
        };
        let driver = &mut *self.driver;

        let result = match command {
            LampCommand::On => {
                if lamp.level() == 0 {
                    let level = lamp.max_level();
                    lamp.set_level(driver, level)
                } else {
                    Ok(())
                }
            }
            LampCommand::Off => lamp.off(driver),
            LampCommand::Level(level) => {
                let level = u8::try_from(level)
                    .unwrap_or(u8::MAX)
                    .min(lamp.max_level());
                lamp.set_level(driver, level)
            }
        };

        match result {
            Ok(()) => {
                info!("{}", lamp);
                Self::status(lamp).into()
            }
            Err(err) => {
                error!("Bus command for {} failed: {:?}", lamp.device_name(), err);
                Vec::new()
            }
        }
    }

    /// Serve commands until either channel closes. Blocks the thread, so run
    /// it with `spawn_blocking`.
    pub fn run(mut self, mut incoming: mpsc::Receiver<Incoming>, outgoing: mpsc::Sender<Outgoing>) {
        while let Some(message) = incoming.blocking_recv() {
            for reply in self.handle(message) {
                if outgoing.blocking_send(reply).is_err() {
                    // The other side died.
                    info!("Gateway loop finishing");
                    return;
                }
            }
        }
        info!("Gateway loop finishing");
    }
}
