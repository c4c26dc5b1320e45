/// Software version
pub const GATE_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name used as a product identity in discovery messages.
pub const GATE_NAME: &str = "dali2mqtt";
/// Human readable product name shown in HA device registry.
pub const GATE_PRODUCT: &str = "DALI Lights";

pub const HA_DISCOVERY_PREFIX: &str = "homeassistant";
pub const MQTT_BASE_TOPIC: &str = "dali2mqtt";

/// Prefix of the default entity id (`dali_light_<slug>`).
pub const ENTITY_ID_PREFIX: &str = "dali_light_";

// Availability and switch payloads.
pub const PAYLOAD_ON: &str = "ON";
pub const PAYLOAD_OFF: &str = "OFF";
pub const PAYLOAD_ONLINE: &str = "online";
pub const PAYLOAD_OFFLINE: &str = "offline";

/// Highest short address on a DALI bus.
pub const MAX_SHORT_ADDRESS: u8 = 63;
/// Highest group address on a DALI bus.
pub const MAX_GROUP_ADDRESS: u8 = 15;

/// Lowest arc power level in the DALI standard. Assumed for groups.
pub const DALI_MIN_LEVEL: u8 = 1;
/// Highest arc power level in the DALI standard. Assumed for groups.
pub const DALI_MAX_LEVEL: u8 = 254;
