use crate::address::Address;
use crate::consts;
use crate::lamp::Lamp;
use serde::Serialize;
use serde_json;

/// Device block shared by all lights published by this gateway.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DeviceId {
    #[serde(rename = "ids")]
    pub identifiers: String,
    pub name: String,
    #[serde(rename = "sw")]
    pub sw_version: String,
    #[serde(rename = "mdl")]
    pub model: String,
    #[serde(rename = "mf")]
    pub manufacturer: String,
}

/// MQTT light discovery config (abbreviated keys).
// config topic: <discovery_prefix>/light/<device_name>/config
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct LightDiscovery {
    pub name: String,
    #[serde(rename = "def_ent_id")]
    pub default_entity_id: String,
    #[serde(rename = "uniq_id")]
    pub unique_id: String,
    #[serde(rename = "stat_t")]
    pub state_topic: String,
    #[serde(rename = "cmd_t")]
    pub command_topic: String,
    #[serde(rename = "pl_off")]
    pub payload_off: String,
    #[serde(rename = "bri_stat_t")]
    pub brightness_state_topic: String,
    #[serde(rename = "bri_cmd_t")]
    pub brightness_command_topic: String,
    #[serde(rename = "bri_scl")]
    pub brightness_scale: u8,
    /// Send brightness only, instead of ON followed by brightness.
    pub on_cmd_type: String,
    #[serde(rename = "avty_t")]
    pub availability_topic: String,
    #[serde(rename = "pl_avail")]
    pub payload_available: String,
    #[serde(rename = "pl_not_avail")]
    pub payload_not_available: String,
    pub device: DeviceId,
}

impl LightDiscovery {
    pub fn serialize(&self) -> String {
        serde_json::to_string(self).expect("All should be serializable")
    }
}

pub fn state_topic(prefix: &str, device_name: &str) -> String {
    format!("{}/{}/light/status", prefix, device_name)
}

pub fn command_topic(prefix: &str, device_name: &str) -> String {
    format!("{}/{}/light/switch", prefix, device_name)
}

pub fn brightness_state_topic(prefix: &str, device_name: &str) -> String {
    format!("{}/{}/light/brightness/status", prefix, device_name)
}

pub fn brightness_command_topic(prefix: &str, device_name: &str) -> String {
    format!("{}/{}/light/brightness/set", prefix, device_name)
}

pub fn availability_topic(prefix: &str) -> String {
    format!("{}/status", prefix)
}

/// Where the discovery config of a light is published.
pub fn config_topic(discovery_prefix: &str, device_name: &str) -> String {
    format!("{}/light/{}/config", discovery_prefix, device_name)
}

/// Groups get a marker so they never collide with a short address of the
/// same number.
fn unique_id(lamp: &Lamp) -> String {
    match lamp.address() {
        Address::Short(value) => format!("{}_{}", lamp.model(), value),
        group @ Address::Group(_) => format!("{}_group_{}", lamp.model(), group),
    }
}

pub fn new_light(lamp: &Lamp, prefix: &str) -> LightDiscovery {
    let device_name = lamp.device_name();

    let device = DeviceId {
        identifiers: consts::GATE_NAME.to_string(),
        name: consts::GATE_PRODUCT.to_string(),
        sw_version: format!("{} {}", consts::GATE_NAME, consts::GATE_VERSION),
        model: lamp.model().to_string(),
        manufacturer: consts::GATE_NAME.to_string(),
    };

    LightDiscovery {
        name: lamp.friendly_name().to_string(),
        default_entity_id: format!("{}{}", consts::ENTITY_ID_PREFIX, device_name),
        unique_id: unique_id(lamp),
        state_topic: state_topic(prefix, device_name),
        command_topic: command_topic(prefix, device_name),
        payload_off: consts::PAYLOAD_OFF.to_string(),
        brightness_state_topic: brightness_state_topic(prefix, device_name),
        brightness_command_topic: brightness_command_topic(prefix, device_name),
        brightness_scale: lamp.max_level(),
        on_cmd_type: "brightness".to_string(),
        availability_topic: availability_topic(prefix),
        payload_available: consts::PAYLOAD_ONLINE.to_string(),
        payload_not_available: consts::PAYLOAD_OFFLINE.to_string(),
        device,
    }
}
