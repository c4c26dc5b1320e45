use super::discovery;

/// Things we sent to HA.
#[derive(Debug, Clone, PartialEq)]
pub enum Outgoing {
    /// Subscribe to a new topic given as argument. Not a real message.
    Subscribe(String),
    /// Mark the gateway available. Sent once after connecting.
    Online,
    /// Discovery message, published to
    /// <discovery_prefix>/light/<device_name>/config
    Discovery {
        device_name: String,
        config: discovery::LightDiscovery,
    },
    /// Light switched on or off.
    State { device_name: String, on: bool },
    /// Current brightness level.
    Brightness { device_name: String, level: u8 },
}

/// Things HA sents to us (like: switch the light)
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    /// Switch light on or off.
    Switch {
        /// Device slug from the topic
        device_name: String,
        on: bool,
    },

    /// Set brightness. Not yet clamped to the lamp limits.
    Brightness { device_name: String, level: u32 },

    /// MQTT connection was re-established. Subscriptions, availability and
    /// discovery have to be sent again.
    Reconnected,
}
