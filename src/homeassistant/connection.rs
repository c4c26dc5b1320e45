use super::{discovery, Incoming, Outgoing};
use crate::consts;
use rumqttc::{AsyncClient, EventLoop, LastWill, MqttOptions, QoS};
use rumqttc::{Event, Packet};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::{sync::Mutex, task};

use tracing::{debug, error, info, warn};

pub struct Initiator {
    client: AsyncClient,
    event_loop: EventLoop,
    base: String,
    discovery_prefix: String,
}

/// HA interfacing via MQTT
pub struct HomeAssistant {
    /// Outgoing event queue: things we sent to HA.
    outgoing: mpsc::Sender<Outgoing>,
    /// Incoming event queue: commands read from HA.
    incoming: Mutex<mpsc::Receiver<Incoming>>,
}

/// Decode a command published by HA to one of our light topics.
///
/// Recognized topics are `<base>/<device>/light/switch` and
/// `<base>/<device>/light/brightness/set`.
pub fn parse_incoming(base: &str, topic: &str, payload: &[u8]) -> Option<Incoming> {
    let rest = topic.strip_prefix(base)?.strip_prefix('/')?;
    let parts: Vec<&str> = rest.split('/').collect();
    let payload = match std::str::from_utf8(payload) {
        Ok(payload) => payload.trim(),
        Err(_) => {
            warn!("Payload on {} is not valid UTF-8", topic);
            return None;
        }
    };

    match parts.as_slice() {
        [device_name, "light", "switch"] => {
            let on = match payload {
                consts::PAYLOAD_ON => true,
                consts::PAYLOAD_OFF => false,
                _ => {
                    warn!("Unknown switch payload '{}' for {}", payload, device_name);
                    return None;
                }
            };
            Some(Incoming::Switch {
                device_name: device_name.to_string(),
                on,
            })
        }
        [device_name, "light", "brightness", "set"] => match payload.parse::<u32>() {
            Ok(level) => Some(Incoming::Brightness {
                device_name: device_name.to_string(),
                level,
            }),
            Err(_) => {
                warn!("Brightness is not a number: '{}'", payload);
                None
            }
        },
        _ => None,
    }
}

impl Initiator {
    /// Connect to the broker. `base` is the topic prefix of all light
    /// topics; its `status` subtopic carries availability.
    pub async fn new(
        id: &str,
        host: &str,
        port: u16,
        username: &str,
        password: &str,
        base: &str,
    ) -> anyhow::Result<Self> {
        let mut mqttoptions = MqttOptions::new(id, host, port);
        mqttoptions.set_keep_alive(Duration::from_secs(5));
        if !username.is_empty() {
            mqttoptions.set_credentials(username, password);
        }
        mqttoptions.set_last_will(LastWill::new(
            discovery::availability_topic(base),
            consts::PAYLOAD_OFFLINE,
            QoS::AtLeastOnce,
            true,
        ));

        let (client, mut event_loop) = AsyncClient::new(mqttoptions, 10);

        // Fail early if parameters are invalid.
        if let Err(err) = event_loop.poll().await {
            warn!("Initial connection to MQTT failed. Check connection parameters");
            anyhow::bail!("Unable to contact MQTT: {}", err);
        }

        Ok(Initiator {
            client,
            event_loop,
            base: base.to_string(),
            discovery_prefix: consts::HA_DISCOVERY_PREFIX.to_string(),
        })
    }

    /// Configure HA discovery prefix.
    pub fn set_discovery_prefix(&mut self, discovery_prefix: &str) {
        self.discovery_prefix = discovery_prefix.to_string();
    }

    async fn receiver(mut event_loop: EventLoop, base: String, queue: mpsc::Sender<Incoming>) {
        loop {
            let notification = event_loop.poll().await;
            let result = match notification {
                Ok(Event::Incoming(Packet::Publish(msg))) => {
                    info!("RX message to {} with payload '{:?}'", msg.topic, msg.payload);
                    if let Some(message) = parse_incoming(&base, &msg.topic, &msg.payload) {
                        queue.send(message).await
                    } else {
                        info!("Unknown topic - ignoring");
                        continue;
                    }
                }
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    // The initial ConnAck is consumed in `new`, so this is a
                    // reconnect. Clean session dropped our subscriptions and
                    // the broker published the "offline" will.
                    info!("Reconnected to MQTT: {:?}", ack);
                    queue.send(Incoming::Reconnected).await
                }
                Ok(Event::Outgoing(_))
                | Ok(Event::Incoming(Packet::PingResp))
                | Ok(Event::Incoming(Packet::SubAck(_)))
                | Ok(Event::Incoming(Packet::PubAck(_))) => {
                    // Silence common messages
                    continue;
                }
                Err(err) => {
                    // rumqttc reconnects on the next poll; state is restored
                    // on its ConnAck.
                    error!("MQTT connection error: {:?}", err);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                    continue;
                }
                _ => {
                    info!("Received other message = {:?}", notification);
                    continue;
                }
            };
            if result.is_err() {
                error!(
                    "Error while sending received message to queue: {:?}. Quitting loop",
                    result
                );
                return;
            }
        }
    }

    async fn publish(client: &AsyncClient, topic: String, retain: bool, payload: String) {
        debug!("Publishing to {}: {}", topic, payload);
        let result = client
            .publish(topic, QoS::AtLeastOnce, retain, payload)
            .await;
        if result.is_err() {
            error!("Unable to publish message {:?}", result);
        }
    }

    async fn sender(
        client: AsyncClient,
        base: String,
        discovery_prefix: String,
        mut queue: mpsc::Receiver<Outgoing>,
    ) {
        while let Some(command) = queue.recv().await {
            match command {
                Outgoing::Subscribe(topic) => {
                    let result = client.subscribe(&topic, QoS::AtMostOnce).await;
                    if result.is_err() {
                        error!("Unable to subscribe to a topic {}: {:?}", topic, result);
                        return;
                    }
                }
                Outgoing::Online => {
                    let topic = discovery::availability_topic(&base);
                    Self::publish(&client, topic, true, consts::PAYLOAD_ONLINE.into()).await;
                }
                Outgoing::Discovery {
                    device_name,
                    config,
                } => {
                    let topic = discovery::config_topic(&discovery_prefix, &device_name);
                    Self::publish(&client, topic, true, config.serialize()).await;
                }
                Outgoing::State { device_name, on } => {
                    let topic = discovery::state_topic(&base, &device_name);
                    let payload = if on {
                        consts::PAYLOAD_ON
                    } else {
                        consts::PAYLOAD_OFF
                    };
                    Self::publish(&client, topic, false, payload.into()).await;
                }
                Outgoing::Brightness { device_name, level } => {
                    let topic = discovery::brightness_state_topic(&base, &device_name);
                    Self::publish(&client, topic, false, level.to_string()).await;
                }
            }
        }
        // Channel end closed - quit.
    }

    pub async fn start(self) -> HomeAssistant {
        let (out_sender, out_receiver) = mpsc::channel::<Outgoing>(10);
        let (in_sender, in_receiver) = mpsc::channel::<Incoming>(10);
        task::spawn(Self::receiver(self.event_loop, self.base.clone(), in_sender));
        task::spawn(Self::sender(
            self.client,
            self.base,
            self.discovery_prefix,
            out_receiver,
        ));

        HomeAssistant {
            outgoing: out_sender,
            incoming: Mutex::new(in_receiver),
        }
    }
}

impl HomeAssistant {
    /// Receive incoming message (from MQTT). None means the HA reading loop
    /// finished.
    pub async fn recv(&self) -> Option<Incoming> {
        let mut incoming = self.incoming.lock().await;
        incoming.recv().await
    }

    pub async fn send(&self, msg: Outgoing) -> anyhow::Result<()> {
        self.outgoing.send(msg).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_switch() {
        assert_eq!(
            parse_incoming("dali2mqtt", "dali2mqtt/my-lamp/light/switch", b"ON"),
            Some(Incoming::Switch {
                device_name: "my-lamp".into(),
                on: true
            })
        );
        assert_eq!(
            parse_incoming("dali2mqtt", "dali2mqtt/my-lamp/light/switch", b"OFF"),
            Some(Incoming::Switch {
                device_name: "my-lamp".into(),
                on: false
            })
        );
        assert_eq!(
            parse_incoming("dali2mqtt", "dali2mqtt/my-lamp/light/switch", b"TOGGLE"),
            None
        );
    }

    #[test]
    fn parses_brightness() {
        assert_eq!(
            parse_incoming("a/b", "a/b/group-1/light/brightness/set", b"128"),
            Some(Incoming::Brightness {
                device_name: "group-1".into(),
                level: 128
            })
        );
        assert_eq!(
            parse_incoming("a/b", "a/b/group-1/light/brightness/set", b"bright"),
            None
        );
    }

    #[test]
    fn ignores_foreign_topics() {
        assert_eq!(parse_incoming("dali2mqtt", "dali2mqtt/status", b"online"), None);
        assert_eq!(
            parse_incoming("dali2mqtt", "other/my-lamp/light/switch", b"ON"),
            None
        );
        assert_eq!(
            parse_incoming("dali2mqtt", "dali2mqttx/my-lamp/light/switch", b"ON"),
            None
        );
        assert_eq!(
            parse_incoming("dali2mqtt", "dali2mqtt/my-lamp/light/brightness/status", b"1"),
            None
        );
    }
}
