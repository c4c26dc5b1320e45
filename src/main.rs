use clap::Parser;
use dali_gate::comm::SerialDriver;
use dali_gate::config::Config;
use dali_gate::gateway::Gateway;
use dali_gate::homeassistant::{self, HomeAssistant};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "config.yaml")]
    config_path: String,

    // DALI USB adapter
    #[arg(long, default_value = "/dev/ttyUSB0")]
    port_name: String,
    #[arg(long, default_value_t = 19200)]
    baud_rate: u32,

    // MQTT connection
    #[arg(long)]
    mqtt_host: String,
    #[arg(long, default_value_t = 1883)]
    mqtt_port: u16,
    #[arg(long, default_value = "")]
    mqtt_username: String,
    #[arg(long, default_value = "")]
    mqtt_password: String,
    #[arg(long, default_value = "dali-gate-mqtt")]
    mqtt_client_id: String,
}

fn init_log() {
    let timer = fmt::time::ChronoLocal::new("%H:%M:%S%.3f".to_string());

    // Configure a custom event formatter
    let format = fmt::format()
        .with_level(true)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_source_location(true)
        .with_timer(timer)
        .compact();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env()
        .expect("RUST_LOG configuration is valid")
        .add_directive("rumqttc=info".parse().expect("Static directive is valid"));

    fmt().event_format(format).with_env_filter(filter).init();
}

/// Announce all lamps: subscriptions, discovery and initial state.
async fn init_config(gateway: &Gateway, ha: &HomeAssistant) -> anyhow::Result<()> {
    for message in gateway.reannounce() {
        ha.send(message).await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_log();
    let args = Args::parse();

    let config = Config::from_file(&args.config_path)?;
    info!("Starting DALI gate. Args: {:?} Config: {:?}", args, config);

    let devices = config.addresses()?;
    let base = config.mqtt_base_topic.clone();
    let port_name = args.port_name.clone();
    let baud_rate = args.baud_rate;

    // Bus queries block - keep them off the async workers.
    let gateway = tokio::task::spawn_blocking(move || -> anyhow::Result<Gateway> {
        let driver = SerialDriver::open(&port_name, baud_rate)?;
        Gateway::new(Box::new(driver), &base, &devices)
    })
    .await??;

    let mut ha_init = homeassistant::Initiator::new(
        &args.mqtt_client_id,
        &args.mqtt_host,
        args.mqtt_port,
        &args.mqtt_username,
        &args.mqtt_password,
        &config.mqtt_base_topic,
    )
    .await?;
    ha_init.set_discovery_prefix(&config.ha_discovery_prefix);
    let ha = Arc::new(ha_init.start().await);

    init_config(&gateway, &ha).await?;

    info!("DALI gate initialized with {} lamps.", gateway.lamps().len());

    let (cmd_tx, cmd_rx) = mpsc::channel(15);
    let (state_tx, mut state_rx) = mpsc::channel(15);
    tokio::task::spawn_blocking(move || gateway.run(cmd_rx, state_tx));

    // MQTT -> DALI
    let ha_receiver = ha.clone();
    let task_mqtt_to_dali = async move {
        while let Some(msg) = ha_receiver.recv().await {
            info!("MQTT->RX: {:?}", msg);
            if cmd_tx.send(msg).await.is_err() {
                // The other side died.
                break;
            }
        }
        // Return Err to break try_join
        info!("MQTT->DALI task finishing");
        Err::<(), ()>(())
    };

    // DALI -> MQTT
    let task_dali_to_mqtt = async move {
        while let Some(msg) = state_rx.recv().await {
            if ha.send(msg).await.is_err() {
                break;
            }
        }
        info!("DALI->MQTT task finishing");
        Err::<(), ()>(())
    };

    // If any side dies this should close the program.
    let _ = tokio::try_join!(task_mqtt_to_dali, task_dali_to_mqtt);
    Ok(())
}
