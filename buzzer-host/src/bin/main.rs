//! Operator console: connect both buzzers, run the illumination test
//! pattern, then print presses until interrupted.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{error, info, warn};

use buzzer_host::ble::BleTransport;
use buzzer_host::{BuzzerId, BuzzerManager, HostConfig};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("buzzer-host.json"));
    let config = HostConfig::load(&config_path)?;

    let transport = BleTransport::new(config.clone())
        .await
        .context("acquiring bluetooth adapter")?;
    let manager = BuzzerManager::new(Arc::new(transport), config);

    manager.on_status_change(|snapshot| match serde_json::to_string(snapshot) {
        Ok(json) => println!("status {json}"),
        Err(err) => error!("could not serialize status: {err}"),
    });
    manager.on_button_press(|event| {
        println!("{} {:?}", event.buzzer.color_name(), event.state);
    });

    for identity in BuzzerId::ALL {
        match manager.connect(identity).await {
            Ok(()) => {}
            // Operator backed out of device selection; not a failure.
            Err(err) if err.is_cancelled() => info!("skipped {:?}", identity),
            Err(err) => warn!("could not connect {:?}: {err}", identity),
        }
    }

    println!(
        "status {}",
        serde_json::to_string(&manager.get_status()).context("serializing status")?
    );

    info!("running illumination test pattern");
    if let Err(err) = manager.test_pattern().await {
        warn!("test pattern incomplete: {err}");
    }

    info!("ready, press ctrl-c to exit");
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;

    if let Err(err) = manager.disconnect_all().await {
        warn!("shutdown left connections behind: {err}");
    }
    Ok(())
}
