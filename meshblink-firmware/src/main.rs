use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::AnyIOPin;
use esp_idf_hal::prelude::*;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{info, warn};
use meshblink_lib::{spawn_indicator_task, IndicatorModule, IndicatorTaskContext};

mod config;
mod leds;

use config::Config;

fn main() -> Result<()> {
    // It is necessary to call this function once. Otherwise some patches to the runtime
    // implemented by esp-idf-sys might not link properly. See https://github.com/esp-rs/esp-idf-template/issues/71
    esp_idf_svc::sys::link_patches();

    // Bind the log crate to the ESP Logging facilities
    esp_idf_svc::log::EspLogger::initialize_default();

    info!("Starting meshblink firmware {}...", env!("GIT_VERSION"));

    let peripherals = Peripherals::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    config::init_nvs(nvs)?;
    let config = Config::load_or_default();

    let level = config.log_level.as_level_filter();
    if let Err(e) = esp_idf_svc::log::set_target_level("*", level) {
        warn!("Failed to set log level: {e}");
    } else {
        info!("Log level set to {:?}", config.log_level);
    }

    let data_pin = config.indicator.data_pin;
    info!("Initializing LED strip on GPIO {data_pin}...");
    // SAFETY: We trust the configured GPIO pin number is valid for this board
    let pin = unsafe { AnyIOPin::new(i32::from(data_pin)) };
    // Without a strip the indicator disables itself on its first tick
    let surface = match leds::create_strip(
        pin,
        peripherals.rmt.channel0,
        config.rmt_mem_blocks,
        config.strip_len,
    ) {
        Ok(strip) => Some(strip),
        Err(e) => {
            warn!("LED strip unavailable: {e:?}");
            None
        }
    };

    // Paints the configured ambient lighting before its first tick. The mesh
    // stack attaches through the handle's sender and router stats.
    let _indicator = spawn_indicator_task(IndicatorTaskContext {
        module: IndicatorModule::new(config.indicator.clone(), surface),
        node_num: config.node_num,
        ambient: config.ambient,
    })?;
    info!(
        "Indicator task started, ambient {} at brightness {}",
        config.ambient.color(),
        config.ambient.brightness
    );

    info!("All systems running!");

    // Main loop - keep alive
    loop {
        FreeRtos::delay_ms(1000);
    }
}
