//! WS2812 strip behind the indicator's `LedSurface`

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::OutputPin;
use esp_idf_hal::peripheral::Peripheral;
use esp_idf_hal::rmt::config::TransmitConfig;
use esp_idf_hal::rmt::{RmtChannel, TxRmtDriver};
use log::debug;
use meshblink_lib::SmartLedsSurface;
use smart_leds::{SmartLedsWrite, RGB8};
use ws2812_esp32_rmt_driver::Ws2812Esp32Rmt;

/// Time for the strip controller to latch a frame
const SETTLE_DELAY_MS: u32 = 1;

pub type StripSurface = SmartLedsSurface<SettlingStrip>;

/// WS2812 driver that waits for the strip to latch after every frame.
pub struct SettlingStrip {
    driver: Ws2812Esp32Rmt<'static>,
}

impl SmartLedsWrite for SettlingStrip {
    type Error = <Ws2812Esp32Rmt<'static> as SmartLedsWrite>::Error;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        self.driver.write(iterator)?;
        FreeRtos::delay_ms(SETTLE_DELAY_MS);
        Ok(())
    }
}

/// Create the strip surface on the given pin and RMT channel.
pub fn create_strip<C: RmtChannel, P: OutputPin>(
    pin: impl Peripheral<P = P> + 'static,
    channel: impl Peripheral<P = C> + 'static,
    mem_blocks: u8,
    strip_len: usize,
) -> Result<StripSurface> {
    debug!("Creating LED strip: {strip_len} pixels, {mem_blocks} RMT memory blocks");
    // More memory blocks give the RMT headroom when the radio interrupts it.
    // See: https://github.com/cat-in-136/ws2812-esp32-rmt-driver#the-led-is-sp32-flickers-sp32--sp32-s3--sp32-c6--sp32-h2
    let config = TransmitConfig::new().clock_divider(1).mem_block_num(mem_blocks);
    let tx_driver = TxRmtDriver::new(channel, pin, &config)?;
    let driver = Ws2812Esp32Rmt::new_with_rmt_driver(tx_driver)?;

    Ok(SmartLedsSurface::new(SettlingStrip { driver }, strip_len))
}
