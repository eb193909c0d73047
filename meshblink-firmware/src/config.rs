use anyhow::{anyhow, Result};
use esp_idf_svc::nvs::{EspNvs, EspNvsPartition, NvsDefault};
use esp_idf_svc::sys::{esp_mac_type_t_ESP_MAC_WIFI_STA, esp_read_mac};
use log::{debug, info, warn, LevelFilter};
use meshblink_lib::{AmbientLighting, IndicatorSettings};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Read WiFi STA MAC address from eFuse (available before any driver init)
fn get_wifi_sta_mac() -> [u8; 6] {
    let mut mac = [0u8; 6];
    // SAFETY: esp_read_mac just reads from eFuse, no driver needed
    unsafe {
        esp_read_mac(mac.as_mut_ptr(), esp_mac_type_t_ESP_MAC_WIFI_STA);
    }
    mac
}

/// Node number derived from the low four MAC bytes, as the mesh stack does
fn default_node_num() -> u32 {
    let mac = get_wifi_sta_mac();
    u32::from_be_bytes([mac[2], mac[3], mac[4], mac[5]])
}

/// Configurable log level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    #[must_use]
    pub const fn as_level_filter(self) -> LevelFilter {
        match self {
            Self::Off => LevelFilter::Off,
            Self::Error => LevelFilter::Error,
            Self::Warn => LevelFilter::Warn,
            Self::Info => LevelFilter::Info,
            Self::Debug => LevelFilter::Debug,
        }
    }
}

const NVS_NAMESPACE: &str = "meshblink";
const NVS_CONFIG_KEY: &str = "config";

/// RMT memory blocks available to one channel
const MAX_RMT_MEM_BLOCKS: u8 = 8;

// Global NVS handle - initialized once in main
static NVS: Mutex<Option<EspNvs<NvsDefault>>> = Mutex::new(None);

pub fn init_nvs(nvs_partition: EspNvsPartition<NvsDefault>) -> Result<()> {
    debug!("Initializing NVS namespace: {NVS_NAMESPACE}");
    let nvs = EspNvs::new(nvs_partition, NVS_NAMESPACE, true)?;
    *NVS.lock().map_err(|_| anyhow!("NVS lock poisoned"))? = Some(nvs);
    info!("NVS initialized");
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub log_level: LogLevel,
    /// This device's node number; packets from it are not alerted on
    #[serde(default = "default_node_num")]
    pub node_num: u32,
    /// Pixels on the physical strip, shared with the ambient lighting
    #[serde(default = "default_strip_len")]
    pub strip_len: usize,
    #[serde(default = "default_rmt_mem_blocks")]
    pub rmt_mem_blocks: u8,
    #[serde(default)]
    pub indicator: IndicatorSettings,
    #[serde(default)]
    pub ambient: AmbientLighting,
}

const fn default_strip_len() -> usize {
    1
}

/// Extra RMT buffer so radio interrupts don't cause flicker
const fn default_rmt_mem_blocks() -> u8 {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            node_num: default_node_num(),
            strip_len: default_strip_len(),
            rmt_mem_blocks: default_rmt_mem_blocks(),
            indicator: IndicatorSettings::default(),
            ambient: AmbientLighting::default(),
        }
    }
}

impl Config {
    /// Clamp values to valid ranges and fix invalid values.
    ///
    /// Indicator settings are left alone; the indicator clamps its own.
    pub fn validate(&mut self) {
        if self.strip_len == 0 {
            warn!("strip_len is 0, resetting to {}", default_strip_len());
            self.strip_len = default_strip_len();
        }
        let mem_blocks = self.rmt_mem_blocks.clamp(1, MAX_RMT_MEM_BLOCKS);
        if mem_blocks != self.rmt_mem_blocks {
            warn!("Clamping rmt_mem_blocks from {} to {mem_blocks}", self.rmt_mem_blocks);
            self.rmt_mem_blocks = mem_blocks;
        }
    }

    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(mut config) => {
                info!("Loaded config from NVS");
                config.validate();
                config
            }
            Err(e) => {
                warn!("Failed to load config from NVS: {e}, using defaults");
                Self::default()
            }
        }
    }

    pub fn load() -> Result<Self> {
        debug!("Loading config from NVS");
        let nvs_guard = NVS.lock().map_err(|_| anyhow!("NVS lock poisoned"))?;
        let nvs = nvs_guard.as_ref().ok_or_else(|| anyhow!("NVS not initialized"))?;

        let len = nvs
            .blob_len(NVS_CONFIG_KEY)?
            .ok_or_else(|| anyhow!("No config found in NVS"))?;
        debug!("Config blob size: {len} bytes");
        let mut buf = vec![0u8; len];
        nvs.get_blob(NVS_CONFIG_KEY, &mut buf)?;
        let config: Config = serde_json::from_slice(&buf)?;
        debug!(
            "Config parsed: node_num=0x{:08x}, strip_len={}, data_pin={}",
            config.node_num, config.strip_len, config.indicator.data_pin
        );
        Ok(config)
    }
}
