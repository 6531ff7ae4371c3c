//! EnvGuard Firmware — Main Entry Point
//!
//! Hexagonal architecture driven by a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        Lcd ×2          LogEventSink           │
//! │  (Sensor+Actuator+Tone) (TextDisplay)   (EventSink)            │
//! │  WifiAdapter            MqttAdapter     Esp32TimeAdapter       │
//! │  (LinkPort)             (PubSubPort)    (ClockPort)            │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Alert FSM · Mode controller · Gas model               │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (run_pass) · Connectivity · Display paging          │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use log::{info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::{Ets, FreeRtos};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::{EspSntp, SntpConf};

use envguard::adapters::device_id;
use envguard::adapters::hardware::HardwareAdapter;
use envguard::adapters::log_sink::LogEventSink;
use envguard::adapters::mqtt::MqttAdapter;
use envguard::adapters::time::{posix_tz, Esp32TimeAdapter};
use envguard::adapters::wifi::WifiAdapter;
use envguard::app::ports::{ClockPort, TextDisplay};
use envguard::config::SystemConfig;
use envguard::display::pages::{self, LCD_COLS, LCD_ROWS};
use envguard::drivers::{hw_init, lcd::Lcd, watchdog::Watchdog};
use envguard::pins;
use envguard::scheduler::{Io, Scheduler};
use envguard::sensors::gas;

/// Startup wait for the first association.
const WIFI_CONNECT_TIMEOUT_MS: u32 = 15_000;
/// Idle time between loop passes.
const LOOP_IDLE_MS: u32 = 10;

/// Defaults, optionally overridden by a JSON document baked in at build
/// time through `ENVGUARD_CONFIG_JSON`.
fn load_config() -> SystemConfig {
    let Some(json) = option_env!("ENVGUARD_CONFIG_JSON") else {
        return SystemConfig::default();
    };
    match SystemConfig::from_json(json) {
        Ok(cfg) => {
            info!("Config: JSON override applied");
            cfg
        }
        Err(e) => {
            warn!("Config: override rejected ({}), using defaults", e);
            SystemConfig::default()
        }
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EnvGuard v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config();

    // ── 2. Raw peripherals (ADC, GPIO, LEDC) ──────────────────
    if let Err(e) = hw_init::init_peripherals() {
        log::error!("HAL init failed: {}", e);
        return Err(envguard::error::Error::from(e).into());
    }

    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ── 3. Character displays (I2C0 readings, I2C1 status) ────
    // Pin objects must match pins::I2C0_* / pins::I2C1_*.
    let i2c_cfg = I2cConfig::new().baudrate(Hertz(pins::I2C_FREQ_HZ));
    let i2c0 = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &i2c_cfg,
    )?;
    let i2c1 = I2cDriver::new(
        peripherals.i2c1,
        peripherals.pins.gpio3,
        peripherals.pins.gpio4,
        &i2c_cfg,
    )?;
    let mut readings_lcd = Lcd::new(i2c0, Ets, pins::LCD_READINGS_ADDR, LCD_COLS as u8, LCD_ROWS as u8);
    let mut status_lcd = Lcd::new(i2c1, Ets, pins::LCD_STATUS_ADDR, LCD_COLS as u8, LCD_ROWS as u8);
    readings_lcd.init();
    status_lcd.init();
    pages::draw_line(&mut readings_lcd, 0, &pages::line(format_args!("EnvGuard starting")));

    // ── 4. WiFi + SNTP ────────────────────────────────────────
    let mut wifi = WifiAdapter::start(
        peripherals.modem,
        sysloop,
        Some(nvs),
        &config.wifi_ssid,
        &config.wifi_password,
    )?;
    if wifi.wait_link_up(WIFI_CONNECT_TIMEOUT_MS) {
        info!("WiFi: link up");
    } else {
        warn!("WiFi: no link after {} ms, continuing offline", WIFI_CONNECT_TIMEOUT_MS);
    }

    // SAFETY: single-threaded at this point; nothing else reads the env.
    unsafe { std::env::set_var("TZ", posix_tz(config.utc_offset_secs).as_str()) };
    unsafe { esp_idf_svc::sys::tzset() };
    let sntp_conf = SntpConf {
        servers: [config.ntp_server.as_str()],
        ..Default::default()
    };
    let _sntp = EspSntp::new(&sntp_conf)?;

    // ── 5. Board + clean-air calibration (blocking) ───────────
    let mut hw = HardwareAdapter::new();
    pages::draw_line(&mut readings_lcd, 1, &pages::line(format_args!("Calibrating MQ-7...")));
    let r0_kohm = gas::calibrate(
        &mut hw,
        &mut FreeRtos,
        config.gas_calibration_samples,
        config.gas_calibration_interval_ms,
        config.gas_r0_kohm,
    );
    readings_lcd.clear();

    // ── 6. Identity + broker ──────────────────────────────────
    let mac = device_id::read_mac();
    let dev_id = device_id::device_id(&mac);
    info!("Device ID: {}", dev_id);
    let mut broker = MqttAdapter::new(&config.broker_url, &dev_id);

    let clock = Esp32TimeAdapter::new();
    let mut log_sink = LogEventSink::new();
    let mut watchdog = Watchdog::default();

    // ── 7. Scheduler ──────────────────────────────────────────
    let mut sched = Scheduler::new(config, r0_kohm, &dev_id);
    {
        let mut io = Io {
            board: &mut hw,
            readings_display: &mut readings_lcd,
            status_display: &mut status_lcd,
            broker: &mut broker,
            link: &mut wifi,
            clock: &clock,
            sink: &mut log_sink,
        };
        sched.start(&mut io);
    }

    info!("System ready. Entering control loop.");

    loop {
        let now_ms = clock.uptime_ms();
        let mut io = Io {
            board: &mut hw,
            readings_display: &mut readings_lcd,
            status_display: &mut status_lcd,
            broker: &mut broker,
            link: &mut wifi,
            clock: &clock,
            sink: &mut log_sink,
        };
        sched.run_pass(now_ms, &mut io);
        watchdog.feed();
        FreeRtos::delay_ms(LOOP_IDLE_MS);
    }
}
