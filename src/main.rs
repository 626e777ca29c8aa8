//! EMU robot firmware, main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  HardwareAdapter   LogDisplay   LogEventSink + ChannelSink   │
//! │  (Sensor+Actuator) (Display)    (EventSink fan-out)          │
//! │  web (HTTP + ws) ──▶ channels ──▶ ChannelInbound             │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │          ControlLoop / RobotService                │      │
//! │  │  Safety · Expression · Routines · Dispatch         │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::PinDriver;
use esp_idf_hal::ledc::{LedcDriver, LedcTimerDriver, config::TimerConfig};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::Hertz;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use emubot::adapters::channel_sink::ChannelSink;
use emubot::adapters::display::LogDisplay;
use emubot::adapters::hardware::HardwareAdapter;
use emubot::adapters::log_sink::LogEventSink;
use emubot::adapters::time::{self, Esp32TimeAdapter};
use emubot::adapters::{web, wifi};
use emubot::app::control_loop::ControlLoop;
use emubot::config::RobotConfig;
use emubot::drivers::buzzer::Buzzer;
use emubot::drivers::hw_init;
use emubot::drivers::motor::{DriveTrain, HBridge};
use emubot::pins;
use emubot::protocol::channels::ChannelInbound;
use emubot::sensors::smoke::SmokeSensor;
use emubot::sensors::ultrasonic::UltrasonicRanger;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  EMU robot v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = RobotConfig::default();
    config.validate()?;

    // ── 2. Peripherals ────────────────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Smoke reads as unavailable; the ranger still guards motion.
        error!("ADC init failed: {e}, smoke sensing degraded");
    }
    let p = Peripherals::take()?;
    let io = p.pins;

    // GPIO numbers follow `pins.rs`.
    let ranger = UltrasonicRanger::new(
        PinDriver::output(io.gpio5)?,
        PinDriver::input(io.gpio18)?,
        Ets,
        hw_init::micros,
    );
    let smoke = SmokeSensor::new(pins::SMOKE_ADC_GPIO);

    let pwm_timer = LedcTimerDriver::new(
        p.ledc.timer0,
        &TimerConfig::default().frequency(Hertz(pins::MOTOR_PWM_FREQ_HZ)),
    )?;
    let left = HBridge::new(
        PinDriver::output(io.gpio25)?,
        PinDriver::output(io.gpio26)?,
        LedcDriver::new(p.ledc.channel0, &pwm_timer, io.gpio32)?,
    );
    let right = HBridge::new(
        PinDriver::output(io.gpio27)?,
        PinDriver::output(io.gpio14)?,
        LedcDriver::new(p.ledc.channel1, &pwm_timer, io.gpio33)?,
    );
    let buzzer = Buzzer::new(PinDriver::output(io.gpio4)?);

    let mut hw = HardwareAdapter::new(ranger, smoke, DriveTrain::new(left, right), buzzer);

    // ── 3. Network ────────────────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;
    let creds = wifi::WifiCredentials::from_build_env()?;
    let _wifi = wifi::connect(p.modem, sysloop, nvs, &creds)?;
    let _server = web::start()?;

    // ── 4. Control loop ───────────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let period = Duration::from_millis(u64::from(config.loop_interval_ms));
    let mut display = LogDisplay::new();
    let mut sink = (LogEventSink::new(), ChannelSink::new(time::uptime_ms));
    let mut inbound = ChannelInbound::new();

    let mut control = ControlLoop::new(config);
    control.start(&mut hw, clock.uptime_ms());
    info!("System ready. Entering control loop.");

    loop {
        let started = clock.uptime_ms();
        control.iterate(started, &mut hw, &mut display, &mut sink, &mut inbound);

        let spent = Duration::from_millis(clock.uptime_ms().saturating_sub(started));
        match period.checked_sub(spent) {
            Some(rest) => std::thread::sleep(rest),
            None => warn!("loop overran: {}ms", spent.as_millis()),
        }
    }
}
