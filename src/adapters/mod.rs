//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                  |
//! |----------------|--------------------|------------------------------|
//! | `hardware`     | SensorPort         | HC-SR04, MQ-2 via ADC1       |
//! |                | ActuatorPort       | H-bridge PWM, buzzer GPIO    |
//! | `display`      | DisplayPort        | Serial log (face bitmap)     |
//! | `log_sink`     | EventSink          | Serial log output            |
//! | `channel_sink` | EventSink          | Websocket broadcast channel  |
//! | `time`         | (clock)            | ESP32 system timer           |
//! | `wifi`         | (bring-up)         | ESP-IDF WiFi STA             |
//! | `web`          | (transport)        | ESP-IDF HTTP + websocket     |
//!
//! The inbound side is [`ChannelInbound`](crate::protocol::channels::ChannelInbound).

pub mod channel_sink;
pub mod display;
pub mod hardware;
pub mod log_sink;
pub mod time;
#[cfg(target_os = "espidf")]
pub mod web;
pub mod wifi;
