//! GPIO / peripheral pin assignments for the EMU main board (ESP32 DevKit).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  The device binary uses the same numbers when it
//! takes ownership of the `esp-idf-hal` pin singletons.

// ---------------------------------------------------------------------------
// Ultrasonic ranger (HC-SR04)
// ---------------------------------------------------------------------------

/// Digital output: 10 µs HIGH pulse starts a ping.
pub const ULTRASONIC_TRIG_GPIO: i32 = 5;
/// Digital input: HIGH for the round-trip time of the ping.
pub const ULTRASONIC_ECHO_GPIO: i32 = 18;

// ---------------------------------------------------------------------------
// Smoke sensor (MQ-2), analog on ADC1
// ---------------------------------------------------------------------------

/// ADC1 channel 0 (GPIO 36 / SENSOR_VP on ESP32).
pub const SMOKE_ADC_GPIO: i32 = 36;

// ---------------------------------------------------------------------------
// Buzzer (active, driven HIGH = on)
// ---------------------------------------------------------------------------

pub const BUZZER_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// Motor driver (L298N dual H-bridge)
// ---------------------------------------------------------------------------

/// Left wheel direction inputs (IN1 / IN2).
pub const MOTOR_LEFT_IN1_GPIO: i32 = 25;
pub const MOTOR_LEFT_IN2_GPIO: i32 = 26;
/// Right wheel direction inputs (IN3 / IN4).
pub const MOTOR_RIGHT_IN1_GPIO: i32 = 27;
pub const MOTOR_RIGHT_IN2_GPIO: i32 = 14;

/// Enable lines, LEDC PWM.
pub const MOTOR_LEFT_PWM_GPIO: i32 = 32;
pub const MOTOR_RIGHT_PWM_GPIO: i32 = 33;

/// Motor PWM frequency (Hz).  8-bit resolution, duty 0–255.
pub const MOTOR_PWM_FREQ_HZ: u32 = 5_000;

// ---------------------------------------------------------------------------
// Face display (SSD1306 128x64, I2C)
// ---------------------------------------------------------------------------

pub const OLED_SDA_GPIO: i32 = 21;
pub const OLED_SCL_GPIO: i32 = 22;
pub const OLED_I2C_ADDR: u8 = 0x3C;
