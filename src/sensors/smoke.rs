//! MQ-2 smoke / particulate sensor driver.
//!
//! The analog output is read through ADC1 and reported as a percentage of
//! full scale.  There is no calibration to ppm; the safety threshold is
//! expressed in the same percent units.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH0 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection, with a
//! fault flag standing in for a failed conversion.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

#[cfg(not(target_os = "espidf"))]
static SIM_SMOKE_ADC: AtomicU16 = AtomicU16::new(0);
#[cfg(not(target_os = "espidf"))]
static SIM_SMOKE_FAULT: AtomicBool = AtomicBool::new(false);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_smoke_adc(raw: u16) {
    SIM_SMOKE_ADC.store(raw, Ordering::Relaxed);
}

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_smoke_fault(fault: bool) {
    SIM_SMOKE_FAULT.store(fault, Ordering::Relaxed);
}

/// Full-scale value of the 12-bit ADC.
pub const ADC_FULL_SCALE: u16 = 4095;

/// Rescale a raw ADC value to `[0, 100]` percent.
pub fn raw_to_percent(raw: u16) -> f32 {
    f32::from(raw.min(ADC_FULL_SCALE)) / f32::from(ADC_FULL_SCALE) * 100.0
}

pub struct SmokeSensor {
    _adc_gpio: i32,
}

impl SmokeSensor {
    pub fn new(adc_gpio: i32) -> Self {
        Self { _adc_gpio: adc_gpio }
    }

    /// Raw 12-bit reading, `None` if the conversion failed.
    pub fn read_raw(&self) -> Option<u16> {
        self.read_adc().map(|raw| raw.min(ADC_FULL_SCALE))
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Option<u16> {
        hw_init::adc1_read(hw_init::ADC1_CH_SMOKE)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Option<u16> {
        if SIM_SMOKE_FAULT.load(Ordering::Relaxed) {
            return None;
        }
        Some(SIM_SMOKE_ADC.load(Ordering::Relaxed))
    }
}
