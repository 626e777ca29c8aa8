//! One-shot hardware peripheral initialization and raw register helpers.
//!
//! GPIO and LEDC are owned through `esp-idf-hal` drivers built in `main()`;
//! the ADC1 oneshot unit is configured here with raw ESP-IDF sys calls
//! because the smoke sensor only needs a single channel read per sample.
//! Called once from `main()` before the control loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    AdcChannelFailed { channel: u32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::AdcChannelFailed { channel, rc } => {
                write!(f, "ADC1 channel {} config failed (rc={})", channel, rc)
            }
        }
    }
}

impl std::error::Error for HwInitError {}

/// ADC1 channel wired to the smoke sensor (GPIO 36).
pub const ADC1_CH_SMOKE: u32 = 0;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the control loop; single-threaded.
    unsafe {
        init_adc()?;
    }
    info!("hw_init: all peripherals configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_peripherals() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): peripheral init skipped");
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the init path or the control-loop
/// sampling path.  `init_adc()` completes before the loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
unsafe fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    // 12 dB attenuation: full 0–3.3 V swing of the MQ-2 module.
    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), ADC1_CH_SMOKE, &chan_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcChannelFailed {
            channel: ADC1_CH_SMOKE,
            rc: ret,
        });
    }

    info!("hw_init: ADC1 configured (CH0=smoke)");
    Ok(())
}

/// One oneshot conversion.
///
/// `None` when the unit never came up or the driver rejects the read.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Option<u16> {
    // SAFETY: adc1_handle() contract, control-loop access only.
    let handle = unsafe { adc1_handle() };
    if handle.is_null() {
        return None;
    }
    let mut raw: i32 = 0;
    // SAFETY: handle is a live oneshot unit created by init_adc().
    let ret = unsafe { adc_oneshot_read(handle, channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return None;
    }
    Some(raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Option<u16> {
    None
}

// ── Microsecond clock ─────────────────────────────────────────

/// Free-running microseconds since boot, for echo pulse timing.
#[cfg(target_os = "espidf")]
pub fn micros() -> u64 {
    // SAFETY: esp_timer_get_time is a read of the monotonic system timer.
    (unsafe { esp_timer_get_time() }) as u64
}

#[cfg(not(target_os = "espidf"))]
pub fn micros() -> u64 {
    use std::sync::OnceLock;
    use std::time::Instant;

    static START: OnceLock<Instant> = OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_micros() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_clock_is_monotonic() {
        let a = micros();
        let b = micros();
        assert!(b >= a);
    }

    #[test]
    fn sim_adc_has_no_unit() {
        assert_eq!(adc1_read(ADC1_CH_SMOKE), None);
    }

    #[test]
    fn init_error_names_channel() {
        let e = HwInitError::AdcChannelFailed { channel: 0, rc: -1 };
        assert_eq!(e.to_string(), "ADC1 channel 0 config failed (rc=-1)");
    }
}
