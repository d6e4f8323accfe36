//! One-shot hardware peripheral initialization.
//!
//! Configures the ADC channels, the liveness output and the edge input
//! using raw ESP-IDF sys calls. Called once from `main()` before any task
//! starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc)    => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

#[cfg(target_os = "espidf")]
use crate::app::edge::EdgeLatch;
#[cfg(target_os = "espidf")]
use crate::pins;

/// ADC1 channel of the light sensor (GPIO 1).
pub const ADC1_CH_LIGHT: u32 = 0;
/// ADC1 channel of the temperature sensor (GPIO 2).
pub const ADC1_CH_TEMP: u32 = 1;

#[cfg(target_os = "espidf")]
pub fn init_peripherals() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before any task is spawned.
    unsafe {
        init_adc()?;
        init_gpio_output()?;
        init_gpio_input()?;
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

/// SAFETY: `ADC1_HANDLE` is written once by `init_adc()` before any task
/// starts and only read afterwards.
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
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for channel in [ADC1_CH_LIGHT, ADC1_CH_TEMP] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }
    }

    info!(
        "hw_init: ADC1 configured (CH{}=light on GPIO{}, CH{}=temp on GPIO{})",
        ADC1_CH_LIGHT, pins::LIGHT_ADC_GPIO, ADC1_CH_TEMP, pins::TEMP_ADC_GPIO
    );
    Ok(())
}

/// Read one 12-bit conversion.  A failed read yields 0.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> u16 {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract; the oneshot driver serialises reads.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return 0;
    }
    raw.max(0) as u16
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> u16 {
    0
}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_output() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::LIVENESS_GPIO,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }
    unsafe { gpio_set_level(pins::LIVENESS_GPIO, 0) };

    info!("hw_init: liveness output on GPIO{}", pins::LIVENESS_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn init_gpio_input() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::EDGE_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        // Trigger type is set with the ISR; detection starts disabled.
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::GpioConfigFailed(ret)); }

    info!("hw_init: edge input on GPIO{} (pull-up, falling edge)", pins::EDGE_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured input.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: pin was configured as an output in init_gpio_output().
    unsafe { gpio_set_level(pin, if high { 1 } else { 0 }); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

/// Enable the interrupt on `pin`.  Used for the first arm and after each
/// delivery, since the ISR disables it.
#[cfg(target_os = "espidf")]
pub fn gpio_arm(pin: i32) {
    // SAFETY: register write on a pin registered with the ISR service.
    unsafe { gpio_intr_enable(pin); }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_arm(_pin: i32) {}

// ── GPIO ISR Service ──────────────────────────────────────────

/// Falling-edge ISR.  `arg` is the `&'static EdgeLatch` passed at registration.
///
/// Disarms itself; the handler task re-arms through `gpio_arm`.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn edge_gpio_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: register accesses; safe in ISR context.
    unsafe { gpio_intr_disable(pins::EDGE_GPIO) };
    let level = unsafe { gpio_get_level(pins::EDGE_GPIO) } != 0;
    // SAFETY: arg was created from a &'static EdgeLatch in init_isr_service().
    let latch = unsafe { &*(arg as *const EdgeLatch) };
    latch.raise(level);
}

/// Install the per-pin GPIO ISR service and attach the edge input to `latch`.
///
/// The pin interrupt is left disabled until `gpio_arm`.
#[cfg(target_os = "espidf")]
pub fn init_isr_service(latch: &'static EdgeLatch) -> Result<(), HwInitError> {
    // SAFETY: ESP_ERR_INVALID_STATE means the service is already installed.
    // The latch outlives the registration because it is 'static.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        gpio_intr_disable(pins::EDGE_GPIO);
        gpio_set_intr_type(pins::EDGE_GPIO, gpio_int_type_t_GPIO_INTR_NEGEDGE);
        let ret = gpio_isr_handler_add(
            pins::EDGE_GPIO,
            Some(edge_gpio_isr),
            latch as *const EdgeLatch as *mut core::ffi::c_void,
        );
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
    }
    info!("hw_init: ISR service installed (edge GPIO{})", pins::EDGE_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service(_latch: &'static crate::app::edge::EdgeLatch) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}
