//! Power monitor: battery voltage sampling and percentage mapping.
//!
//! The buzzer runs from an 18650 Li-ion cell behind a 1 M + 1 M voltage
//! divider. Raw ADC counts are converted to millivolts from the sampling
//! hardware's reference, gain and resolution, scaled back up by the divider
//! ratio, then mapped to a percentage on a four-segment curve calibrated to
//! the Li-ion discharge profile. A board without a sense channel degrades to
//! a fixed full-battery stub instead of failing the device.

/// Minimum interval between samples. Sampling more often burns power for no
/// information; a Li-ion cell does not move a percent in under five minutes.
pub const BATTERY_UPDATE_INTERVAL_MS: u64 = 300_000;

/// Level at or below which a warning is logged.
pub const LOW_BATTERY_WARN_PCT: u8 = 10;

/// Error from the battery sense channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SenseError {
    /// The sampling hardware is not present or not ready.
    Unavailable,
    /// A conversion was started but failed.
    Read,
}

/// One-shot battery voltage sampling, implemented per board revision.
pub trait BatterySense {
    /// Sample the sense channel, returning raw ADC counts.
    fn sample(&mut self) -> Result<u16, SenseError>;
}

/// Sampling hardware parameters used to recover true battery millivolts
/// from raw counts.
#[derive(Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdcConfig {
    /// Internal reference voltage in millivolts.
    pub reference_mv: u32,
    /// Inverse of the channel gain (gain 1/6 => 6).
    pub gain_inv: u32,
    /// Conversion resolution in bits.
    pub resolution_bits: u8,
    /// Voltage divider ratio between battery and ADC pin (1 M + 1 M => 2).
    pub divider_ratio: u32,
}

impl Default for AdcConfig {
    /// Values for the production board: 600 mV internal reference, gain 1/6,
    /// 12-bit conversions, 1:1 divider.
    fn default() -> Self {
        Self {
            reference_mv: 600,
            gain_inv: 6,
            resolution_bits: 12,
            divider_ratio: 2,
        }
    }
}

/// Convert raw ADC counts to battery millivolts.
#[must_use]
pub fn counts_to_millivolts(raw: u16, adc: &AdcConfig) -> u32 {
    let full_scale_mv = adc.reference_mv * adc.gain_inv;
    let pin_mv = (u32::from(raw) * full_scale_mv) >> adc.resolution_bits;
    pin_mv * adc.divider_ratio
}

/// Map battery millivolts to a percentage on the Li-ion discharge curve.
///
/// Monotonically non-decreasing in voltage, saturating at 0 and 100 outside
/// the 3000-4200 mV range. Segment breakpoints follow the cell's flat
/// mid-discharge region: the 3700-4000 mV band covers 50-80% while the steep
/// tail below 3400 mV covers only the last 20%.
#[must_use]
pub fn percent_from_millivolts(mv: u32) -> u8 {
    match mv {
        _ if mv >= 4200 => 100,
        4000.. => (80 + (mv - 4000) / 10) as u8,
        3700.. => (50 + (mv - 3700) / 10) as u8,
        3400.. => (20 + (mv - 3400) / 10) as u8,
        3000.. => ((mv - 3000) / 20) as u8,
        _ => 0,
    }
}

/// Rate-limited battery monitor.
///
/// [`poll`](PowerMonitor::poll) is cheap to call from the main loop at any
/// frequency; it samples at most once per [`BATTERY_UPDATE_INTERVAL_MS`] and
/// reports a value only when it differs from the last reported one by at
/// least a percentage point, so the radio is not woken for noise.
pub struct PowerMonitor<S> {
    sense: Option<S>,
    adc: AdcConfig,
    interval_ms: u64,
    level: u8,
    millivolts: Option<u32>,
    last_sample_ms: Option<u64>,
    last_reported: Option<u8>,
}

impl<S: BatterySense> PowerMonitor<S> {
    /// Monitor backed by real sampling hardware.
    #[must_use]
    pub fn new(sense: S, adc: AdcConfig) -> Self {
        Self {
            sense: Some(sense),
            adc,
            interval_ms: BATTERY_UPDATE_INTERVAL_MS,
            level: 100,
            millivolts: None,
            last_sample_ms: None,
            last_reported: None,
        }
    }

    /// Degraded monitor for boards without a sense channel: reports a fixed
    /// full battery once and stays quiet.
    #[must_use]
    pub fn stub() -> Self {
        Self {
            sense: None,
            adc: AdcConfig::default(),
            interval_ms: BATTERY_UPDATE_INTERVAL_MS,
            level: 100,
            millivolts: None,
            last_sample_ms: None,
            last_reported: None,
        }
    }

    /// Override the sampling interval.
    #[must_use]
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Sample if due and return a level that should be propagated to the
    /// battery characteristic, or `None` when nothing changed.
    pub fn poll(&mut self, now_ms: u64) -> Option<u8> {
        if let Some(last) = self.last_sample_ms {
            if now_ms.saturating_sub(last) < self.interval_ms {
                return None;
            }
        }
        self.last_sample_ms = Some(now_ms);

        let new_level = match self.sense.as_mut() {
            Some(sense) => match sense.sample() {
                Ok(raw) => {
                    let mv = counts_to_millivolts(raw, &self.adc);
                    self.millivolts = Some(mv);
                    percent_from_millivolts(mv)
                }
                Err(_err) => {
                    // Keep the last known level; a failed conversion is not
                    // worth a bogus notification.
                    #[cfg(feature = "defmt")]
                    defmt::warn!("battery sample failed: {}", _err);
                    return None;
                }
            },
            None => 100,
        };

        self.level = new_level;
        if self.last_reported == Some(new_level) {
            return None;
        }
        self.last_reported = Some(new_level);

        if new_level <= LOW_BATTERY_WARN_PCT {
            #[cfg(feature = "defmt")]
            defmt::warn!("low battery: {}%", new_level);
        }

        Some(new_level)
    }

    /// Last computed percentage.
    #[inline]
    #[must_use]
    pub const fn level(&self) -> u8 {
        self.level
    }

    /// Last measured battery voltage, if sensing hardware is present.
    #[inline]
    #[must_use]
    pub const fn millivolts(&self) -> Option<u32> {
        self.millivolts
    }
}
