//! Decay cycle: per-tick volume step and delay computation.
//!
//! The delay to the next tick is the remaining time divided by the volume
//! steps still to go, so the cadence speeds up as the volume drops and the
//! final step lands on the end time.

use crate::types::{DeviceSnapshot, FadePolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    TargetUnavailable,
    PoweredOff,
    VolumeZero,
    VolumeRaised { observed: u8, expected: u8 },
}

impl AbortReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TargetUnavailable => "target unavailable",
            Self::PoweredOff => "device powered off",
            Self::VolumeZero => "device volume is zero",
            Self::VolumeRaised { .. } => "volume changed manually",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stop without touching the device.
    Abort(AbortReason),
    /// Last step reached: switch the device off.
    Finish,
    /// The end time passed before the volume ran out.
    Expired,
    /// Set the volume and wait `delay_secs` for the next tick.
    Step { volume: u8, delay_secs: u64 },
}

/// Seconds until the next tick, or `None` once no time or no steps remain.
pub fn next_delay_secs(remaining_secs: i64, steps: u8) -> Option<u64> {
    if remaining_secs <= 0 || steps == 0 {
        return None;
    }
    // f64::round rounds half away from zero.
    Some((remaining_secs as f64 / f64::from(steps)).round() as u64)
}

pub fn plan_tick(
    policy: FadePolicy,
    cycling_volume: u8,
    device: &DeviceSnapshot,
    remaining_secs: i64,
) -> TickOutcome {
    let (Some(power), Some(volume)) = (device.power, device.volume) else {
        return TickOutcome::Abort(AbortReason::TargetUnavailable);
    };
    if !power {
        return TickOutcome::Abort(AbortReason::PoweredOff);
    }
    if volume == 0 {
        return TickOutcome::Abort(AbortReason::VolumeZero);
    }
    if volume > cycling_volume.saturating_add(1) {
        return TickOutcome::Abort(AbortReason::VolumeRaised {
            observed: volume,
            expected: cycling_volume,
        });
    }

    let current = match policy {
        FadePolicy::Decrement => cycling_volume,
        FadePolicy::Resync => volume,
    };
    if current <= 1 {
        return TickOutcome::Finish;
    }

    let next = current - 1;
    match next_delay_secs(remaining_secs, next) {
        Some(delay_secs) => TickOutcome::Step {
            volume: next,
            delay_secs,
        },
        None => TickOutcome::Expired,
    }
}
