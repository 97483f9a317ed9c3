use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Opaque reference to an externally controllable value (power switch,
/// volume control, preset selector). Zero is never a valid reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetRef(NonZeroU32);

impl TargetRef {
    pub fn new(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    pub fn id(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Power,
    Volume,
    Preset,
}

impl TargetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Volume => "volume",
            Self::Preset => "preset",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    Manual,
    Scheduled,
}

impl TimerMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Scheduled => "SCHEDULED",
        }
    }
}

/// How each decay tick derives the next volume step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FadePolicy {
    /// Step down from the stored cycling volume, ignoring the live reading.
    Decrement,
    /// Step down from the live device volume on every tick.
    Resync,
}

impl FadePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Decrement => "DECREMENT",
            Self::Resync => "RESYNC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimerPhase {
    Idle,
    Active,
}

impl TimerPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Active => "ACTIVE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Power(bool),
    Volume(u8),
    Preset(u8),
}

/// One idempotent command for an external target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCommand {
    pub target: TargetRef,
    pub kind: CommandKind,
}

impl DeviceCommand {
    pub fn power(target: TargetRef, on: bool) -> Self {
        Self {
            target,
            kind: CommandKind::Power(on),
        }
    }

    pub fn volume(target: TargetRef, volume: u8) -> Self {
        Self {
            target,
            kind: CommandKind::Volume(volume),
        }
    }

    pub fn preset(target: TargetRef, preset: u8) -> Self {
        Self {
            target,
            kind: CommandKind::Preset(preset),
        }
    }

    /// Wire payload understood by the device side.
    pub fn payload(&self) -> String {
        match self.kind {
            CommandKind::Power(on) => u8::from(on).to_string(),
            CommandKind::Volume(volume) => volume.to_string(),
            CommandKind::Preset(preset) => preset.to_string(),
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            CommandKind::Power(on) => write!(f, "power {} -> {}", self.target, on),
            CommandKind::Volume(volume) => write!(f, "volume {} -> {}", self.target, volume),
            CommandKind::Preset(preset) => write!(f, "preset {} -> {}", self.target, preset),
        }
    }
}

/// Live readings of the configured targets. `None` means the target is
/// not configured or has never reported a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub power: Option<bool>,
    pub volume: Option<u8>,
    pub preset_available: bool,
}

/// Payload of a value-changed notification. `previous` is `None` for the
/// first report of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueChange {
    pub value: i64,
    pub previous: Option<i64>,
}

impl ValueChange {
    pub fn as_bool(&self) -> bool {
        self.value != 0
    }

    pub fn is_repeat(&self) -> bool {
        self.previous == Some(self.value)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerStatus {
    pub active: bool,
    pub state: &'static str,
    pub mode: Option<&'static str>,
    pub policy: &'static str,
    #[serde(rename = "controlsLocked")]
    pub controls_locked: bool,
    pub volume: u8,
    pub preset: u8,
    #[serde(rename = "durationMinutes")]
    pub duration_minutes: u16,
    #[serde(rename = "startVolume")]
    pub start_volume: u8,
    #[serde(rename = "cyclingVolume")]
    pub cycling_volume: u8,
    #[serde(rename = "endTime")]
    pub end_time: i64,
    #[serde(rename = "finishesAt")]
    pub finishes_at: Option<String>,
    #[serde(rename = "remainingSecs")]
    pub remaining_secs: u64,
    #[serde(rename = "scheduleActive")]
    pub schedule_active: bool,
    #[serde(rename = "nextScheduleEventEpoch")]
    pub next_schedule_event_epoch: Option<i64>,
    #[serde(rename = "timeSynced")]
    pub time_synced: bool,
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimerStatePayload {
    pub active: bool,
    pub state: &'static str,
    #[serde(rename = "cyclingVolume")]
    pub cycling_volume: u8,
    #[serde(rename = "finishesAt")]
    pub finishes_at: Option<String>,
    #[serde(rename = "remainingMin")]
    pub remaining_min: u64,
}
