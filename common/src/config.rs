use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::schedule::{DaysMask, WindowSpec};
use crate::types::{FadePolicy, TargetKind, TargetRef};

pub const MIN_DURATION_MINUTES: u16 = 15;
pub const MAX_DURATION_MINUTES: u16 = 120;
pub const MAX_PRESET: u8 = 6;
pub const MAX_RESTORE_PAUSE_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub power: Option<TargetRef>,
    pub volume: Option<TargetRef>,
    #[serde(default)]
    pub preset: Option<TargetRef>,
}

impl TargetConfig {
    pub fn classify(&self, sender: TargetRef) -> Option<TargetKind> {
        if self.power == Some(sender) {
            Some(TargetKind::Power)
        } else if self.volume == Some(sender) {
            Some(TargetKind::Volume)
        } else if self.preset == Some(sender) {
            Some(TargetKind::Preset)
        } else {
            None
        }
    }
}

/// Settings used when the weekly schedule starts the timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleProfile {
    #[serde(rename = "use")]
    pub enabled: bool,
    #[serde(rename = "startSeconds")]
    pub start_seconds: u32,
    #[serde(rename = "durationMinutes")]
    pub duration_minutes: u16,
    pub volume: u8,
    pub preset: u8,
}

impl ScheduleProfile {
    fn sanitize(&mut self, max_volume: u8) {
        self.start_seconds %= 24 * 3600;
        self.duration_minutes = self
            .duration_minutes
            .clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES);
        self.volume = self.volume.clamp(1, max_volume);
        self.preset = self.preset.min(MAX_PRESET);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub targets: TargetConfig,
    pub policy: FadePolicy,
    #[serde(rename = "maxVolume")]
    pub max_volume: u8,
    #[serde(rename = "restoreVolume")]
    pub restore_volume: bool,
    #[serde(rename = "restorePauseMs")]
    pub restore_pause_ms: u64,
    pub weekday: ScheduleProfile,
    pub weekend: ScheduleProfile,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            targets: TargetConfig::default(),
            policy: FadePolicy::Resync,
            max_volume: 100,
            restore_volume: false,
            restore_pause_ms: 1_000,
            weekday: ScheduleProfile {
                enabled: true,
                start_seconds: 22 * 3600 + 30 * 60,
                duration_minutes: 60,
                volume: 10,
                preset: 0,
            },
            weekend: ScheduleProfile {
                enabled: true,
                start_seconds: 23 * 3600 + 30 * 60,
                duration_minutes: 30,
                volume: 10,
                preset: 0,
            },
        }
    }
}

impl TimerConfig {
    pub fn sanitize(&mut self) {
        self.max_volume = self.max_volume.max(1);
        self.restore_pause_ms = self.restore_pause_ms.min(MAX_RESTORE_PAUSE_MS);
        self.weekday.sanitize(self.max_volume);
        self.weekend.sanitize(self.max_volume);
    }

    /// Monday to Friday use the weekday profile, Saturday and Sunday the weekend one.
    pub fn profile_for(&self, weekday: Weekday) -> &ScheduleProfile {
        if weekday.number_from_monday() <= 5 {
            &self.weekday
        } else {
            &self.weekend
        }
    }

    /// Window specifications for the two-group weekday/weekend schedule.
    pub fn profile_windows(&self) -> Vec<WindowSpec> {
        vec![
            WindowSpec {
                enabled: self.weekday.enabled,
                days: DaysMask::MONDAY_TO_FRIDAY,
                start_seconds: self.weekday.start_seconds,
                duration_minutes: u32::from(self.weekday.duration_minutes),
            },
            WindowSpec {
                enabled: self.weekend.enabled,
                days: DaysMask::WEEKEND,
                start_seconds: self.weekend.start_seconds,
                duration_minutes: u32::from(self.weekend.duration_minutes),
            },
        ]
    }
}

/// Values the user adjusts for a manual start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSettings {
    pub volume: u8,
    pub preset: u8,
    #[serde(rename = "durationMinutes")]
    pub duration_minutes: u16,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        Self {
            volume: 50,
            preset: 1,
            duration_minutes: 30,
        }
    }
}

impl PersistedSettings {
    pub fn sanitize(&mut self, max_volume: u8) {
        self.volume = self.volume.clamp(1, max_volume.max(1));
        self.preset = self.preset.min(MAX_PRESET);
        self.duration_minutes = self
            .duration_minutes
            .clamp(MIN_DURATION_MINUTES, MAX_DURATION_MINUTES);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub mqtt_host: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_pass: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            mqtt_host: "127.0.0.1".to_string(),
            mqtt_port: 1883,
            mqtt_user: String::new(),
            mqtt_pass: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub timer: TimerConfig,
    pub settings: PersistedSettings,
    pub timezone: String,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            settings: PersistedSettings::default(),
            timezone: "Europe/Berlin".to_string(),
            network: NetworkConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn sanitize(&mut self) {
        self.timer.sanitize();
        self.settings.sanitize(self.timer.max_volume);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn sanitize_clamps_manual_settings() {
        let mut settings = PersistedSettings {
            volume: 0,
            preset: 9,
            duration_minutes: 600,
        };
        settings.sanitize(40);

        assert_eq!(
            settings,
            PersistedSettings {
                volume: 1,
                preset: 6,
                duration_minutes: 120,
            }
        );

        settings.volume = 90;
        settings.duration_minutes = 5;
        settings.sanitize(40);
        assert_eq!(settings.volume, 40);
        assert_eq!(settings.duration_minutes, 15);
    }

    #[test]
    fn weekend_days_use_weekend_profile() {
        let config = TimerConfig::default();

        assert_eq!(config.profile_for(Weekday::Fri).duration_minutes, 60);
        assert_eq!(config.profile_for(Weekday::Sat).duration_minutes, 30);
        assert_eq!(config.profile_for(Weekday::Sun).duration_minutes, 30);
    }

    #[test]
    fn classifies_senders_by_target() {
        let targets = TargetConfig {
            power: TargetRef::new(10),
            volume: TargetRef::new(11),
            preset: None,
        };

        assert_eq!(
            targets.classify(TargetRef::new(10).unwrap()),
            Some(TargetKind::Power)
        );
        assert_eq!(
            targets.classify(TargetRef::new(11).unwrap()),
            Some(TargetKind::Volume)
        );
        assert_eq!(targets.classify(TargetRef::new(12).unwrap()), None);
    }

    #[test]
    fn runtime_config_reads_partial_json() {
        let raw = r#"{
            "timer": {
                "targets": { "power": 10, "volume": 11 },
                "policy": "decrement",
                "maxVolume": 30,
                "restoreVolume": true,
                "restorePauseMs": 500,
                "weekday": { "use": true, "startSeconds": 79200, "durationMinutes": 45, "volume": 12, "preset": 2 },
                "weekend": { "use": false, "startSeconds": 82800, "durationMinutes": 30, "volume": 8, "preset": 0 }
            },
            "settings": { "volume": 20, "preset": 0, "durationMinutes": 60 },
            "timezone": "Europe/Berlin"
        }"#;

        let mut runtime: RuntimeConfig = serde_json::from_str(raw).unwrap();
        runtime.sanitize();

        assert_eq!(runtime.timer.policy, FadePolicy::Decrement);
        assert_eq!(runtime.timer.targets.preset, None);
        assert_eq!(runtime.timer.weekday.duration_minutes, 45);
        assert_eq!(runtime.network.mqtt_port, 1883);
    }
}
