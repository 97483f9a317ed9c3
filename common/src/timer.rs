use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    config::{PersistedSettings, TimerConfig},
    decay::{self, TickOutcome},
    error::TimerError,
    schedule::{self, ScheduleAction, WeeklySchedule},
    types::{
        DeviceCommand, DeviceSnapshot, FadePolicy, TargetKind, TargetRef, TimerMode, TimerPhase,
        TimerStatePayload, TimerStatus, ValueChange,
    },
};

pub const FINISHES_AT_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerAction {
    Command(DeviceCommand),
    /// Pause between two device commands, in milliseconds.
    Delay(u64),
    /// (Re-)arm the one-shot decay tick, in seconds.
    ArmTick(u64),
    CancelTick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Toggle { on: bool, mode: TimerMode },
    Tick,
    PowerChanged(ValueChange),
    VolumeChanged(ValueChange),
    ScheduleFired,
    KernelReady,
}

/// Inputs the host supplies alongside every event.
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub now: DateTime<FixedOffset>,
    pub device: &'a DeviceSnapshot,
    pub schedule: Option<&'a WeeklySchedule>,
}

/// Persisted fade progress. All fields are zero while idle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub active: bool,
    #[serde(default)]
    pub mode: Option<TimerMode>,
    #[serde(rename = "startVolume")]
    pub start_volume: u8,
    #[serde(rename = "cyclingVolume")]
    pub cycling_volume: u8,
    #[serde(rename = "endTime")]
    pub end_time: i64,
}

impl TimerState {
    pub fn phase(&self) -> TimerPhase {
        if self.active {
            TimerPhase::Active
        } else {
            TimerPhase::Idle
        }
    }

    fn is_consistent(&self) -> bool {
        if self.active {
            self.end_time > 0 && self.cycling_volume <= self.start_volume
        } else {
            self.cycling_volume == 0 && self.end_time == 0
        }
    }
}

#[derive(Debug, Clone)]
pub struct SleepTimerEngine {
    pub config: TimerConfig,
    settings: PersistedSettings,
    state: TimerState,
}

impl SleepTimerEngine {
    pub fn new(
        mut config: TimerConfig,
        mut settings: PersistedSettings,
        state: TimerState,
    ) -> Self {
        config.sanitize();
        settings.sanitize(config.max_volume);
        let state = if state.is_consistent() {
            state
        } else {
            warn!("discarding inconsistent persisted timer state: {state:?}");
            TimerState::default()
        };
        Self {
            config,
            settings,
            state,
        }
    }

    pub fn settings(&self) -> &PersistedSettings {
        &self.settings
    }

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.active
    }

    pub fn controls_locked(&self) -> bool {
        self.state.active
    }

    pub fn set_volume(&mut self, volume: u8) -> Result<bool, TimerError> {
        self.ensure_unlocked()?;
        let clamped = volume.clamp(1, self.config.max_volume);
        Ok(replace_if_changed(&mut self.settings.volume, clamped))
    }

    pub fn set_preset(&mut self, preset: u8) -> Result<bool, TimerError> {
        self.ensure_unlocked()?;
        let clamped = preset.min(crate::config::MAX_PRESET);
        Ok(replace_if_changed(&mut self.settings.preset, clamped))
    }

    pub fn set_duration(&mut self, minutes: u16) -> Result<bool, TimerError> {
        self.ensure_unlocked()?;
        let clamped = minutes.clamp(
            crate::config::MIN_DURATION_MINUTES,
            crate::config::MAX_DURATION_MINUTES,
        );
        Ok(replace_if_changed(&mut self.settings.duration_minutes, clamped))
    }

    pub fn replace_config(&mut self, mut config: TimerConfig) -> Result<(), TimerError> {
        self.ensure_unlocked()?;
        config.sanitize();
        self.settings.sanitize(config.max_volume);
        self.config = config;
        Ok(())
    }

    pub fn handle_event(
        &mut self,
        event: TimerEvent,
        ctx: &EventContext<'_>,
    ) -> Result<Vec<TimerAction>, TimerError> {
        debug!("timer event: {event:?}");
        match event {
            TimerEvent::Toggle { on: true, mode } => self.activate(mode, ctx.now, ctx.device),
            TimerEvent::Toggle { on: false, .. } => Ok(self.deactivate()),
            TimerEvent::Tick => Ok(self.on_tick(ctx.now, ctx.device)),
            TimerEvent::PowerChanged(change) => Ok(self.on_power_changed(change)),
            TimerEvent::VolumeChanged(change) => Ok(self.on_volume_changed(change)),
            TimerEvent::ScheduleFired => {
                Ok(self.on_schedule_fired(ctx.now, ctx.schedule, ctx.device))
            }
            TimerEvent::KernelReady => Ok(self.resume(ctx.now)),
        }
    }

    pub fn activate(
        &mut self,
        mode: TimerMode,
        now: DateTime<FixedOffset>,
        device: &DeviceSnapshot,
    ) -> Result<Vec<TimerAction>, TimerError> {
        let power = self
            .config
            .targets
            .power
            .filter(|_| device.power.is_some())
            .ok_or(TimerError::ConfigurationMissing(TargetKind::Power))?;
        let volume_target = self
            .config
            .targets
            .volume
            .filter(|_| device.volume.is_some())
            .ok_or(TimerError::ConfigurationMissing(TargetKind::Volume))?;

        let (volume, preset, duration_minutes) = match mode {
            TimerMode::Manual => (
                self.settings.volume,
                self.settings.preset,
                self.settings.duration_minutes,
            ),
            TimerMode::Scheduled => {
                let profile = self.config.profile_for(now.weekday());
                (profile.volume, profile.preset, profile.duration_minutes)
            }
        };
        let volume = volume.clamp(1, self.config.max_volume);
        let duration_secs = i64::from(duration_minutes) * 60;

        self.state = TimerState {
            active: true,
            mode: Some(mode),
            start_volume: volume,
            cycling_volume: match self.config.policy {
                FadePolicy::Decrement => volume,
                FadePolicy::Resync => volume - 1,
            },
            end_time: now.timestamp() + duration_secs,
        };
        info!(
            "sleep timer on ({}): volume {volume}, {duration_minutes} min, finishes at {}",
            mode.as_str(),
            self.finishes_at(now).unwrap_or_default()
        );

        let mut actions = vec![TimerAction::Command(DeviceCommand::volume(
            volume_target,
            volume,
        ))];

        // Selecting a preset switches the device on by itself.
        match self.config.targets.preset {
            Some(target) if device.preset_available && preset > 0 => {
                actions.push(TimerAction::Command(DeviceCommand::preset(target, preset)));
            }
            _ => actions.push(TimerAction::Command(DeviceCommand::power(power, true))),
        }

        match decay::next_delay_secs(duration_secs, volume) {
            Some(delay) => actions.push(TimerAction::ArmTick(delay)),
            None => actions.extend(self.deactivate()),
        }
        Ok(actions)
    }

    /// Returns to idle. Does nothing when already idle.
    pub fn deactivate(&mut self) -> Vec<TimerAction> {
        if !self.state.active {
            return Vec::new();
        }
        info!("sleep timer off");
        self.state = TimerState::default();
        vec![TimerAction::CancelTick]
    }

    pub fn on_tick(
        &mut self,
        now: DateTime<FixedOffset>,
        device: &DeviceSnapshot,
    ) -> Vec<TimerAction> {
        if !self.state.active {
            debug!("ignoring decay tick while idle");
            return Vec::new();
        }

        let remaining = self.state.end_time - now.timestamp();
        let outcome = decay::plan_tick(
            self.config.policy,
            self.state.cycling_volume,
            device,
            remaining,
        );
        debug!("decay tick: {outcome:?}, {remaining}s remaining");

        match outcome {
            TickOutcome::Abort(reason) => {
                info!("fade aborted: {}", reason.as_str());
                self.deactivate()
            }
            TickOutcome::Expired => {
                info!("fade window elapsed");
                self.deactivate()
            }
            TickOutcome::Finish => self.finish(),
            TickOutcome::Step { volume, delay_secs } => {
                let Some(target) = self.config.targets.volume else {
                    return self.deactivate();
                };
                self.state.cycling_volume = volume;
                vec![
                    TimerAction::Command(DeviceCommand::volume(target, volume)),
                    TimerAction::ArmTick(delay_secs),
                ]
            }
        }
    }

    /// Routes a value-changed notification by sender. Repeats of the last
    /// known value are ignored.
    pub fn on_value_changed(&mut self, sender: TargetRef, change: ValueChange) -> Vec<TimerAction> {
        if change.is_repeat() {
            return Vec::new();
        }
        match self.config.targets.classify(sender) {
            Some(TargetKind::Power) => self.on_power_changed(change),
            Some(TargetKind::Volume) => self.on_volume_changed(change),
            Some(TargetKind::Preset) | None => Vec::new(),
        }
    }

    pub fn on_schedule_fired(
        &mut self,
        now: DateTime<FixedOffset>,
        schedule: Option<&WeeklySchedule>,
        device: &DeviceSnapshot,
    ) -> Vec<TimerAction> {
        if schedule::determine_action(schedule, now) != ScheduleAction::On {
            debug!("schedule fired without an active on window");
            return Vec::new();
        }
        match self.activate(TimerMode::Scheduled, now, device) {
            Ok(actions) => actions,
            Err(err) => {
                warn!("scheduled start skipped: {err}");
                Vec::new()
            }
        }
    }

    /// Picks up a persisted fade after a restart.
    pub fn resume(&mut self, now: DateTime<FixedOffset>) -> Vec<TimerAction> {
        if !self.state.active {
            return Vec::new();
        }

        let remaining = self.state.end_time - now.timestamp();
        let steps = match self.config.policy {
            FadePolicy::Decrement => self.state.cycling_volume,
            FadePolicy::Resync => self.state.cycling_volume.saturating_add(1),
        };
        match decay::next_delay_secs(remaining, steps.max(1)) {
            Some(delay) => {
                info!("resuming fade, next tick in {delay}s");
                vec![TimerAction::ArmTick(delay)]
            }
            None => {
                info!("persisted fade already elapsed");
                self.deactivate()
            }
        }
    }

    pub fn finishes_at(&self, now: DateTime<FixedOffset>) -> Option<String> {
        if !self.state.active {
            return None;
        }
        DateTime::from_timestamp(self.state.end_time, 0)
            .map(|end| end.with_timezone(now.offset()).format(FINISHES_AT_FORMAT).to_string())
    }

    pub fn remaining_secs(&self, now: DateTime<FixedOffset>) -> u64 {
        if !self.state.active {
            return 0;
        }
        u64::try_from(self.state.end_time - now.timestamp()).unwrap_or(0)
    }

    pub fn status(
        &self,
        now: DateTime<FixedOffset>,
        schedule_active: bool,
        next_schedule_event_epoch: Option<i64>,
        time_synced: bool,
        timezone: &str,
    ) -> TimerStatus {
        TimerStatus {
            active: self.state.active,
            state: self.state.phase().as_str(),
            mode: self.state.mode.map(TimerMode::as_str),
            policy: self.config.policy.as_str(),
            controls_locked: self.controls_locked(),
            volume: self.settings.volume,
            preset: self.settings.preset,
            duration_minutes: self.settings.duration_minutes,
            start_volume: self.state.start_volume,
            cycling_volume: self.state.cycling_volume,
            end_time: self.state.end_time,
            finishes_at: self.finishes_at(now),
            remaining_secs: self.remaining_secs(now),
            schedule_active,
            next_schedule_event_epoch,
            time_synced,
            timezone: timezone.to_string(),
        }
    }

    pub fn state_payload(&self, now: DateTime<FixedOffset>) -> TimerStatePayload {
        TimerStatePayload {
            active: self.state.active,
            state: self.state.phase().as_str(),
            cycling_volume: self.state.cycling_volume,
            finishes_at: self.finishes_at(now),
            remaining_min: self.remaining_secs(now) / 60,
        }
    }

    fn on_power_changed(&mut self, change: ValueChange) -> Vec<TimerAction> {
        if change.as_bool() || change.is_repeat() {
            return Vec::new();
        }
        if self.state.active {
            info!("device switched off externally");
        }
        self.deactivate()
    }

    fn on_volume_changed(&mut self, change: ValueChange) -> Vec<TimerAction> {
        if !self.state.active || change.is_repeat() {
            return Vec::new();
        }
        if change.value > i64::from(self.state.cycling_volume) + 1 {
            info!(
                "volume raised to {} during fade (expected {}), stopping",
                change.value, self.state.cycling_volume
            );
            return self.deactivate();
        }
        Vec::new()
    }

    fn finish(&mut self) -> Vec<TimerAction> {
        let start_volume = self.state.start_volume;
        let mut actions = self.deactivate();
        let Some(power) = self.config.targets.power else {
            return actions;
        };
        info!("fade complete, switching device off");
        actions.push(TimerAction::Command(DeviceCommand::power(power, false)));

        if self.config.policy == FadePolicy::Decrement && self.config.restore_volume {
            if let Some(volume_target) = self.config.targets.volume {
                actions.push(TimerAction::Delay(self.config.restore_pause_ms));
                actions.push(TimerAction::Command(DeviceCommand::volume(
                    volume_target,
                    start_volume,
                )));
            }
        }
        actions
    }

    fn ensure_unlocked(&self) -> Result<(), TimerError> {
        if self.controls_locked() {
            Err(TimerError::ControlsLocked)
        } else {
            Ok(())
        }
    }
}

fn replace_if_changed<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::TargetConfig;
    use crate::schedule::{seconds_of_day, DaysMask, WindowSpec};

    const POWER: u32 = 10;
    const VOLUME: u32 = 11;
    const PRESET: u32 = 12;

    fn target(id: u32) -> TargetRef {
        TargetRef::new(id).unwrap()
    }

    // Jan 7, 2026 is a Wednesday.
    fn wednesday(hour: u32, minute: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2026, 1, 7, hour, minute, 0)
            .unwrap()
    }

    fn engine(policy: FadePolicy) -> SleepTimerEngine {
        let config = TimerConfig {
            targets: TargetConfig {
                power: Some(target(POWER)),
                volume: Some(target(VOLUME)),
                preset: Some(target(PRESET)),
            },
            policy,
            ..TimerConfig::default()
        };
        let settings = PersistedSettings {
            volume: 10,
            preset: 0,
            duration_minutes: 60,
        };
        SleepTimerEngine::new(config, settings, TimerState::default())
    }

    fn playing(volume: u8) -> DeviceSnapshot {
        DeviceSnapshot {
            power: Some(true),
            volume: Some(volume),
            preset_available: true,
        }
    }

    fn change(value: i64) -> ValueChange {
        ValueChange {
            value,
            previous: None,
        }
    }

    #[test]
    fn activation_sets_end_time_and_first_delay() {
        let mut engine = engine(FadePolicy::Decrement);
        let now = wednesday(22, 0);

        let actions = engine
            .activate(TimerMode::Manual, now, &playing(30))
            .unwrap();

        assert_eq!(
            actions,
            vec![
                TimerAction::Command(DeviceCommand::volume(target(VOLUME), 10)),
                TimerAction::Command(DeviceCommand::power(target(POWER), true)),
                TimerAction::ArmTick(360),
            ]
        );
        assert_eq!(
            engine.state(),
            &TimerState {
                active: true,
                mode: Some(TimerMode::Manual),
                start_volume: 10,
                cycling_volume: 10,
                end_time: now.timestamp() + 3600,
            }
        );
        assert!(engine.controls_locked());
        assert_eq!(
            engine.finishes_at(now).as_deref(),
            Some("07.01.2026, 23:00:00")
        );
    }

    #[test]
    fn resync_policy_starts_one_below_start_volume() {
        let mut engine = engine(FadePolicy::Resync);

        engine
            .activate(TimerMode::Manual, wednesday(22, 0), &playing(30))
            .unwrap();

        assert_eq!(engine.state().cycling_volume, 9);
        assert_eq!(engine.state().start_volume, 10);
    }

    #[test]
    fn preset_replaces_power_on() {
        let mut engine = engine(FadePolicy::Decrement);
        engine.set_preset(3).unwrap();

        let actions = engine
            .activate(TimerMode::Manual, wednesday(22, 0), &playing(30))
            .unwrap();

        assert_eq!(
            actions[1],
            TimerAction::Command(DeviceCommand::preset(target(PRESET), 3))
        );
        let power_on = TimerAction::Command(DeviceCommand::power(target(POWER), true));
        assert!(!actions.contains(&power_on));
    }

    #[test]
    fn missing_targets_refuse_activation_without_mutation() {
        let mut engine = engine(FadePolicy::Decrement);
        engine.config.targets.volume = None;

        let result = engine.activate(TimerMode::Manual, wednesday(22, 0), &playing(30));
        assert_eq!(
            result,
            Err(TimerError::ConfigurationMissing(TargetKind::Volume))
        );
        assert_eq!(engine.state(), &TimerState::default());

        let mut engine = self::engine(FadePolicy::Decrement);
        let unresolved = DeviceSnapshot {
            power: None,
            volume: Some(5),
            preset_available: false,
        };
        assert_eq!(
            engine.activate(TimerMode::Manual, wednesday(22, 0), &unresolved),
            Err(TimerError::ConfigurationMissing(TargetKind::Power))
        );
        assert!(!engine.is_active());
    }

    #[test]
    fn deactivate_when_idle_is_a_no_op() {
        let mut engine = engine(FadePolicy::Resync);
        let before = engine.state().clone();

        assert!(engine.deactivate().is_empty());
        assert_eq!(engine.state(), &before);
    }

    #[test]
    fn decrement_fade_runs_to_power_off() {
        let mut engine = engine(FadePolicy::Decrement);
        let start = wednesday(22, 0);
        let actions = engine
            .activate(TimerMode::Manual, start, &playing(10))
            .unwrap();

        let mut now = start;
        let mut delay = match actions.last() {
            Some(TimerAction::ArmTick(delay)) => *delay,
            other => panic!("expected tick, got {other:?}"),
        };
        let mut volumes = vec![engine.state().cycling_volume];

        loop {
            now += Duration::seconds(delay as i64);
            let device = playing(engine.state().cycling_volume);
            let actions = engine.on_tick(now, &device);

            match actions.as_slice() {
                [TimerAction::Command(_), TimerAction::ArmTick(next)] => {
                    delay = *next;
                    volumes.push(engine.state().cycling_volume);
                }
                _ => {
                    assert_eq!(
                        actions,
                        vec![
                            TimerAction::CancelTick,
                            TimerAction::Command(DeviceCommand::power(target(POWER), false)),
                        ]
                    );
                    break;
                }
            }
        }

        assert_eq!(volumes, (1..=10).rev().collect::<Vec<u8>>());
        assert_eq!(now, start + Duration::seconds(3600));
        assert_eq!(engine.state(), &TimerState::default());
    }

    #[test]
    fn first_tick_recomputes_delay_from_remaining_volume() {
        let mut engine = engine(FadePolicy::Decrement);
        let start = wednesday(22, 0);
        engine
            .activate(TimerMode::Manual, start, &playing(10))
            .unwrap();

        let actions = engine.on_tick(start + Duration::seconds(400), &playing(10));

        assert_eq!(
            actions,
            vec![
                TimerAction::Command(DeviceCommand::volume(target(VOLUME), 9)),
                TimerAction::ArmTick(356),
            ]
        );
        assert_eq!(engine.state().cycling_volume, 9);
    }

    #[test]
    fn decrement_restores_start_volume_after_pause() {
        let mut engine = engine(FadePolicy::Decrement);
        engine.config.restore_volume = true;
        engine.config.restore_pause_ms = 800;
        engine.set_volume(2).unwrap();
        let start = wednesday(22, 0);
        engine
            .activate(TimerMode::Manual, start, &playing(2))
            .unwrap();

        engine.on_tick(start + Duration::seconds(1800), &playing(2));
        let actions = engine.on_tick(start + Duration::seconds(3600), &playing(1));

        assert_eq!(
            actions,
            vec![
                TimerAction::CancelTick,
                TimerAction::Command(DeviceCommand::power(target(POWER), false)),
                TimerAction::Delay(800),
                TimerAction::Command(DeviceCommand::volume(target(VOLUME), 2)),
            ]
        );
    }

    #[test]
    fn expired_window_deactivates_without_commands() {
        let mut engine = engine(FadePolicy::Resync);
        let start = wednesday(22, 0);
        engine
            .activate(TimerMode::Manual, start, &playing(10))
            .unwrap();

        let actions = engine.on_tick(start + Duration::seconds(3700), &playing(10));

        assert_eq!(actions, vec![TimerAction::CancelTick]);
        assert!(!engine.is_active());
    }

    #[test]
    fn external_power_off_stops_without_commands() {
        let mut engine = engine(FadePolicy::Resync);
        engine
            .activate(TimerMode::Manual, wednesday(22, 0), &playing(10))
            .unwrap();

        let actions = engine.on_value_changed(target(POWER), change(0));

        assert_eq!(actions, vec![TimerAction::CancelTick]);
        assert!(!engine.is_active());
        assert_eq!(engine.state().end_time, 0);
    }

    #[test]
    fn manual_volume_increase_stops_fade() {
        let mut engine = engine(FadePolicy::Resync);
        engine
            .activate(TimerMode::Manual, wednesday(22, 0), &playing(10))
            .unwrap();

        // Echo of our own command keeps the fade going.
        assert!(engine.on_value_changed(target(VOLUME), change(10)).is_empty());
        assert!(engine.is_active());

        let actions = engine.on_value_changed(target(VOLUME), change(15));
        assert_eq!(actions, vec![TimerAction::CancelTick]);
        assert!(!engine.is_active());
    }

    #[test]
    fn repeated_report_is_not_a_change() {
        let mut engine = engine(FadePolicy::Resync);
        engine
            .activate(TimerMode::Manual, wednesday(22, 0), &playing(10))
            .unwrap();
        let repeat = |value| ValueChange {
            value,
            previous: Some(value),
        };

        assert!(engine.on_value_changed(target(VOLUME), repeat(40)).is_empty());
        assert!(engine.on_value_changed(target(POWER), repeat(0)).is_empty());
        assert!(engine.is_active());
    }

    #[test]
    fn locked_controls_reject_changes() {
        let mut engine = engine(FadePolicy::Resync);
        engine
            .activate(TimerMode::Manual, wednesday(22, 0), &playing(10))
            .unwrap();

        assert_eq!(engine.set_volume(20), Err(TimerError::ControlsLocked));
        assert_eq!(engine.set_duration(90), Err(TimerError::ControlsLocked));

        engine.deactivate();
        assert_eq!(engine.set_volume(20), Ok(true));
        assert_eq!(engine.set_volume(20), Ok(false));
    }

    #[test]
    fn schedule_fire_uses_weekday_profile() {
        let mut engine = engine(FadePolicy::Resync);
        let schedule = WeeklySchedule::create_or_replace(&[WindowSpec {
            enabled: true,
            days: DaysMask::MONDAY_TO_FRIDAY,
            start_seconds: seconds_of_day(22, 30, 0),
            duration_minutes: 60,
        }])
        .unwrap();

        let early = engine.on_schedule_fired(wednesday(22, 0), Some(&schedule), &playing(5));
        assert!(early.is_empty());
        assert!(!engine.is_active());

        let now = wednesday(22, 30);
        let actions = engine.on_schedule_fired(now, Some(&schedule), &playing(5));

        assert_eq!(actions.last(), Some(&TimerAction::ArmTick(360)));
        assert_eq!(engine.state().mode, Some(TimerMode::Scheduled));
        assert_eq!(engine.state().start_volume, 10);
        assert_eq!(engine.state().end_time, now.timestamp() + 3600);
    }

    #[test]
    fn resume_rearms_or_clears_persisted_fade() {
        let start = wednesday(22, 0);
        let persisted = TimerState {
            active: true,
            mode: Some(TimerMode::Manual),
            start_volume: 10,
            cycling_volume: 5,
            end_time: start.timestamp() + 1000,
        };

        let mut engine = SleepTimerEngine::new(
            engine(FadePolicy::Decrement).config,
            PersistedSettings::default(),
            persisted.clone(),
        );
        assert_eq!(engine.resume(start), vec![TimerAction::ArmTick(200)]);

        let mut engine = SleepTimerEngine::new(
            engine.config.clone(),
            PersistedSettings::default(),
            persisted,
        );
        let later = start + Duration::seconds(1000);
        assert_eq!(engine.resume(later), vec![TimerAction::CancelTick]);
        assert!(!engine.is_active());
    }

    #[test]
    fn inconsistent_persisted_state_is_dropped() {
        let broken = TimerState {
            active: false,
            mode: None,
            start_volume: 0,
            cycling_volume: 4,
            end_time: 0,
        };
        let engine = SleepTimerEngine::new(
            TimerConfig::default(),
            PersistedSettings::default(),
            broken,
        );

        assert_eq!(engine.state(), &TimerState::default());
    }

    #[test]
    fn stale_tick_while_idle_is_ignored() {
        let mut engine = engine(FadePolicy::Decrement);

        assert!(engine.on_tick(wednesday(22, 0), &playing(10)).is_empty());
    }
}
