use std::{collections::HashMap, time::Duration};

use chrono::{DateTime, FixedOffset};
use tracing::{debug, info};

use sleepfade_common::{
    CommandKind, DeviceCommand, DeviceSnapshot, EventContext, SleepTimerEngine, TargetRef,
    TimerAction, TimerConfig, TimerError, TimerEvent, ValueChange, WeeklySchedule,
};

use crate::{
    gateway::{send_with_retry, DeviceGateway},
    ticker::TickTimer,
};

/// Runs engine events one at a time. Tick arming happens in place; device
/// commands and delays come back as a plan for the caller to send once the
/// dispatcher is no longer borrowed.
pub struct Dispatcher {
    engine: SleepTimerEngine,
    ticker: TickTimer,
    values: HashMap<TargetRef, i64>,
    schedule: Option<WeeklySchedule>,
}

/// Outcome of one handled event.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Handled {
    /// Whether the persisted timer state changed.
    pub changed: bool,
    /// Device commands and delays, in the order they must run.
    pub actions: Vec<TimerAction>,
}

impl Dispatcher {
    pub fn new(
        engine: SleepTimerEngine,
        ticker: TickTimer,
        schedule: Option<WeeklySchedule>,
    ) -> Self {
        Self {
            engine,
            ticker,
            values: HashMap::new(),
            schedule,
        }
    }

    pub fn engine(&self) -> &SleepTimerEngine {
        &self.engine
    }

    pub fn schedule(&self) -> Option<&WeeklySchedule> {
        self.schedule.as_ref()
    }

    pub fn set_schedule(&mut self, schedule: Option<WeeklySchedule>) {
        self.schedule = schedule;
    }

    /// Returns `None` when there is no schedule to toggle.
    pub fn set_schedule_active(&mut self, active: bool) -> Option<bool> {
        let schedule = self.schedule.as_mut()?;
        let changed = schedule.active != active;
        schedule.active = active;
        Some(changed)
    }

    pub fn next_schedule_epoch(&self, now: DateTime<FixedOffset>) -> Option<i64> {
        self.schedule.as_ref()?.next_event_epoch(now)
    }

    pub fn tick_interval_ms(&self) -> u64 {
        self.ticker.interval_ms()
    }

    pub fn set_volume(&mut self, volume: u8) -> Result<bool, TimerError> {
        self.engine.set_volume(volume)
    }

    pub fn set_preset(&mut self, preset: u8) -> Result<bool, TimerError> {
        self.engine.set_preset(preset)
    }

    pub fn set_duration(&mut self, minutes: u16) -> Result<bool, TimerError> {
        self.engine.set_duration(minutes)
    }

    pub fn replace_config(&mut self, config: TimerConfig) -> Result<(), TimerError> {
        self.engine.replace_config(config)
    }

    /// Live device view from the last reported or commanded values.
    pub fn snapshot(&self) -> DeviceSnapshot {
        let targets = &self.engine.config.targets;
        let value = |target: Option<TargetRef>| target.and_then(|t| self.values.get(&t).copied());

        DeviceSnapshot {
            power: value(targets.power).map(|raw| raw != 0),
            volume: value(targets.volume).map(|raw| raw.clamp(0, i64::from(u8::MAX)) as u8),
            preset_available: value(targets.preset).is_some(),
        }
    }

    /// Handles one event and applies its tick actions.
    pub fn handle(
        &mut self,
        event: TimerEvent,
        now: DateTime<FixedOffset>,
    ) -> Result<Handled, TimerError> {
        let device = self.snapshot();
        let schedule = self.schedule.clone();
        self.run(|engine| {
            let ctx = EventContext {
                now,
                device: &device,
                schedule: schedule.as_ref(),
            };
            engine.handle_event(event, &ctx)
        })
    }

    /// Records a value reported by the device and passes the change on to
    /// the engine.
    pub fn on_device_value(&mut self, target: TargetRef, value: i64) -> Handled {
        let previous = self.values.insert(target, value);
        let change = ValueChange { value, previous };
        self.run(|engine| Ok(engine.on_value_changed(target, change)))
            .unwrap_or_default()
    }

    pub fn on_tick_fired(
        &mut self,
        generation: u64,
        now: DateTime<FixedOffset>,
    ) -> Result<Handled, TimerError> {
        if !self.ticker.claim(generation) {
            debug!("dropping stale decay tick {generation}");
            return Ok(Handled::default());
        }
        self.handle(TimerEvent::Tick, now)
    }

    fn run(
        &mut self,
        step: impl FnOnce(&mut SleepTimerEngine) -> Result<Vec<TimerAction>, TimerError>,
    ) -> Result<Handled, TimerError> {
        let before = self.engine.state().clone();
        let planned = step(&mut self.engine)?;

        let mut actions = Vec::with_capacity(planned.len());
        for action in planned {
            match action {
                TimerAction::Command(command) => {
                    self.record_commanded(command);
                    actions.push(action);
                }
                TimerAction::Delay(_) => actions.push(action),
                TimerAction::ArmTick(secs) => {
                    debug!("next decay tick in {secs}s");
                    self.ticker.arm(Duration::from_secs(secs));
                }
                TimerAction::CancelTick => {
                    if self.ticker.is_armed() {
                        info!("decay tick cancelled");
                    }
                    self.ticker.cancel();
                }
            }
        }

        Ok(Handled {
            changed: self.engine.state() != &before,
            actions,
        })
    }

    /// Commanded values are taken as applied. A command that is later lost
    /// leaves the fade stepping from its own value until the device reports
    /// again.
    fn record_commanded(&mut self, command: DeviceCommand) {
        let value = match command.kind {
            CommandKind::Power(on) => i64::from(on),
            CommandKind::Volume(volume) => i64::from(volume),
            CommandKind::Preset(preset) => {
                // Selecting a preset switches the device on.
                if let Some(power) = self.engine.config.targets.power {
                    self.values.insert(power, 1);
                }
                i64::from(preset)
            }
        };
        self.values.insert(command.target, value);
    }
}

/// Sends planned device actions in order. Failed commands are logged by
/// `send_with_retry` and skipped.
pub async fn send_device_actions<G: DeviceGateway>(gateway: &G, actions: Vec<TimerAction>) {
    for action in actions {
        match action {
            TimerAction::Command(command) => {
                send_with_retry(gateway, command).await;
            }
            TimerAction::Delay(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
            TimerAction::ArmTick(_) | TimerAction::CancelTick => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use sleepfade_common::{
        FadePolicy, PersistedSettings, TargetConfig, TargetKind, TimerMode, TimerState,
    };
    use tokio::sync::mpsc;

    use super::*;
    use crate::gateway::testing::RecordingGateway;

    const POWER: u32 = 10;
    const VOLUME: u32 = 11;
    const PRESET: u32 = 12;

    fn target(id: u32) -> TargetRef {
        TargetRef::new(id).unwrap()
    }

    fn night(minute: u32, second: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(3600)
            .unwrap()
            .with_ymd_and_hms(2026, 1, 7, 22, minute, second)
            .unwrap()
    }

    fn manual_on() -> TimerEvent {
        TimerEvent::Toggle {
            on: true,
            mode: TimerMode::Manual,
        }
    }

    fn commands(handled: &Handled) -> Vec<DeviceCommand> {
        handled
            .actions
            .iter()
            .filter_map(|action| match action {
                TimerAction::Command(command) => Some(*command),
                _ => None,
            })
            .collect()
    }

    fn dispatcher_with(
        policy: FadePolicy,
        volume: u8,
        preset: u8,
    ) -> (Dispatcher, mpsc::UnboundedReceiver<u64>) {
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
            volume,
            preset,
            duration_minutes: 15,
        };
        let engine = SleepTimerEngine::new(config, settings, TimerState::default());
        let (tx, rx) = mpsc::unbounded_channel();
        (Dispatcher::new(engine, TickTimer::new(tx), None), rx)
    }

    fn dispatcher() -> (Dispatcher, mpsc::UnboundedReceiver<u64>) {
        dispatcher_with(FadePolicy::Decrement, 2, 0)
    }

    fn report_playing(dispatcher: &mut Dispatcher, volume: i64) {
        dispatcher.on_device_value(target(POWER), 1);
        dispatcher.on_device_value(target(VOLUME), volume);
    }

    #[tokio::test]
    async fn activation_without_reported_values_is_refused() {
        let (mut dispatcher, _rx) = dispatcher();

        let result = dispatcher.handle(manual_on(), night(0, 0));

        assert_eq!(
            result,
            Err(TimerError::ConfigurationMissing(TargetKind::Power))
        );
        assert_eq!(dispatcher.tick_interval_ms(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn full_fade_plans_commands_in_order() {
        let (mut dispatcher, mut rx) = dispatcher();
        report_playing(&mut dispatcher, 30);

        let handled = dispatcher.handle(manual_on(), night(0, 0)).unwrap();
        assert!(handled.changed);
        assert_eq!(dispatcher.tick_interval_ms(), 450_000);
        let mut sent = commands(&handled);

        let generation = rx.recv().await.unwrap();
        let handled = dispatcher.on_tick_fired(generation, night(7, 30)).unwrap();
        sent.extend(commands(&handled));
        let generation = rx.recv().await.unwrap();
        let handled = dispatcher.on_tick_fired(generation, night(15, 0)).unwrap();
        sent.extend(commands(&handled));

        assert_eq!(
            sent,
            vec![
                DeviceCommand::volume(target(VOLUME), 2),
                DeviceCommand::power(target(POWER), true),
                DeviceCommand::volume(target(VOLUME), 1),
                DeviceCommand::power(target(POWER), false),
            ]
        );
        assert!(!dispatcher.engine().is_active());
        assert_eq!(dispatcher.tick_interval_ms(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn preset_start_counts_the_device_as_switched_on() {
        let (mut dispatcher, mut rx) = dispatcher_with(FadePolicy::Resync, 100, 3);
        dispatcher.on_device_value(target(POWER), 0);
        dispatcher.on_device_value(target(VOLUME), 20);
        dispatcher.on_device_value(target(PRESET), 1);

        let handled = dispatcher.handle(manual_on(), night(0, 0)).unwrap();
        assert_eq!(
            commands(&handled),
            vec![
                DeviceCommand::volume(target(VOLUME), 100),
                DeviceCommand::preset(target(PRESET), 3),
            ]
        );
        assert_eq!(dispatcher.snapshot().power, Some(true));

        let generation = rx.recv().await.unwrap();
        let handled = dispatcher.on_tick_fired(generation, night(0, 9)).unwrap();

        assert_eq!(
            commands(&handled),
            vec![DeviceCommand::volume(target(VOLUME), 99)]
        );
        assert!(dispatcher.engine().is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn unconfirmed_steps_are_not_taken_for_manual_changes() {
        let (mut dispatcher, mut rx) = dispatcher_with(FadePolicy::Decrement, 4, 0);
        report_playing(&mut dispatcher, 30);
        dispatcher.handle(manual_on(), night(0, 0)).unwrap();

        // No device echoes arrive between the steps.
        let generation = rx.recv().await.unwrap();
        let first = dispatcher.on_tick_fired(generation, night(3, 45)).unwrap();
        let generation = rx.recv().await.unwrap();
        let second = dispatcher.on_tick_fired(generation, night(7, 30)).unwrap();

        assert_eq!(
            commands(&first),
            vec![DeviceCommand::volume(target(VOLUME), 3)]
        );
        assert_eq!(
            commands(&second),
            vec![DeviceCommand::volume(target(VOLUME), 2)]
        );
        assert!(dispatcher.engine().is_active());
        assert_eq!(dispatcher.snapshot().volume, Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn external_power_off_cancels_pending_tick() {
        let (mut dispatcher, mut rx) = dispatcher();
        report_playing(&mut dispatcher, 30);
        dispatcher.handle(manual_on(), night(0, 0)).unwrap();

        let handled = dispatcher.on_device_value(target(POWER), 0);

        assert!(handled.changed);
        assert!(handled.actions.is_empty());
        assert!(!dispatcher.engine().is_active());
        tokio::time::sleep(Duration::from_secs(3600)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn repeated_value_is_not_a_change() {
        let (mut dispatcher, _rx) = dispatcher();
        report_playing(&mut dispatcher, 30);
        dispatcher.handle(manual_on(), night(0, 0)).unwrap();

        // Echo of the commanded start volume.
        let handled = dispatcher.on_device_value(target(VOLUME), 2);

        assert_eq!(handled, Handled::default());
        assert!(dispatcher.engine().is_active());
    }

    #[tokio::test]
    async fn stale_generation_is_ignored() {
        let (mut dispatcher, _rx) = dispatcher();
        report_playing(&mut dispatcher, 2);

        let handled = dispatcher.on_tick_fired(7, night(5, 0)).unwrap();

        assert_eq!(handled, Handled::default());
    }

    #[tokio::test]
    async fn preset_report_makes_preset_available() {
        let (mut dispatcher, _rx) = dispatcher();
        assert!(!dispatcher.snapshot().preset_available);

        dispatcher.on_device_value(target(PRESET), 3);
        report_playing(&mut dispatcher, 12);

        assert_eq!(
            dispatcher.snapshot(),
            DeviceSnapshot {
                power: Some(true),
                volume: Some(12),
                preset_available: true,
            }
        );
    }

    #[tokio::test]
    async fn schedule_toggle_needs_a_schedule() {
        let (mut dispatcher, _rx) = dispatcher();
        assert_eq!(dispatcher.set_schedule_active(false), None);

        dispatcher.set_schedule(Some(WeeklySchedule::create_or_replace(&[]).unwrap()));
        assert_eq!(dispatcher.set_schedule_active(false), Some(true));
        assert_eq!(dispatcher.set_schedule_active(false), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn device_actions_keep_going_after_a_failed_command() {
        let gateway = RecordingGateway::failing(2);
        let off = DeviceCommand::power(target(POWER), false);
        let restore = DeviceCommand::volume(target(VOLUME), 2);
        let started = tokio::time::Instant::now();

        send_device_actions(
            &gateway,
            vec![
                TimerAction::Command(off),
                TimerAction::Delay(800),
                TimerAction::Command(restore),
            ],
        )
        .await;

        assert_eq!(gateway.attempts(), vec![off, off, restore]);
        assert!(started.elapsed() >= Duration::from_millis(800));
    }
}
