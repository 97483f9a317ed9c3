use crate::types::TargetKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TimerError {
    /// A required target is not configured or does not resolve.
    #[error("{0} target is not configured or not available")]
    ConfigurationMissing(TargetKind),

    /// Manual settings cannot change while a fade is running.
    #[error("controls are locked while the sleep timer is active")]
    ControlsLocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("a weekly schedule holds at most 7 groups, got {0}")]
    TooManyGroups(usize),

    #[error("invalid weekday mask {0:#09b}")]
    InvalidDays(u8),

    #[error("start time {0}s is outside of a day")]
    InvalidStart(u32),
}
