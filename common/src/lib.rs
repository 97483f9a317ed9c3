pub mod config;
pub mod decay;
pub mod error;
pub mod schedule;
pub mod timer;
pub mod topics;
pub mod types;

pub use config::{PersistedSettings, RuntimeConfig, ScheduleProfile, TargetConfig, TimerConfig};
pub use error::{ScheduleError, TimerError};
pub use schedule::{DayOfWeek, DaysMask, ScheduleAction, WeeklySchedule, WindowSpec};
pub use timer::{EventContext, SleepTimerEngine, TimerAction, TimerEvent, TimerState};
pub use topics::*;
pub use types::{
    CommandKind, DeviceCommand, DeviceSnapshot, FadePolicy, TargetKind, TargetRef, TimerMode,
    TimerStatePayload, TimerStatus, ValueChange,
};
