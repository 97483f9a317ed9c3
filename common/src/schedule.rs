use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

pub const SECONDS_PER_DAY: u32 = 24 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DayOfWeek {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl DayOfWeek {
    pub fn index(self) -> usize {
        match self {
            Self::Mon => 0,
            Self::Tue => 1,
            Self::Wed => 2,
            Self::Thu => 3,
            Self::Fri => 4,
            Self::Sat => 5,
            Self::Sun => 6,
        }
    }

    pub fn from_index(index: usize) -> Self {
        match index % 7 {
            0 => Self::Mon,
            1 => Self::Tue,
            2 => Self::Wed,
            3 => Self::Thu,
            4 => Self::Fri,
            5 => Self::Sat,
            _ => Self::Sun,
        }
    }

    pub fn from_chrono(weekday: Weekday) -> Self {
        Self::from_index(weekday.num_days_from_monday() as usize)
    }
}

/// Seven-bit weekday set. Bit `i` stands for weekday `i + 1`, Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaysMask(u8);

impl DaysMask {
    pub const MONDAY_TO_FRIDAY: Self = Self(0b001_1111);
    pub const WEEKEND: Self = Self(0b110_0000);
    pub const ALL: Self = Self(0b111_1111);

    pub fn new(bits: u8) -> Self {
        Self(bits)
    }

    pub fn from_days(days: &[DayOfWeek]) -> Self {
        Self(days.iter().fold(0, |bits, day| bits | 1 << day.index()))
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, day: DayOfWeek) -> bool {
        self.0 & (1 << day.index()) != 0
    }

    pub fn is_valid(self) -> bool {
        self.0 != 0 && self.0 & !Self::ALL.0 == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScheduleAction {
    Off,
    On,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulePoint {
    #[serde(rename = "startSeconds")]
    pub start_seconds: u32,
    pub action: ScheduleAction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleGroup {
    pub days: DaysMask,
    pub points: Vec<SchedulePoint>,
}

/// One requested time window, turned into an "on" point at the start and
/// an "off" point once the duration has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    #[serde(rename = "use")]
    pub enabled: bool,
    pub days: DaysMask,
    #[serde(rename = "startSeconds")]
    pub start_seconds: u32,
    #[serde(rename = "durationMinutes", default = "default_window_minutes")]
    pub duration_minutes: u32,
}

fn default_window_minutes() -> u32 {
    120
}

impl WindowSpec {
    pub fn end_seconds(&self) -> u32 {
        let end = u64::from(self.start_seconds) + u64::from(self.duration_minutes) * 60;
        (end % u64::from(SECONDS_PER_DAY)) as u32
    }

    fn validate(&self) -> Result<(), ScheduleError> {
        if !self.days.is_valid() {
            return Err(ScheduleError::InvalidDays(self.days.bits()));
        }
        if self.start_seconds >= SECONDS_PER_DAY {
            return Err(ScheduleError::InvalidStart(self.start_seconds));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub active: bool,
    pub groups: Vec<ScheduleGroup>,
}

impl WeeklySchedule {
    pub const MAX_GROUPS: usize = 7;

    /// Builds a fresh, active schedule from the window specs that are in use.
    pub fn create_or_replace(specs: &[WindowSpec]) -> Result<Self, ScheduleError> {
        let used: Vec<&WindowSpec> = specs.iter().filter(|spec| spec.enabled).collect();
        if used.len() > Self::MAX_GROUPS {
            return Err(ScheduleError::TooManyGroups(used.len()));
        }

        let mut groups = Vec::with_capacity(used.len());
        for spec in used {
            spec.validate()?;
            groups.push(ScheduleGroup {
                days: spec.days,
                points: vec![
                    SchedulePoint {
                        start_seconds: spec.start_seconds,
                        action: ScheduleAction::On,
                    },
                    SchedulePoint {
                        start_seconds: spec.end_seconds(),
                        action: ScheduleAction::Off,
                    },
                ],
            });
        }

        Ok(Self {
            active: true,
            groups,
        })
    }

    pub fn normalize(&mut self) {
        self.groups.retain(|group| group.days.is_valid());
        for group in &mut self.groups {
            group
                .points
                .retain(|point| point.start_seconds < SECONDS_PER_DAY);
        }
        self.groups.truncate(Self::MAX_GROUPS);
    }

    /// Action of the most recently started point today, `Off` when nothing matches.
    pub fn determine_action(&self, now: DateTime<FixedOffset>) -> ScheduleAction {
        if !self.active {
            return ScheduleAction::Off;
        }

        let day = DayOfWeek::from_chrono(now.weekday());
        let now_seconds = now.num_seconds_from_midnight();

        // Latest start wins; on equal starts the later point in arrival order wins.
        let mut best: Option<&SchedulePoint> = None;
        for group in self.groups.iter().filter(|group| group.days.contains(day)) {
            for point in &group.points {
                if point.start_seconds > now_seconds {
                    continue;
                }
                if best.map_or(true, |current| point.start_seconds >= current.start_seconds) {
                    best = Some(point);
                }
            }
        }

        best.map_or(ScheduleAction::Off, |point| point.action)
    }

    pub fn next_event_epoch(&self, now: DateTime<FixedOffset>) -> Option<i64> {
        if !self.active || self.groups.is_empty() {
            return None;
        }

        let now_day = DayOfWeek::from_chrono(now.weekday());
        let now_seconds = now.num_seconds_from_midnight();

        let mut best: Option<DateTime<FixedOffset>> = None;

        for day_offset in 0..=7i64 {
            let day = DayOfWeek::from_index(now_day.index() + day_offset as usize);
            let points = self
                .groups
                .iter()
                .filter(|group| group.days.contains(day))
                .flat_map(|group| group.points.iter());

            for point in points {
                if day_offset == 0 && point.start_seconds <= now_seconds {
                    continue;
                }

                let date = now.date_naive() + Duration::days(day_offset);
                let Some(naive) = date.and_hms_opt(
                    point.start_seconds / 3600,
                    point.start_seconds / 60 % 60,
                    point.start_seconds % 60,
                ) else {
                    continue;
                };

                let Some(candidate) = now.offset().from_local_datetime(&naive).single() else {
                    continue;
                };

                if best.map(|current| candidate < current).unwrap_or(true) {
                    best = Some(candidate);
                }
            }

            if best.is_some() {
                break;
            }
        }

        best.map(|dt| dt.timestamp())
    }
}

/// Evaluates an optional schedule; a missing schedule never yields an action.
pub fn determine_action(
    schedule: Option<&WeeklySchedule>,
    now: DateTime<FixedOffset>,
) -> ScheduleAction {
    match schedule {
        Some(schedule) => schedule.determine_action(now),
        None => ScheduleAction::Off,
    }
}

pub fn seconds_of_day(hour: u32, minute: u32, second: u32) -> u32 {
    (hour * 3600 + minute * 60 + second) % SECONDS_PER_DAY
}
