use sleepfade_common::{TargetKind, TargetRef};

/// Simulated audio player behind three target references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub power: TargetRef,
    pub volume: TargetRef,
    pub preset: TargetRef,
    pub state: PlayerState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerState {
    pub on: bool,
    pub volume: u8,
    pub preset: u8,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            on: false,
            volume: 20,
            preset: 1,
        }
    }
}

impl Player {
    pub fn new(power: TargetRef, volume: TargetRef, preset: TargetRef) -> Self {
        Self {
            power,
            volume,
            preset,
            state: PlayerState::default(),
        }
    }

    fn kind_of(&self, target: TargetRef) -> Option<TargetKind> {
        if target == self.power {
            Some(TargetKind::Power)
        } else if target == self.volume {
            Some(TargetKind::Volume)
        } else if target == self.preset {
            Some(TargetKind::Preset)
        } else {
            None
        }
    }

    /// Current value of every target, as reported on startup.
    pub fn values(&self) -> Vec<(TargetRef, i64)> {
        vec![
            (self.power, i64::from(self.state.on)),
            (self.volume, i64::from(self.state.volume)),
            (self.preset, i64::from(self.state.preset)),
        ]
    }

    /// Applies a set command and returns the values to report back.
    /// Selecting a preset also switches the player on.
    pub fn apply(&mut self, target: TargetRef, value: i64) -> Vec<(TargetRef, i64)> {
        let Some(kind) = self.kind_of(target) else {
            return Vec::new();
        };

        let mut reports = Vec::new();
        match kind {
            TargetKind::Power => {
                self.state.on = value != 0;
                reports.push((self.power, i64::from(self.state.on)));
            }
            TargetKind::Volume => {
                self.state.volume = value.clamp(0, 100) as u8;
                reports.push((self.volume, i64::from(self.state.volume)));
            }
            TargetKind::Preset => {
                self.state.preset = value.clamp(0, i64::from(u8::MAX)) as u8;
                reports.push((self.preset, i64::from(self.state.preset)));
                if !self.state.on {
                    self.state.on = true;
                    reports.push((self.power, 1));
                }
            }
        }
        reports
    }
}
