use crate::types::TargetRef;

pub const TOPIC_CONTROLLER_STATE: &str = "sleepfade/controller/state";
pub const TOPIC_CONTROLLER_SCHEDULE_STATE: &str = "sleepfade/controller/schedule/state";

pub const TOPIC_CMD_TIMER: &str = "sleepfade/cmnd/timer";
pub const TOPIC_CMD_VOLUME: &str = "sleepfade/cmnd/volume";
pub const TOPIC_CMD_PRESET: &str = "sleepfade/cmnd/preset";
pub const TOPIC_CMD_DURATION: &str = "sleepfade/cmnd/duration";
pub const TOPIC_CMD_SCHEDULE: &str = "sleepfade/cmnd/schedule";

pub const TOPIC_TARGET_VALUE_FILTER: &str = "sleepfade/target/+/value";
pub const TOPIC_TARGET_SET_FILTER: &str = "sleepfade/target/+/set";

const TARGET_PREFIX: &str = "sleepfade/target/";

pub fn target_set_topic(target: TargetRef) -> String {
    format!("{TARGET_PREFIX}{}/set", target.id())
}

pub fn target_value_topic(target: TargetRef) -> String {
    format!("{TARGET_PREFIX}{}/value", target.id())
}

/// Extracts the target from `sleepfade/target/<id>/<suffix>`.
pub fn parse_target_topic(topic: &str, suffix: &str) -> Option<TargetRef> {
    let rest = topic.strip_prefix(TARGET_PREFIX)?;
    let (id, tail) = rest.split_once('/')?;
    if tail != suffix {
        return None;
    }
    TargetRef::new(id.parse().ok()?)
}

/// Device values arrive as integers or as boolean words.
pub fn parse_value_payload(payload: &str) -> Option<i64> {
    let trimmed = payload.trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "true" | "on" => Some(1),
        "false" | "off" => Some(0),
        _ => trimmed.parse().ok(),
    }
}
