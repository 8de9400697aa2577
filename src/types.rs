use std::time::Duration;

use serde::Deserialize;

/// Kind of a `[[part]]` grader.
///
/// - `Build`: compile then test the subject with its detected build tool.
/// - `Command`: run an arbitrary shell command in the subject root; full
///   credit when it exits with status 0.
/// - `GitHistory`: penalty-only part for meaningless commit messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartKind {
    Build,
    Command,
    GitHistory,
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => Ok(Duration::from_secs(value * 60)),
        "h" => Ok(Duration::from_secs(value * 60 * 60)),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}

/// Render a duration the way batch logs show it: at most two units,
/// e.g. `1h 2m`, `3s 250ms`, `12ms`. Zero renders as an empty string.
pub fn human_readable(duration: Duration) -> String {
    const MS_IN_SECOND: u128 = 1000;
    const MS_IN_MINUTE: u128 = MS_IN_SECOND * 60;
    const MS_IN_HOUR: u128 = MS_IN_MINUTE * 60;

    let mut rest = duration.as_millis();
    let hours = rest / MS_IN_HOUR;
    rest -= hours * MS_IN_HOUR;
    let minutes = rest / MS_IN_MINUTE;
    rest -= minutes * MS_IN_MINUTE;
    let seconds = rest / MS_IN_SECOND;
    rest -= seconds * MS_IN_SECOND;

    let mut units = Vec::with_capacity(2);
    if hours > 0 {
        units.push(format!("{hours}h"));
    }
    if minutes > 0 {
        units.push(format!("{minutes}m"));
    }
    if seconds > 0 && units.len() < 2 {
        units.push(format!("{seconds}s"));
    }
    if rest > 0 && units.len() < 2 {
        units.push(format!("{rest}ms"));
    }
    units.join(" ")
}
