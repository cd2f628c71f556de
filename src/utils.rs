use anyhow::{anyhow, Result};
use std::time::Duration;

pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(anyhow!("Duration cannot be empty"));
    }

    if let Some(millis) = input.strip_suffix("ms") {
        let millis: u64 = millis.parse()?;
        Ok(Duration::from_millis(millis))
    } else if let Some(seconds) = input.strip_suffix('s') {
        let seconds: f64 = seconds.parse()?;
        Ok(Duration::from_secs_f64(seconds))
    } else if let Some(minutes) = input.strip_suffix('m') {
        let minutes: u64 = minutes.parse()?;
        Ok(Duration::from_secs(minutes * 60))
    } else {
        let seconds: u64 = input.parse()?;
        Ok(Duration::from_secs(seconds))
    }
}

pub fn format_duration(duration: Duration) -> String {
    if duration.subsec_millis() != 0 || duration.as_secs() == 0 {
        format!("{}ms", duration.as_millis())
    } else if duration.as_secs() >= 60 && duration.as_secs() % 60 == 0 {
        format!("{}m", duration.as_secs() / 60)
    } else {
        format!("{}s", duration.as_secs())
    }
}

/// Serde adapter for durations written as "20s" / "500ms" / "5m" in scenario
/// files.
pub mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::format_duration(*duration))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_duration(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_units() {
        assert_eq!(parse_duration("20s").unwrap(), Duration::from_secs(20));
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_duration("30").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("1.5s").unwrap(), Duration::from_millis(1500));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("abc").is_err());
        assert!(parse_duration("10h30m").is_err());
    }

    #[test]
    fn formats_round_trip() {
        for raw in ["20s", "500ms", "5m"] {
            let parsed = parse_duration(raw).unwrap();
            assert_eq!(format_duration(parsed), raw);
        }
    }
}
