use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Bar frequency of a run and of the data it consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    #[default]
    Daily,
    Min1,
    Min5,
    Min15,
    Min30,
    Min60,
}

impl Frequency {
    /// Length of one bar.
    pub fn time_delta(&self) -> Duration {
        match self {
            Frequency::Daily => Duration::days(1),
            Frequency::Min1 => Duration::minutes(1),
            Frequency::Min5 => Duration::minutes(5),
            Frequency::Min15 => Duration::minutes(15),
            Frequency::Min30 => Duration::minutes(30),
            Frequency::Min60 => Duration::minutes(60),
        }
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self, Frequency::Daily)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Min1 => "min1",
            Frequency::Min5 => "min5",
            Frequency::Min15 => "min15",
            Frequency::Min30 => "min30",
            Frequency::Min60 => "min60",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas() {
        assert_eq!(Frequency::Daily.time_delta(), Duration::days(1));
        assert_eq!(Frequency::Min15.time_delta(), Duration::minutes(15));
        assert!(!Frequency::Daily.is_intraday());
        assert!(Frequency::Min1.is_intraday());
    }

    #[test]
    fn serde_names_match_display() {
        let json = serde_json::to_string(&Frequency::Min30).unwrap();
        assert_eq!(json, format!("\"{}\"", Frequency::Min30));
    }
}
