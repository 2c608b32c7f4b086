use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend a track belongs to
///
/// Each kind maps to exactly one live backend instance at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Files on local storage
    #[default]
    Local,

    /// Remote streaming catalog
    #[serde(alias = "spotify")]
    Remote,
}

impl SourceKind {
    /// Every kind, in declaration order
    pub const ALL: [SourceKind; 2] = [SourceKind::Local, SourceKind::Remote];

    /// Stable lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Local => "local",
            SourceKind::Remote => "remote",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(SourceKind::Local),
            "remote" | "spotify" => Ok(SourceKind::Remote),
            other => Err(CoreError::UnknownSourceKind(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_names_case_insensitively() {
        assert_eq!("local".parse::<SourceKind>(), Ok(SourceKind::Local));
        assert_eq!(" Remote ".parse::<SourceKind>(), Ok(SourceKind::Remote));
        assert_eq!("SPOTIFY".parse::<SourceKind>(), Ok(SourceKind::Remote));
    }

    #[test]
    fn rejects_unknown_names() {
        assert_eq!(
            "soundcloud".parse::<SourceKind>(),
            Err(CoreError::UnknownSourceKind("soundcloud".to_string()))
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        for kind in SourceKind::ALL {
            assert_eq!(kind.to_string().parse::<SourceKind>(), Ok(kind));
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        assert_eq!(serde_json::to_string(&SourceKind::Remote).unwrap(), "\"remote\"");
        let kind: SourceKind = serde_json::from_str("\"spotify\"").unwrap();
        assert_eq!(kind, SourceKind::Remote);
    }
}
