//! The fixed set of ecosystem projects that proposals and budgets target

use crate::LedgerError;
use serde::{Deserialize, Serialize};

/// One of the five semi-independent subsystems.
///
/// Referenced, never created or destroyed. The discriminants are the wire
/// indices accepted by [`Project::try_from`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Project {
    Protocol = 0,
    Dex = 1,
    Ferry = 2,
    Analyst = 3,
    App = 4,
}

impl Project {
    pub const ALL: [Project; 5] = [
        Project::Protocol,
        Project::Dex,
        Project::Ferry,
        Project::Analyst,
        Project::App,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Project::Protocol => "protocol",
            Project::Dex => "dex",
            Project::Ferry => "ferry",
            Project::Analyst => "analyst",
            Project::App => "app",
        }
    }
}

impl TryFrom<u8> for Project {
    type Error = LedgerError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Project::ALL
            .get(value as usize)
            .copied()
            .ok_or(LedgerError::InvalidProject(value))
    }
}

impl std::str::FromStr for Project {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Project::ALL
            .iter()
            .copied()
            .find(|p| p.name() == lower)
            .ok_or_else(|| LedgerError::UnknownProjectName(s.to_string()))
    }
}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
