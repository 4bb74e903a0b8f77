//! Team, roster and notification types shared by the forms

use super::selection::Keyed;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Team identifier
///
/// The team browser hands out numeric ids while routes carry them as
/// strings, so both forms are accepted on the wire. Always serialized as a
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TeamId(String);

impl TeamId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TeamId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for TeamId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<u64> for TeamId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TeamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Self::from(n),
            Raw::Text(s) => Self(s),
        })
    }
}

/// Team as yielded by the team picker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: TeamId,
    #[serde(default)]
    pub name: String,
}

impl TeamRef {
    pub fn new(id: impl Into<TeamId>, name: &str) -> Self {
        Self {
            id: id.into(),
            name: name.to_string(),
        }
    }

    /// Parse the picker's JSON callback payload, e.g. `{"id":5,"name":"Eagles"}`
    pub fn from_picker_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl Keyed for TeamRef {
    type Key = TeamId;

    fn key(&self) -> &TeamId {
        &self.id
    }
}

/// Roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    #[serde(rename = "un")]
    pub username: String,
    #[serde(rename = "fn", default)]
    pub first_name: String,
    #[serde(rename = "ln", default)]
    pub last_name: String,
}

impl Student {
    pub fn new(username: &str, first_name: &str, last_name: &str) -> Self {
        Self {
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl Keyed for Student {
    type Key = str;

    fn key(&self) -> &str {
        &self.username
    }
}

/// Who gets notified about a posted message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifyTarget {
    Students,
    Parents,
    #[serde(rename = "teamstaff")]
    TeamStaff,
}

impl NotifyTarget {
    /// Canonical ordering used in payloads
    pub const ALL: [NotifyTarget; 3] = [Self::Students, Self::Parents, Self::TeamStaff];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Students => "Students",
            Self::Parents => "Parents",
            Self::TeamStaff => "Coaches/Assistants",
        }
    }

    pub fn as_wire(&self) -> &'static str {
        match self {
            Self::Students => "students",
            Self::Parents => "parents",
            Self::TeamStaff => "teamstaff",
        }
    }
}

impl FromStr for NotifyTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|target| target.as_wire() == s)
            .ok_or_else(|| format!("unknown notify target '{s}' (students, parents, teamstaff)"))
    }
}

/// Publication status of a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TeamStatus {
    #[default]
    Unsaved,
    Saved,
    Live,
}

impl TeamStatus {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Unsaved),
            1 => Some(Self::Saved),
            2 => Some(Self::Live),
            _ => None,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "unsaved" => Some(Self::Unsaved),
            "saved" => Some(Self::Saved),
            "live" => Some(Self::Live),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for TeamStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Code(u64),
            Name(String),
        }

        let status = match Raw::deserialize(deserializer)? {
            Raw::Code(code) => Self::from_code(code),
            Raw::Name(name) => name
                .parse::<u64>()
                .ok()
                .and_then(Self::from_code)
                .or_else(|| Self::from_name(&name)),
        };
        status.ok_or_else(|| serde::de::Error::custom("unknown team status"))
    }
}
