//! Team, member and project records owned by the collaborator API.

use serde::{Deserialize, Serialize};

/// Role tag of a team member. Informational only to the session runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MemberRole {
    /// Team leader
    Leader,
    /// Regular member
    Member,
    /// Reviewer
    Reviewer,
    /// Developer
    Developer,
    /// Designer
    Designer,
    /// Planner
    Planner,
    /// Any other tag, carried through verbatim
    Other(String),
}

impl MemberRole {
    /// Tag as sent to and received from the collaborator API.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Leader => "LEADER",
            Self::Member => "MEMBER",
            Self::Reviewer => "REVIEWER",
            Self::Developer => "DEVELOPER",
            Self::Designer => "DESIGNER",
            Self::Planner => "PLANNER",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for MemberRole {
    fn from(tag: String) -> Self {
        match tag.to_ascii_uppercase().as_str() {
            "LEADER" => Self::Leader,
            "MEMBER" => Self::Member,
            "REVIEWER" => Self::Reviewer,
            "DEVELOPER" => Self::Developer,
            "DESIGNER" => Self::Designer,
            "PLANNER" => Self::Planner,
            _ => Self::Other(tag),
        }
    }
}

impl From<MemberRole> for String {
    fn from(role: MemberRole) -> Self {
        role.as_str().to_string()
    }
}

impl Default for MemberRole {
    fn default() -> Self {
        Self::Leader
    }
}

impl std::fmt::Display for MemberRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A team member; maps 1:1 to a session once connected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    /// Persisted identifier, absent for members the API has not stored yet
    #[serde(default)]
    pub id: Option<i64>,
    /// Display name, also the participant name used for role-line extraction
    pub name: String,
    /// Role tag
    #[serde(default)]
    pub role: MemberRole,
    /// Free-form per-member configuration
    #[serde(default)]
    pub config: Option<String>,
}

/// A team: a set of members plus a configuration text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    /// Team identifier
    pub id: i64,
    /// Team name
    pub name: String,
    /// Free-form configuration text; its last non-empty line is the settings path
    #[serde(default)]
    pub config: Option<String>,
    /// Members, in no particular order
    #[serde(default)]
    pub members: Vec<Member>,
}

impl Team {
    /// Team-scoped settings path: the last non-empty line of the config text.
    ///
    /// Returns an empty string when the team has no config.
    pub fn config_path(&self) -> &str {
        self.config
            .as_deref()
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .unwrap_or("")
    }
}

/// A project belonging to a team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Project identifier
    pub id: i64,
    /// Project name
    pub name: String,
    /// Owning team
    #[serde(default)]
    pub team_id: Option<i64>,
}
