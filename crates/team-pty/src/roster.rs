//! Team roster: teams of the signed-in user and their members' session ids.

use std::collections::HashMap;

use team_pty_core::{Member, SessionId, Team};
use team_pty_session::ConnectTarget;

/// A member together with the session id it maps to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMember {
    /// Session id of the member
    pub session_id: SessionId,
    /// Member record
    pub member: Member,
}

#[derive(Debug, Clone)]
struct RosterTeam {
    team: Team,
    members: Vec<RosterMember>,
}

/// Teams and members, with stable session ids.
///
/// Persisted members map to `m-<id>`. Members without an id get a
/// synthesized id that survives refreshes as long as the member keeps its
/// team, role, name and its position among same-named members.
#[derive(Debug, Default)]
pub struct Roster {
    teams: Vec<RosterTeam>,
    selected: Option<i64>,
    synthesized: HashMap<(i64, String, String, usize), SessionId>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the teams with a fresh list from the collaborator API.
    ///
    /// The first team is selected when the selection is empty or no longer
    /// exists.
    pub fn replace(&mut self, teams: Vec<Team>) {
        let mut entries = Vec::with_capacity(teams.len());
        for team in teams {
            let mut seen: HashMap<(String, String), usize> = HashMap::new();
            let mut members = Vec::with_capacity(team.members.len());
            for member in &team.members {
                let occurrence = if member.id.is_none() {
                    let key = (member.role.as_str().to_string(), member.name.clone());
                    let count = seen.entry(key).or_insert(0);
                    *count += 1;
                    *count - 1
                } else {
                    0
                };
                members.push(RosterMember {
                    session_id: self.session_id_for(team.id, member, occurrence),
                    member: member.clone(),
                });
            }
            entries.push(RosterTeam { team, members });
        }
        self.teams = entries;

        let selection_valid = self
            .selected
            .is_some_and(|id| self.teams.iter().any(|t| t.team.id == id));
        if !selection_valid {
            self.selected = self.teams.first().map(|t| t.team.id);
        }
    }

    fn session_id_for(&mut self, team_id: i64, member: &Member, occurrence: usize) -> SessionId {
        if let Some(id) = member.id {
            return SessionId::for_member(id);
        }
        let role = member.role.as_str().to_string();
        self.synthesized
            .entry((team_id, role.clone(), member.name.clone(), occurrence))
            .or_insert_with(|| SessionId::synthesize(&role, &member.name))
            .clone()
    }

    /// All teams.
    pub fn teams(&self) -> impl Iterator<Item = &Team> {
        self.teams.iter().map(|t| &t.team)
    }

    /// Select a team. Returns `false` for an unknown id.
    pub fn select(&mut self, team_id: i64) -> bool {
        if self.teams.iter().any(|t| t.team.id == team_id) {
            self.selected = Some(team_id);
            true
        } else {
            false
        }
    }

    /// The selected team.
    pub fn selected_team(&self) -> Option<&Team> {
        self.selected_entry().map(|t| &t.team)
    }

    fn selected_entry(&self) -> Option<&RosterTeam> {
        let id = self.selected?;
        self.teams.iter().find(|t| t.team.id == id)
    }

    /// Members of the selected team.
    pub fn members(&self) -> &[RosterMember] {
        self.selected_entry()
            .map(|t| t.members.as_slice())
            .unwrap_or_default()
    }

    /// Session ids of the selected team's members.
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.members().iter().map(|m| m.session_id.clone()).collect()
    }

    /// Find a member of any team by session id.
    pub fn find(&self, session_id: &SessionId) -> Option<(&Team, &RosterMember)> {
        self.teams.iter().find_map(|t| {
            t.members
                .iter()
                .find(|m| &m.session_id == session_id)
                .map(|m| (&t.team, m))
        })
    }

    /// Connect target for a session id, if it belongs to a known member.
    pub fn connect_target(&self, session_id: &SessionId) -> Option<ConnectTarget> {
        self.find(session_id).map(|(team, roster_member)| {
            ConnectTarget::for_member(session_id.clone(), &roster_member.member, team)
        })
    }
}
