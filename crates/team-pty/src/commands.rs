//! Control-surface command parsing.

use std::str::FromStr;

use team_pty_core::{CliBackend, Error, MemberRole, Permission, Result, SessionId};

/// Recipient of operator text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendTarget {
    /// Every ready session of the selected team
    All,
    /// One session
    Session(SessionId),
}

/// One control-surface command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List teams
    Teams,
    /// Select a team
    Team(i64),
    /// List members of the selected team
    Members,
    /// Connect one session
    Connect(SessionId),
    /// Connect every member of the selected team
    ConnectAll,
    /// Disconnect one session
    Disconnect(SessionId),
    /// Disconnect every session
    DisconnectAll,
    /// Send operator text as a structured command
    Send {
        /// Recipient
        target: SendTarget,
        /// Text
        text: String,
    },
    /// Pass raw keystrokes through
    Keys {
        /// Recipient
        session_id: SessionId,
        /// Keystrokes, escapes already expanded
        data: String,
    },
    /// Resize a session's viewport
    Resize {
        /// Session
        session_id: SessionId,
        /// Columns
        cols: u16,
        /// Rows
        rows: u16,
    },
    /// Select a session's backend
    Cli {
        /// Session
        session_id: SessionId,
        /// Backend
        cli: CliBackend,
    },
    /// Select a session's permission
    Perm {
        /// Session
        session_id: SessionId,
        /// Permission
        permission: Permission,
    },
    /// Show session status
    Status,
    /// Create a team
    NewTeam(String),
    /// Create a project in the selected team
    NewProject(String),
    /// List projects of the selected team
    Projects,
    /// Create a member in the selected team
    NewMember {
        /// Name
        name: String,
        /// Role tag
        role: MemberRole,
        /// Optional configuration text
        config: Option<String>,
    },
    /// Delete a member
    Delete {
        /// Session of the member
        session_id: SessionId,
        /// Whether the operator confirmed with `--yes`
        confirmed: bool,
    },
    /// Show command help
    Help,
    /// Close everything and exit
    Quit,
}

/// Command summary shown by `help`.
pub const HELP: &str = "\
teams | team <id> | members | projects | status
connect <sid> | connect-all | disconnect <sid> | disconnect-all
send <sid|all> <text> | keys <sid> <text> | resize <sid> <cols> <rows>
cli <sid> <claude|codex|gemini> | perm <sid> <permission>
new-team <name> | new-project <name> | new-member <name> <role> [config]
delete <sid> --yes | help | quit";

fn split_word(input: &str) -> (&str, &str) {
    let input = input.trim_start();
    match input.find(char::is_whitespace) {
        Some(idx) => (&input[..idx], input[idx..].trim_start()),
        None => (input, ""),
    }
}

fn required<'a>(value: &'a str, what: &str, command: &str) -> Result<&'a str> {
    if value.is_empty() {
        Err(Error::InvalidInput(format!("{command}: missing {what}")))
    } else {
        Ok(value)
    }
}

fn number<T: FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid {what}: {value}")))
}

/// Expand `\r`, `\n`, `\t`, `\e` and `\\` in keystroke text.
pub fn unescape_keys(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('e') => out.push('\u{1b}'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

impl FromStr for Command {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let (name, rest) = split_word(line.trim());
        let command = match name {
            "teams" => Self::Teams,
            "team" => Self::Team(number(required(rest, "team id", name)?, "team id")?),
            "members" => Self::Members,
            "connect" => Self::Connect(SessionId::from(required(rest, "session id", name)?)),
            "connect-all" => Self::ConnectAll,
            "disconnect" => Self::Disconnect(SessionId::from(required(rest, "session id", name)?)),
            "disconnect-all" => Self::DisconnectAll,
            "send" => {
                let (target, text) = split_word(rest);
                let target = match required(target, "target", name)? {
                    "all" => SendTarget::All,
                    id => SendTarget::Session(SessionId::from(id)),
                };
                Self::Send {
                    target,
                    text: text.to_string(),
                }
            }
            "keys" => {
                let (session_id, text) = split_word(rest);
                Self::Keys {
                    session_id: SessionId::from(required(session_id, "session id", name)?),
                    data: unescape_keys(required(text, "keys", name)?),
                }
            }
            "resize" => {
                let (session_id, rest) = split_word(rest);
                let (cols, rest) = split_word(rest);
                let (rows, _) = split_word(rest);
                Self::Resize {
                    session_id: SessionId::from(required(session_id, "session id", name)?),
                    cols: number(required(cols, "columns", name)?, "columns")?,
                    rows: number(required(rows, "rows", name)?, "rows")?,
                }
            }
            "cli" => {
                let (session_id, cli) = split_word(rest);
                Self::Cli {
                    session_id: SessionId::from(required(session_id, "session id", name)?),
                    cli: required(cli, "backend", name)?.parse()?,
                }
            }
            "perm" => {
                let (session_id, permission) = split_word(rest);
                Self::Perm {
                    session_id: SessionId::from(required(session_id, "session id", name)?),
                    permission: required(permission, "permission", name)?.parse()?,
                }
            }
            "status" => Self::Status,
            "new-team" => Self::NewTeam(required(rest, "name", name)?.to_string()),
            "new-project" => Self::NewProject(required(rest, "name", name)?.to_string()),
            "projects" => Self::Projects,
            "new-member" => {
                let (member, rest) = split_word(rest);
                let (role, config) = split_word(rest);
                Self::NewMember {
                    name: required(member, "name", name)?.to_string(),
                    role: MemberRole::from(required(role, "role", name)?.to_string()),
                    config: (!config.is_empty()).then(|| config.to_string()),
                }
            }
            "delete" => {
                let (session_id, flag) = split_word(rest);
                Self::Delete {
                    session_id: SessionId::from(required(session_id, "session id", name)?),
                    confirmed: flag.split_whitespace().any(|word| word == "--yes"),
                }
            }
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "" => return Err(Error::InvalidInput("empty command".to_string())),
            other => return Err(Error::InvalidInput(format!("unknown command: {other}"))),
        };
        Ok(command)
    }
}
