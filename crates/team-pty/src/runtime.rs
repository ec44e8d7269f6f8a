//! The control surface: a single-threaded loop over operator commands and
//! transport events.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info};

use team_pty_core::{Error, Result, RuntimeConfig, SessionId};
use team_pty_session::{
    event_channel, normalize_operator_text, Connector, EventReceiver, EventSender,
    LifecycleController, SessionEvent, SharedOutputLog, WsConnector,
};

use crate::api::ApiClient;
use crate::auth::load_user_id;
use crate::commands::{Command, SendTarget, HELP};
use crate::roster::Roster;

/// Whether the loop keeps going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading commands
    Continue,
    /// Exit the loop
    Quit,
}

/// Application state behind the control surface.
pub struct App {
    api: ApiClient,
    user_id: Option<i64>,
    roster: Roster,
    controller: LifecycleController,
    transcript: SharedOutputLog,
}

impl App {
    /// Create the application.
    ///
    /// Transport events are posted to the sending half of an event channel;
    /// the caller passes them to [`handle_event`](Self::handle_event).
    pub fn new(
        config: &RuntimeConfig,
        api: ApiClient,
        connector: Arc<dyn Connector>,
        events: EventSender,
        user_id: Option<i64>,
    ) -> Self {
        let transcript = SharedOutputLog::new();
        let controller = LifecycleController::from_config(
            config,
            connector,
            events,
            Arc::new(transcript.clone()),
        );

        Self {
            api,
            user_id,
            roster: Roster::new(),
            controller,
            transcript,
        }
    }

    /// Operator transcript.
    pub fn transcript(&self) -> &SharedOutputLog {
        &self.transcript
    }

    /// Team roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Lifecycle controller.
    pub fn controller(&self) -> &LifecycleController {
        &self.controller
    }

    fn notice(&self, text: &str) {
        self.transcript.lock().append_notice(text);
    }

    fn require_user(&self) -> Result<i64> {
        self.user_id.ok_or(Error::NotSignedIn)
    }

    fn require_team(&self) -> Result<i64> {
        self.roster
            .selected_team()
            .map(|team| team.id)
            .ok_or_else(|| Error::InvalidInput("no team selected".to_string()))
    }

    /// Reload teams for the signed-in user.
    pub async fn refresh(&mut self) {
        let Some(user_id) = self.user_id else {
            debug!("No signed-in user, roster stays empty");
            return;
        };
        let teams = self.api.list_teams(user_id).await;
        self.roster.replace(teams);

        for session_id in self.controller.registry().ids() {
            if let Some(target) = self.roster.connect_target(&session_id) {
                self.controller
                    .set_settings_path(&session_id, &target.settings_path);
            }
        }
    }

    /// React to one transport event.
    pub fn handle_event(&mut self, event: SessionEvent) {
        self.controller.handle_event(event);
    }

    /// Run one command.
    ///
    /// Errors are shown to the operator as notices; only `quit` ends the loop.
    pub async fn execute(&mut self, command: Command) -> Flow {
        match self.run_command(command).await {
            Ok(flow) => flow,
            Err(e) => {
                self.notice(&e.to_string());
                Flow::Continue
            }
        }
    }

    async fn run_command(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Teams => {
                self.require_user()?;
                self.refresh().await;
                let selected = self.roster.selected_team().map(|team| team.id);
                let lines: Vec<String> = self
                    .roster
                    .teams()
                    .map(|team| {
                        let marker = if Some(team.id) == selected { "*" } else { " " };
                        format!("{marker} {} {}", team.id, team.name)
                    })
                    .collect();
                self.print_lines("no teams", &lines);
            }
            Command::Team(id) => {
                if !self.roster.select(id) {
                    return Err(Error::InvalidInput(format!("unknown team: {id}")));
                }
                self.notice(&format!("team {id} selected"));
            }
            Command::Members => {
                let lines: Vec<String> = self
                    .roster
                    .members()
                    .iter()
                    .map(|m| {
                        format!(
                            "{} {} {} {}",
                            m.session_id,
                            m.member.name,
                            m.member.role,
                            self.controller.phase(&m.session_id)
                        )
                    })
                    .collect();
                self.print_lines("no members", &lines);
            }
            Command::Connect(session_id) => self.connect(&session_id),
            Command::ConnectAll => {
                for session_id in self.roster.session_ids() {
                    self.connect(&session_id);
                }
            }
            Command::Disconnect(session_id) => {
                self.controller.disconnect(&session_id);
            }
            Command::DisconnectAll => {
                self.controller.disconnect_all();
            }
            Command::Send { target, text } => self.send(target, &text),
            Command::Keys { session_id, data } => {
                self.controller.dispatcher().send_keys(&session_id, &data);
            }
            Command::Resize {
                session_id,
                cols,
                rows,
            } => {
                self.controller.dispatcher().resize(&session_id, cols, rows);
            }
            Command::Cli { session_id, cli } => {
                self.controller.set_cli(&session_id, cli);
                self.notice(&format!("{session_id} uses {cli}"));
            }
            Command::Perm {
                session_id,
                permission,
            } => {
                self.controller.set_permission(&session_id, permission)?;
                self.notice(&format!("{session_id} permission {permission}"));
            }
            Command::Status => {
                let lines: Vec<String> = self
                    .controller
                    .sessions()
                    .into_iter()
                    .map(|s| {
                        let mut line = format!(
                            "{} {} {} cli={} permission={} handshake={} prompt={} since={}",
                            s.session_id,
                            s.display_name,
                            s.phase,
                            s.cli,
                            s.permission,
                            s.handshake_completed,
                            s.agent_prompt_seen,
                            s.created_at.format("%H:%M:%S")
                        );
                        if let Some(reply) = &s.last_reply {
                            line.push_str(&format!(" last={reply:?}"));
                        }
                        line
                    })
                    .collect();
                self.print_lines("no live sessions", &lines);
            }
            Command::NewTeam(name) => {
                let user_id = self.require_user()?;
                if self.api.create_team(&name, user_id).await {
                    self.refresh().await;
                    self.notice(&format!("team {name} created"));
                }
            }
            Command::NewProject(name) => {
                let team_id = self.require_team()?;
                if self.api.create_project(&name, team_id).await {
                    self.notice(&format!("project {name} created"));
                }
            }
            Command::Projects => {
                let team_id = self.require_team()?;
                let lines: Vec<String> = self
                    .api
                    .list_projects(team_id)
                    .await
                    .into_iter()
                    .map(|p| format!("{} {}", p.id, p.name))
                    .collect();
                self.print_lines("no projects", &lines);
            }
            Command::NewMember { name, role, config } => {
                let team_id = self.require_team()?;
                if self
                    .api
                    .create_member(&name, &role, config.as_deref(), team_id)
                    .await
                {
                    self.refresh().await;
                    self.notice(&format!("member {name} created"));
                }
            }
            Command::Delete {
                session_id,
                confirmed,
            } => self.delete(&session_id, confirmed).await?,
            Command::Help => {
                let lines: Vec<String> = HELP.lines().map(str::to_string).collect();
                self.print_lines("", &lines);
            }
            Command::Quit => {
                self.controller.disconnect_all();
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn print_lines(&self, empty: &str, lines: &[String]) {
        let mut transcript = self.transcript.lock();
        if lines.is_empty() {
            transcript.append_notice(empty);
        }
        for line in lines {
            transcript.append_notice(line);
        }
    }

    fn connect(&mut self, session_id: &SessionId) {
        match self.roster.connect_target(session_id) {
            Some(target) => {
                self.controller.connect(&target);
            }
            None => debug!("No member for session, connect is a no-op: id={}", session_id),
        }
    }

    fn send(&mut self, target: SendTarget, text: &str) {
        let Some(text) = normalize_operator_text(text) else {
            return;
        };
        self.transcript.lock().append_local(&text);

        let report = match target {
            SendTarget::All => {
                let team = self.roster.session_ids();
                self.controller.dispatcher().broadcast(&team, &text)
            }
            SendTarget::Session(session_id) => {
                self.controller.dispatcher().send_to(&session_id, &text)
            }
        };
        debug!(
            "Send finished: sent={}, skipped={}",
            report.sent.len(),
            report.skipped.len()
        );
    }

    async fn delete(&mut self, session_id: &SessionId, confirmed: bool) -> Result<()> {
        let (name, member_id) = match self.roster.find(session_id) {
            Some((_, m)) => (m.member.name.clone(), m.member.id),
            None => return Err(Error::SessionNotFound(session_id.clone())),
        };
        let Some(member_id) = member_id else {
            return Err(Error::InvalidInput(format!(
                "{name} has no persisted id and cannot be deleted"
            )));
        };
        if !confirmed {
            self.notice(&format!("delete {name}? repeat with --yes to confirm"));
            return Ok(());
        }

        if let Err(e) = self.api.delete_member(member_id).await {
            error!("Member deletion failed: member={}, error={}", member_id, e);
            return Err(Error::Api(format!("failed to delete {name}: {e}")));
        }

        info!("Member deleted: member={}, session={}", member_id, session_id);
        self.controller.remove(session_id);
        self.refresh().await;
        self.notice(&format!("member {name} deleted"));
        Ok(())
    }
}

/// Build the application from configuration and run it on stdin/stdout
/// until `quit` or end of input.
pub async fn run(config: RuntimeConfig) -> anyhow::Result<()> {
    let api = ApiClient::from_settings(&config.server)?;
    let user_id = load_user_id(config.auth.user_file.as_deref());
    if user_id.is_none() {
        info!("No signed-in user; sessions cannot be created until one is available");
    }

    let (events_tx, events_rx) = event_channel();
    let connector = Arc::new(WsConnector::new(config.server.ws_url.clone()));
    let mut app = App::new(&config, api, connector, events_tx, user_id);
    app.refresh().await;

    run_loop(&mut app, events_rx).await
}

async fn run_loop(app: &mut App, mut events: EventReceiver) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    flush_transcript(app, &mut stdout).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed, shutting down");
                    app.execute(Command::Quit).await;
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                let flow = match line.parse::<Command>() {
                    Ok(command) => app.execute(command).await,
                    Err(e) => {
                        app.notice(&e.to_string());
                        Flow::Continue
                    }
                };
                flush_transcript(app, &mut stdout).await?;
                if flow == Flow::Quit {
                    break;
                }
            }
            Some(event) = events.recv() => {
                app.handle_event(event);
                flush_transcript(app, &mut stdout).await?;
            }
        }
    }

    flush_transcript(app, &mut stdout).await?;
    Ok(())
}

async fn flush_transcript(app: &App, stdout: &mut tokio::io::Stdout) -> anyhow::Result<()> {
    let pending = app.transcript().lock().read_since_last();
    if !pending.is_empty() {
        stdout.write_all(pending.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}
