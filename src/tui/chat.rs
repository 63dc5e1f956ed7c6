use crate::chat::{
    format_response_time, stage_image, ChatError, ChatServices, Conversation, ExchangeOutcome,
};
use crate::history::{format_chat_title, Message, Role, SessionSummary};
use crate::llm::ChatModel;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::{cursor, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

pub const CHAT_EXIT_COMMANDS: &[&str] = &["/exit", "exit", "quit"];
const PROCESSING_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
const UI_POLL_INTERVAL: Duration = Duration::from_millis(60);
const SPINNER_TICK_INTERVAL: Duration = Duration::from_millis(120);
const CURSOR_BLINK_INTERVAL: Duration = Duration::from_millis(500);
const SIDEBAR_WIDTH: u16 = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Empty,
    Exit,
    NewChat,
    Attach(PathBuf),
    Detach,
    Message(String),
}

/// Commands are matched on the trimmed line; messages keep the text as typed.
pub fn parse_input_line(line: &str) -> InputCommand {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return InputCommand::Empty;
    }
    if CHAT_EXIT_COMMANDS
        .iter()
        .any(|command| trimmed.eq_ignore_ascii_case(command))
    {
        return InputCommand::Exit;
    }
    if trimmed == "/new" {
        return InputCommand::NewChat;
    }
    if trimmed == "/detach" {
        return InputCommand::Detach;
    }
    if let Some(path) = trimmed.strip_prefix("/attach ") {
        let path = path.trim();
        if !path.is_empty() {
            return InputCommand::Attach(PathBuf::from(path));
        }
    }
    InputCommand::Message(line.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Input,
    Sidebar,
}

type ExchangeResult = (Conversation, Result<ExchangeOutcome, ChatError>);

struct ProcessingWorker {
    prompt: String,
    result_rx: Receiver<ExchangeResult>,
}

struct TuiState {
    input: String,
    conversation: Conversation,
    sessions: Vec<SessionSummary>,
    selected: usize,
    focus: Focus,
    notice: Option<String>,
    processing: Option<ProcessingWorker>,
    quit_pending: bool,
    spinner_index: usize,
    last_spinner_tick: Instant,
    cursor_visible: bool,
    last_cursor_tick: Instant,
}

impl TuiState {
    fn new(sessions: Vec<SessionSummary>) -> Self {
        Self {
            input: String::new(),
            conversation: Conversation::new(),
            sessions,
            selected: 0,
            focus: Focus::Input,
            notice: None,
            processing: None,
            quit_pending: false,
            spinner_index: 0,
            last_spinner_tick: Instant::now(),
            cursor_visible: true,
            last_cursor_tick: Instant::now(),
        }
    }

    fn spinner_frame(&self) -> &'static str {
        PROCESSING_FRAMES[self.spinner_index % PROCESSING_FRAMES.len()]
    }

    fn advance_spinner_if_needed(&mut self) {
        if self.processing.is_some() && self.last_spinner_tick.elapsed() >= SPINNER_TICK_INTERVAL {
            self.spinner_index = (self.spinner_index + 1) % PROCESSING_FRAMES.len();
            self.last_spinner_tick = Instant::now();
        }
    }

    fn advance_cursor_blink_if_needed(&mut self) {
        if self.last_cursor_tick.elapsed() >= CURSOR_BLINK_INTERVAL {
            self.cursor_visible = !self.cursor_visible;
            self.last_cursor_tick = Instant::now();
        }
    }

    fn cursor_suffix(&self) -> &'static str {
        if self.cursor_visible && self.focus == Focus::Input {
            "█"
        } else {
            " "
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.sessions.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.sessions.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    fn replace_sessions(&mut self, sessions: Vec<SessionSummary>) {
        self.sessions = sessions;
        if let Some(active) = self.conversation.active_chat_id() {
            if let Some(index) = self.sessions.iter().position(|s| &s.chat_id == active) {
                self.selected = index;
            }
        }
        self.move_selection(0);
    }

    /// First request while an exchange runs waits for it to be saved; a second one quits anyway.
    fn request_quit(&mut self) -> bool {
        if self.processing.is_none() || self.quit_pending {
            return true;
        }
        self.quit_pending = true;
        self.notice = Some("saving the reply before exit; press Esc again to quit now".to_string());
        false
    }

    fn exit_ready(&self) -> bool {
        self.quit_pending && self.processing.is_none()
    }

    fn selected_session(&self) -> Option<&SessionSummary> {
        self.sessions.get(self.selected)
    }

    fn header_lines(&self, model: &str) -> Vec<Line<'static>> {
        match self.conversation.active_chat_id() {
            Some(chat_id) => vec![
                Line::raw(format!("Topic: {}", format_chat_title(chat_id.as_str()))),
                Line::raw(format!("model={model} chat_id={chat_id}")),
            ],
            None => vec![
                Line::raw("New Chat"),
                Line::raw("A topic will be generated from your first message."),
            ],
        }
    }

    fn transcript_lines(&self) -> Vec<Line<'static>> {
        let mut lines: Vec<Line<'static>> = self
            .conversation
            .messages()
            .iter()
            .flat_map(message_lines)
            .collect();
        if let Some(worker) = &self.processing {
            lines.push(Line::styled(
                format!("you> {}", worker.prompt),
                Style::default().fg(Color::Yellow),
            ));
        }
        lines
    }

    fn status_line(&self) -> String {
        if self.processing.is_some() {
            if self.quit_pending {
                return format!("saving before exit {}", self.spinner_frame());
            }
            return format!("assistant> thinking {}", self.spinner_frame());
        }
        if let Some(notice) = &self.notice {
            return notice.clone();
        }
        let mut parts = Vec::new();
        if let Some(elapsed) = self.conversation.last_response_time() {
            parts.push(format!(
                "last response time: {}",
                format_response_time(elapsed)
            ));
        }
        if let Some(image) = self.conversation.staged_image() {
            parts.push(format!("image ready: {}", image.file_name));
        }
        parts.push(
            "Enter send | Tab sessions | Ctrl+N new | /attach <path> | /exit".to_string(),
        );
        parts.join(" | ")
    }
}

fn message_lines(message: &Message) -> Vec<Line<'static>> {
    let (speaker, color) = match message.role {
        Role::User => ("you", Color::Yellow),
        Role::Assistant => ("assistant", Color::Green),
    };
    let mut lines = vec![Line::styled(
        format!("{speaker}> {}", message.content),
        Style::default().fg(color),
    )];
    if message.role == Role::User && message.first_image().is_some() {
        lines.push(Line::styled(
            "     [attached image]",
            Style::default().fg(Color::Gray),
        ));
    }
    lines
}

/// Rough wrapped height of `lines` at `width`, used to keep the newest turns in view.
fn wrapped_height(lines: &[Line<'_>], width: u16) -> u16 {
    let width = usize::from(width.max(1));
    let total: usize = lines
        .iter()
        .map(|line| line.width().max(1).div_ceil(width))
        .sum();
    u16::try_from(total).unwrap_or(u16::MAX)
}

pub fn run_chat_tui(services: ChatServices) -> Result<Option<String>, String> {
    let sessions = services.store.list().map_err(|e| e.to_string())?;
    let mut terminal = setup_terminal()?;
    let mut state = TuiState::new(sessions);

    let result = run_event_loop(&mut terminal, &services, &mut state);
    teardown_terminal(&mut terminal)?;

    result.map(|_| {
        state
            .conversation
            .active_chat_id()
            .map(|chat_id| chat_id.to_string())
    })
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    services: &ChatServices,
    state: &mut TuiState,
) -> Result<(), String> {
    loop {
        state.advance_spinner_if_needed();
        state.advance_cursor_blink_if_needed();
        check_processing_result(services, state)?;
        if state.exit_ready() {
            break;
        }
        draw_chat_ui(terminal, services, state)?;

        if !event::poll(UI_POLL_INTERVAL).map_err(|e| format!("failed to poll events: {e}"))? {
            continue;
        }

        let Event::Key(key) = event::read().map_err(|e| format!("failed to read event: {e}"))?
        else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        let control = key.modifiers.contains(KeyModifiers::CONTROL);
        if (control && key.code == KeyCode::Char('c')) || key.code == KeyCode::Esc {
            if state.request_quit() {
                break;
            }
            continue;
        }
        if key.code == KeyCode::Tab {
            state.focus = match state.focus {
                Focus::Input => Focus::Sidebar,
                Focus::Sidebar => Focus::Input,
            };
            continue;
        }
        if control && key.code == KeyCode::Char('n') {
            start_new_chat(state);
            continue;
        }

        match state.focus {
            Focus::Sidebar => match key.code {
                KeyCode::Up => state.move_selection(-1),
                KeyCode::Down => state.move_selection(1),
                KeyCode::Enter => open_selected_session(services, state),
                KeyCode::Delete => delete_selected_session(services, state),
                KeyCode::Char('d') if control => delete_selected_session(services, state),
                _ => {}
            },
            Focus::Input => match key.code {
                KeyCode::Enter => {
                    let line = std::mem::take(&mut state.input);
                    if handle_input_line(services, state, &line) {
                        break;
                    }
                }
                KeyCode::Backspace => {
                    state.input.pop();
                }
                KeyCode::Char(c) if !control => {
                    state.input.push(c);
                }
                _ => {}
            },
        }
    }

    Ok(())
}

fn busy(state: &mut TuiState) -> bool {
    if state.processing.is_some() {
        state.notice = Some("still processing previous request".to_string());
        return true;
    }
    false
}

fn start_new_chat(state: &mut TuiState) {
    if busy(state) {
        return;
    }
    state.conversation.reset();
    state.notice = None;
    state.focus = Focus::Input;
}

fn open_selected_session(services: &ChatServices, state: &mut TuiState) {
    if busy(state) {
        return;
    }
    let Some(chat_id) = state.selected_session().map(|s| s.chat_id.clone()) else {
        return;
    };
    match state.conversation.select(&services.store, chat_id) {
        Ok(()) => {
            state.notice = None;
            state.focus = Focus::Input;
        }
        Err(err) => state.notice = Some(format!("failed to open session: {err}")),
    }
}

fn delete_selected_session(services: &ChatServices, state: &mut TuiState) {
    if busy(state) {
        return;
    }
    let Some(chat_id) = state.selected_session().map(|s| s.chat_id.clone()) else {
        return;
    };
    match services.store.delete(&chat_id) {
        Ok(_) => {
            services
                .log
                .info("session.deleted", &format!("chat_id={chat_id}"));
            state.conversation.forget(&chat_id);
            state.notice = Some(format!("deleted {}", format_chat_title(chat_id.as_str())));
        }
        Err(err) => state.notice = Some(err.to_string()),
    }
    refresh_sessions(services, state);
}

fn refresh_sessions(services: &ChatServices, state: &mut TuiState) {
    match services.store.list() {
        Ok(sessions) => state.replace_sessions(sessions),
        Err(err) => state.notice = Some(err.to_string()),
    }
}

/// Returns `true` when the user asked to quit.
fn handle_input_line(services: &ChatServices, state: &mut TuiState, line: &str) -> bool {
    match parse_input_line(line) {
        InputCommand::Empty => {}
        InputCommand::Exit => return state.request_quit(),
        InputCommand::NewChat => start_new_chat(state),
        InputCommand::Attach(path) => {
            if busy(state) {
                return false;
            }
            match stage_image(&path) {
                Ok(image) => {
                    state.notice = Some(format!(
                        "image ready to be sent: {} ({} bytes)",
                        image.file_name, image.byte_len
                    ));
                    state.conversation.stage_image(image);
                }
                Err(err) => state.notice = Some(err.to_string()),
            }
        }
        InputCommand::Detach => {
            if busy(state) {
                return false;
            }
            state.notice = state
                .conversation
                .clear_staged_image()
                .map(|image| format!("removed {}", image.file_name));
        }
        InputCommand::Message(prompt) => {
            if busy(state) {
                return false;
            }
            let mut conversation = state.conversation.clone();
            let worker_services = services.clone();
            let worker_prompt = prompt.clone();
            let (tx, rx) = mpsc::channel();
            thread::spawn(move || {
                let result = conversation.submit(worker_services.context(), &worker_prompt);
                let _ = tx.send((conversation, result));
            });

            state.notice = None;
            state.processing = Some(ProcessingWorker {
                prompt,
                result_rx: rx,
            });
            state.spinner_index = 0;
            state.last_spinner_tick = Instant::now();
            state.cursor_visible = true;
            state.last_cursor_tick = Instant::now();
        }
    }
    false
}

fn check_processing_result(services: &ChatServices, state: &mut TuiState) -> Result<(), String> {
    let Some(worker) = state.processing.take() else {
        return Ok(());
    };

    match worker.result_rx.try_recv() {
        Ok((conversation, result)) => {
            state.conversation = conversation;
            match result {
                Ok(outcome) => {
                    if let Some(topic) = outcome.created_from.filter(|t| t.is_fallback()) {
                        state.notice = Some(format!(
                            "topic generation failed; saved as {}",
                            format_chat_title(topic.label())
                        ));
                    }
                    refresh_sessions(services, state);
                }
                Err(err) => {
                    state.notice = Some(err.to_string());
                    state.input = worker.prompt;
                }
            }
        }
        Err(mpsc::TryRecvError::Empty) => {
            state.processing = Some(worker);
        }
        Err(mpsc::TryRecvError::Disconnected) => {
            return Err("chat exchange worker disconnected unexpectedly".to_string());
        }
    }

    Ok(())
}

fn draw_chat_ui(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    services: &ChatServices,
    state: &TuiState,
) -> Result<(), String> {
    terminal
        .draw(|frame| {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(20)])
                .split(frame.area());
            let sections = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4),
                    Constraint::Min(6),
                    Constraint::Length(3),
                    Constraint::Length(3),
                ])
                .split(columns[1]);

            let sidebar_border = if state.focus == Focus::Sidebar {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            let sidebar_block = Block::default()
                .title("Chat History")
                .borders(Borders::ALL)
                .border_style(sidebar_border);
            if state.sessions.is_empty() {
                frame.render_widget(
                    Paragraph::new("No chat history found.").block(sidebar_block),
                    columns[0],
                );
            } else {
                let items = state
                    .sessions
                    .iter()
                    .map(|session| ListItem::new(session.title.clone()))
                    .collect::<Vec<_>>();
                let list = List::new(items)
                    .block(sidebar_block)
                    .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
                    .highlight_symbol("> ");
                let mut list_state = ListState::default().with_selected(Some(state.selected));
                frame.render_stateful_widget(list, columns[0], &mut list_state);
            }

            let header = Paragraph::new(state.header_lines(services.client.model_name())).block(
                Block::default()
                    .title("Wandee")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
            frame.render_widget(header, sections[0]);

            let transcript = state.transcript_lines();
            let inner_height = sections[1].height.saturating_sub(2);
            let inner_width = sections[1].width.saturating_sub(2);
            let scroll = wrapped_height(&transcript, inner_width).saturating_sub(inner_height);
            let transcript_widget = Paragraph::new(transcript)
                .block(Block::default().title("Transcript").borders(Borders::ALL))
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0));
            frame.render_widget(transcript_widget, sections[1]);

            let status_widget = Paragraph::new(state.status_line()).block(
                Block::default()
                    .title("Status")
                    .borders(Borders::ALL)
                    .border_style(if state.processing.is_some() {
                        Style::default()
                            .fg(Color::Magenta)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    }),
            );
            frame.render_widget(status_widget, sections[2]);

            let input_widget =
                Paragraph::new(format!("you> {}{}", state.input, state.cursor_suffix()))
                    .block(Block::default().title("Input").borders(Borders::ALL));
            frame.render_widget(input_widget, sections[3]);
        })
        .map_err(|e| format!("failed to render chat UI: {e}"))?;

    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, String> {
    enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {e}"))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, cursor::Hide)
        .map_err(|e| format!("failed to enter alternate screen: {e}"))?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| format!("failed to initialize terminal: {e}"))
}

fn teardown_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<(), String> {
    disable_raw_mode().map_err(|e| format!("failed to disable raw mode: {e}"))?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, cursor::Show)
        .map_err(|e| format!("failed to leave alternate screen: {e}"))?;
    terminal
        .show_cursor()
        .map_err(|e| format!("failed to restore cursor: {e}"))?;
    Ok(())
}
