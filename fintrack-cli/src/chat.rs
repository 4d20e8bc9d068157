use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Terminal,
};
use std::io::{self, Stdout};
use std::path::PathBuf;

use fintrack_assist::classifier::HttpClassifier;
use fintrack_assist::conversation::{ConversationEngine, ConversationMessage, MessageKind, Role};
use fintrack_assist::store::MemoryLedger;

use crate::{config, state};

type Engine = ConversationEngine<HttpClassifier, MemoryLedger>;

struct ChatLog {
    path: PathBuf,
}

impl ChatLog {
    fn open_today() -> Result<Self> {
        let home = state::ensure_fintrack_home()?;
        let dir = home.join("chat");
        std::fs::create_dir_all(&dir)?;
        let today = chrono::Local::now().format("%Y-%m-%d").to_string();
        let path = dir.join(format!("{today}.md"));
        Ok(Self { path })
    }

    fn append(&mut self, role: &str, msg: &str) -> Result<()> {
        use std::io::Write;
        let mut f = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(
            f,
            "- {} [{}] {}",
            chrono::Local::now().to_rfc3339(),
            role,
            msg.replace('\n', " ")
        )?;
        Ok(())
    }
}

pub fn run_chat() -> Result<()> {
    let cfg = config::load_config()?;
    let ledger = state::load_ledger(cfg.ledger_settings())?;
    let classifier = HttpClassifier::new(cfg.classifier_config());
    let mut engine = ConversationEngine::new(classifier, ledger);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = chat_loop(&mut terminal, &mut engine);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    state::save_ledger(engine.store())?;
    res
}

fn chat_loop(terminal: &mut Terminal<CrosstermBackend<Stdout>>, engine: &mut Engine) -> Result<()> {
    let mut input = String::new();
    let mut log = ChatLog::open_today()?;
    log.append("system", "session_start")?;

    loop {
        terminal.draw(|f| {
            let size = f.area();
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(4),
                    Constraint::Min(5),
                    Constraint::Length(3),
                ])
                .split(size);

            let splash = Paragraph::new(Text::from(vec![
                Line::from(Span::styled(
                    "FinTrack",
                    Style::default()
                        .fg(Color::Yellow)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "Enter=enviar, Esc=sair",
                    Style::default().fg(Color::Gray),
                )),
            ]))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
            f.render_widget(splash, chunks[0]);

            let mut lines: Vec<Line> = Vec::new();
            for m in engine.log() {
                lines.extend(render_message(m));
                lines.push(Line::raw(""));
            }

            let history = Paragraph::new(Text::from(lines))
                .block(Block::default().borders(Borders::ALL).title("conversa"))
                .wrap(Wrap { trim: false });
            f.render_widget(history, chunks[1]);

            let input_widget = Paragraph::new(input.as_str())
                .block(Block::default().borders(Borders::ALL).title("mensagem"))
                .style(Style::default().fg(Color::White));
            f.render_widget(input_widget, chunks[2]);
        })?;

        if event::poll(std::time::Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Esc => break,
                    KeyCode::Enter => {
                        let trimmed = input.trim().to_string();
                        if !trimmed.is_empty() {
                            log.append("user", &trimmed)?;
                            let reply = send_blocking(engine, &trimmed)?;
                            log.append("assistant", &reply.content)?;
                        }
                        input.clear();
                    }
                    KeyCode::Backspace => {
                        input.pop();
                    }
                    KeyCode::Char(c) => {
                        input.push(c);
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

/// The TUI loop is synchronous while the engine is async. Inside the
/// program's runtime, block_in_place + Handle::block_on avoids the nested
/// runtime panic; outside one, a fresh runtime is created.
fn send_blocking(engine: &mut Engine, text: &str) -> Result<ConversationMessage> {
    if let Ok(handle) = tokio::runtime::Handle::try_current() {
        Ok(tokio::task::block_in_place(|| {
            handle.block_on(engine.handle_message(text))
        }))
    } else {
        let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
        Ok(rt.block_on(engine.handle_message(text)))
    }
}

fn render_message(message: &ConversationMessage) -> Vec<Line<'static>> {
    let (tag, color) = match message.role {
        Role::User => ("você", Color::Cyan),
        Role::Assistant => match message.kind {
            MessageKind::Success => ("fintrack", Color::Green),
            MessageKind::Error => ("fintrack", Color::Red),
            MessageKind::Confirmation
            | MessageKind::BulkConfirmation
            | MessageKind::DeleteConfirmation => ("fintrack", Color::Yellow),
            MessageKind::Plain => ("fintrack", Color::Magenta),
        },
    };

    let mut lines = Vec::new();
    for (i, part) in message.content.lines().enumerate() {
        if i == 0 {
            lines.push(Line::from(vec![
                Span::styled(format!("{tag}: "), Style::default().fg(color)),
                Span::raw(part.to_string()),
            ]));
        } else {
            lines.push(Line::raw(part.to_string()));
        }
    }
    if message.content.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("{tag}: "),
            Style::default().fg(color),
        )));
    }
    lines
}
