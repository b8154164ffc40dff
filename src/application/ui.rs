use std::io;

use anyhow::Result;
use chrono::DateTime;
use chrono::FixedOffset;
use chrono::Local;
use crossterm::cursor;
use crossterm::event::DisableMouseCapture;
use crossterm::event::EnableMouseCapture;
use crossterm::terminal::disable_raw_mode;
use crossterm::terminal::enable_raw_mode;
use crossterm::terminal::EnterAlternateScreen;
use crossterm::terminal::LeaveAlternateScreen;
use ratatui::backend::CrosstermBackend;
use ratatui::prelude::*;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::List;
use ratatui::widgets::ListItem;
use ratatui::widgets::ListState;
use ratatui::widgets::Padding;
use ratatui::widgets::Paragraph;
use ratatui::widgets::Scrollbar;
use ratatui::widgets::ScrollbarOrientation;
use ratatui::Terminal;
use tokio::sync::mpsc;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::ChatType;
use crate::domain::models::Event;
use crate::domain::models::Loading;
use crate::domain::models::Role;
use crate::domain::models::TextArea;
use crate::domain::services::events::EventsService;
use crate::domain::services::AppState;
use crate::domain::services::LineKind;
use crate::domain::services::SessionStore;
use crate::infrastructure::responders::stream_client::StreamClient;

const INPUT_TITLE: &str = "Ask a question";
const SIDEBAR_WIDTH: u16 = 34;

fn render_sidebar<B: Backend>(frame: &mut Frame<B>, rect: Rect, app_state: &AppState) {
    let now: DateTime<FixedOffset> = Local::now().into();
    let current = app_state.conversation.current_session_id();

    let items = app_state
        .conversation
        .sessions()
        .iter()
        .map(|session| {
            let mut title_style = Style::default();
            if Some(session.id.as_str()) == current {
                title_style = title_style.add_modifier(Modifier::BOLD).fg(Color::Cyan);
            }

            return ListItem::new(vec![
                Line::from(Span::styled(session.title.to_string(), title_style)),
                Line::from(Span::styled(
                    format!(
                        "{} messages · {}",
                        session.message_count,
                        session.updated_ago(now)
                    ),
                    Style::default().fg(Color::DarkGray),
                )),
            ]);
        })
        .collect::<Vec<ListItem>>();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .title("Sessions");

    if items.is_empty() {
        frame.render_widget(
            Paragraph::new("No saved sessions yet.")
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            rect,
        );
        return;
    }

    let mut state = ListState::default();
    state.select(Some(app_state.selected_session));
    frame.render_stateful_widget(
        List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(Color::DarkGray))
            .highlight_symbol("> "),
        rect,
        &mut state,
    );
}

fn render_transcript<B: Backend>(frame: &mut Frame<B>, rect: Rect, app_state: &mut AppState) {
    let conversation = &app_state.conversation;
    let mut title = conversation.chat_type().display_name().to_string();
    if !conversation.backend_available() {
        title = format!("{title} (offline)");
    }

    let lines = app_state
        .transcript()
        .into_iter()
        .map(|line| {
            let style = match line.kind {
                LineKind::Header(Role::User) => {
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
                }
                LineKind::Header(Role::Assistant) => {
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
                }
                LineKind::Body | LineKind::Blank => Style::default(),
            };

            return Line::from(Span::styled(line.text, style));
        })
        .collect::<Vec<Line>>();

    frame.render_widget(
        Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(title)
                    .padding(Padding::new(1, 1, 0, 0)),
            )
            .scroll((app_state.scroll.position, 0)),
        rect,
    );
    frame.render_stateful_widget(
        Scrollbar::new(ScrollbarOrientation::VerticalRight),
        rect.inner(&Margin {
            vertical: 1,
            horizontal: 0,
        }),
        &mut app_state.scroll.scrollbar_state,
    );
}

async fn start_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    app_state: &mut AppState,
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let mut textarea = TextArea::new(INPUT_TITLE);
    let loading = Loading::default();
    let mut events = EventsService::new(rx);

    loop {
        terminal.draw(|frame| {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints(vec![Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
                .split(frame.size());
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints(vec![Constraint::Min(1), Constraint::Max(4)])
                .split(columns[1]);

            if rows[0].width != app_state.last_known_width
                || rows[0].height != app_state.last_known_height
            {
                app_state.set_rect(rows[0]);
            }

            render_sidebar(frame, columns[0], app_state);
            render_transcript(frame, rows[0], app_state);

            if app_state.conversation.is_busy() {
                loading.render(frame, rows[1], app_state.conversation.processing_stage());
            } else {
                frame.render_widget(textarea.widget(), rows[1]);
            }
        })?;

        match events.next().await? {
            Event::KeyboardCTRLC() => {
                break;
            }
            Event::KeyboardEnter() => {
                let question = textarea.lines().join("\n");
                if app_state.submit(&question, &tx).await? {
                    textarea = TextArea::new(INPUT_TITLE);
                }
            }
            Event::KeyboardCharInput(input) => {
                if !app_state.conversation.is_busy() {
                    textarea.input(input);
                }
            }
            Event::KeyboardPaste(text) => {
                if !app_state.conversation.is_busy() {
                    for ch in text.chars() {
                        if ch == '\n' {
                            textarea.insert_newline();
                        } else if ch != '\r' {
                            textarea.insert_char(ch);
                        }
                    }
                }
            }
            Event::KeyboardCTRLN() => {
                app_state.new_chat();
            }
            Event::KeyboardCTRLO() => {
                app_state.open_selected().await;
            }
            Event::KeyboardCTRLX() => {
                app_state.delete_selected().await;
            }
            Event::Responder(event) => {
                app_state.handle_responder_event(event).await;
            }
            Event::UIScrollDown() => {
                app_state.scroll.down();
            }
            Event::UIScrollUp() => {
                app_state.scroll.up();
            }
            Event::UIScrollPageDown() => {
                app_state.scroll.down_page();
            }
            Event::UIScrollPageUp() => {
                app_state.scroll.up_page();
            }
            Event::UISelectNext() => {
                app_state.select_next();
            }
            Event::UISelectPrevious() => {
                app_state.select_previous();
            }
            Event::UITick() => {
                continue;
            }
        }
    }

    return Ok(());
}

pub fn destruct_terminal_for_panic() {
    let _ = disable_raw_mode();
    let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
    let _ = crossterm::execute!(io::stdout(), cursor::Show);
}

pub async fn start(
    tx: mpsc::UnboundedSender<Action>,
    rx: mpsc::UnboundedReceiver<Event>,
) -> Result<()> {
    let chat_type = ChatType::parse(Config::get(ConfigKey::ChatType)).unwrap_or(ChatType::Unified);
    let store = SessionStore::from_config()?;

    let backend_available = StreamClient::default().check_health().await;
    if !backend_available {
        tracing::warn!(
            api_url = Config::get(ConfigKey::ApiUrl),
            "Course assistant unavailable, answering with the simulator"
        );
    }

    let mut app_state = AppState::new(
        chat_type,
        store,
        backend_available,
        &Config::get(ConfigKey::SessionID),
    )
    .await;

    let stdout = io::stdout();
    let mut stdout = stdout.lock();

    enable_raw_mode()?;
    crossterm::execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(term_backend)?;

    start_loop(&mut terminal, &mut app_state, tx, rx).await?;

    disable_raw_mode()?;
    crossterm::execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    return Ok(());
}
