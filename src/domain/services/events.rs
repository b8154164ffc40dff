#[cfg(test)]
#[path = "events_test.rs"]
mod tests;

use anyhow::Result;
use crossterm::event::Event as CrosstermEvent;
use crossterm::event::EventStream;
use crossterm::event::KeyCode;
use crossterm::event::MouseEventKind;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time;
use tui_textarea::Input;
use tui_textarea::Key;

use crate::domain::models::Event;

pub fn help_text() -> String {
    let text = r#"
HOTKEYS:
- Enter - Send your question
- CTRL+N - Start a new chat
- Tab / Shift+Tab - Move through past sessions
- CTRL+O - Open the selected session
- CTRL+X - Delete the selected session
- Up arrow / Down arrow - Scroll
- Page up / Page down - Scroll a page at a time
- CTRL+C - Exit
        "#;

    return text.trim().to_string();
}

fn map_input(input: Input) -> Event {
    match input {
        Input { key: Key::Down, .. } | Input {
            key: Key::MouseScrollDown,
            ..
        } => {
            return Event::UIScrollDown();
        }
        Input { key: Key::Up, .. } | Input {
            key: Key::MouseScrollUp,
            ..
        } => {
            return Event::UIScrollUp();
        }
        Input {
            key: Key::PageDown, ..
        } => {
            return Event::UIScrollPageDown();
        }
        Input { key: Key::PageUp, .. } => {
            return Event::UIScrollPageUp();
        }
        Input { key: Key::Tab, .. } => {
            return Event::UISelectNext();
        }
        Input {
            key: Key::Char('c'),
            ctrl: true,
            ..
        } => {
            return Event::KeyboardCTRLC();
        }
        Input {
            key: Key::Char('n'),
            ctrl: true,
            ..
        } => {
            return Event::KeyboardCTRLN();
        }
        Input {
            key: Key::Char('o'),
            ctrl: true,
            ..
        } => {
            return Event::KeyboardCTRLO();
        }
        Input {
            key: Key::Char('x'),
            ctrl: true,
            ..
        } => {
            return Event::KeyboardCTRLX();
        }
        Input {
            key: Key::Enter, ..
        } => {
            return Event::KeyboardEnter();
        }
        input => {
            return Event::KeyboardCharInput(input);
        }
    }
}

pub struct EventsService {
    crossterm_events: EventStream,
    events: mpsc::UnboundedReceiver<Event>,
}

impl EventsService {
    pub fn new(events: mpsc::UnboundedReceiver<Event>) -> EventsService {
        return EventsService {
            crossterm_events: EventStream::new(),
            events,
        };
    }

    fn handle_crossterm(&self, event: CrosstermEvent) -> Option<Event> {
        match event {
            CrosstermEvent::Paste(text) => {
                return Some(Event::KeyboardPaste(text));
            }
            CrosstermEvent::Mouse(mouseevent) => match mouseevent.kind {
                MouseEventKind::ScrollUp => return Some(Event::UIScrollUp()),
                MouseEventKind::ScrollDown => return Some(Event::UIScrollDown()),
                _ => return None,
            },
            CrosstermEvent::Key(keyevent) => {
                if keyevent.code == KeyCode::BackTab {
                    return Some(Event::UISelectPrevious());
                }

                return Some(map_input(keyevent.into()));
            }
            _ => return None,
        }
    }

    pub async fn next(&mut self) -> Result<Event> {
        loop {
            let evt = tokio::select! {
                event = self.events.recv() => event,
                event = self.crossterm_events.next() => match event {
                    Some(Ok(input)) => self.handle_crossterm(input),
                    Some(Err(_)) => None,
                    None => None
                },
                _ = time::sleep(time::Duration::from_millis(500)) => Some(Event::UITick())
            };

            if let Some(event) = evt {
                return Ok(event);
            }
        }
    }
}
