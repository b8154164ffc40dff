#[cfg(test)]
#[path = "simulator_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use strum::EnumVariantNames;
use tokio::sync::mpsc;
use tokio::time;

use super::catalogue;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatRequest;
use crate::domain::models::ChatType;
use crate::domain::models::Event;
use crate::domain::models::Responder;
use crate::domain::models::ResponderEvent;
use crate::domain::models::ResponderEventKind;

#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Pacing {
    /// The same delay after every character.
    Fixed,
    /// Longer pauses after sentence ends, line breaks and clause breaks.
    Punctuation,
}

impl Pacing {
    pub fn parse(text: String) -> Option<Pacing> {
        return match text.as_str() {
            "fixed" => Some(Pacing::Fixed),
            "punctuation" => Some(Pacing::Punctuation),
            _ => None,
        };
    }

    pub fn delay_after(&self, ch: char, base: Duration) -> Duration {
        if *self == Pacing::Fixed {
            return base;
        }

        match ch {
            '.' | '!' | '?' => return base * 8,
            '\n' => return base * 6,
            ',' | ':' => return base * 4,
            _ => return base,
        }
    }
}

fn stages(chat_type: ChatType) -> Vec<(&'static str, Duration)> {
    match chat_type {
        ChatType::Unified => {
            return vec![
                ("Analyzing your question...", Duration::from_millis(600)),
                ("Searching course materials...", Duration::from_millis(800)),
                ("Generating response...", Duration::from_millis(500)),
            ];
        }
        ChatType::Syllabus => {
            return vec![("Checking syllabus...", Duration::from_millis(800))];
        }
    }
}

/// Offline stand-in for the course assistant API. Answers come from a fixed
/// catalogue and are revealed one character at a time.
pub struct ResponseSimulator {
    char_delay: Duration,
    pacing: Pacing,
    show_stages: bool,
}

impl Default for ResponseSimulator {
    fn default() -> ResponseSimulator {
        let char_delay = Config::get(ConfigKey::SimulatorDelay)
            .parse::<u64>()
            .unwrap_or(10);
        let pacing =
            Pacing::parse(Config::get(ConfigKey::SimulatorPacing)).unwrap_or(Pacing::Fixed);
        let show_stages = Config::get(ConfigKey::SimulatorStages) != "false";

        return ResponseSimulator::new(Duration::from_millis(char_delay), pacing, show_stages);
    }
}

impl ResponseSimulator {
    pub fn new(char_delay: Duration, pacing: Pacing, show_stages: bool) -> ResponseSimulator {
        return ResponseSimulator {
            char_delay,
            pacing,
            show_stages,
        };
    }

    fn send(
        tx: &mpsc::UnboundedSender<Event>,
        request: &ChatRequest,
        kind: ResponderEventKind,
    ) -> Result<()> {
        tx.send(Event::Responder(ResponderEvent::new(request, kind)))?;
        return Ok(());
    }
}

#[async_trait]
impl Responder for ResponseSimulator {
    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn respond<'a>(
        &self,
        request: ChatRequest,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        if self.show_stages {
            for (stage, duration) in stages(request.chat_type) {
                ResponseSimulator::send(
                    tx,
                    &request,
                    ResponderEventKind::Stage(stage.to_string()),
                )?;
                time::sleep(duration).await;
            }
        }

        let answer = catalogue::answer(request.chat_type, &request.question);
        ResponseSimulator::send(tx, &request, ResponderEventKind::Started)?;

        let mut accumulated = "".to_string();
        for ch in answer.chars() {
            accumulated.push(ch);
            ResponseSimulator::send(
                tx,
                &request,
                ResponderEventKind::Chunk {
                    chunk: ch.to_string(),
                    accumulated: accumulated.to_string(),
                },
            )?;

            let delay = self.pacing.delay_after(ch, self.char_delay);
            if !delay.is_zero() {
                time::sleep(delay).await;
            }
        }

        ResponseSimulator::send(tx, &request, ResponderEventKind::Complete(answer))?;
        return Ok(());
    }
}
