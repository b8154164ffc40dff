#[cfg(test)]
#[path = "actions_test.rs"]
mod tests;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::domain::models::Action;
use crate::domain::models::ChatRequest;
use crate::domain::models::Event;
use crate::domain::models::ResponderEvent;
use crate::domain::models::ResponderEventKind;
use crate::infrastructure::responders::ResponderManager;

fn worker_error(
    err: anyhow::Error,
    request: &ChatRequest,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    tracing::error!(error = ?err, session_id = request.session_id, "Responder failed");
    tx.send(Event::Responder(ResponderEvent::new(
        request,
        ResponderEventKind::Error(err.to_string()),
    )))?;

    return Ok(());
}

pub struct ActionsService {}

impl ActionsService {
    /// Runs every request on its own task. Answers, including late ones, are
    /// reported back as `Event::Responder`.
    pub async fn start(
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        loop {
            let action = match rx.recv().await {
                Some(action) => action,
                None => return Ok(()),
            };

            let worker_tx = tx.clone();
            match action {
                Action::ResponderRequest(request) => {
                    tokio::spawn(async move {
                        let res = ResponderManager::get(&request)
                            .respond(request.clone(), &worker_tx)
                            .await;

                        if let Err(err) = res {
                            worker_error(err, &request, &worker_tx)?;
                        }

                        return Ok::<(), anyhow::Error>(());
                    });
                }
            }
        }
    }
}
