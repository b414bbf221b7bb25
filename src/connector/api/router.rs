use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::application::{DialogueController, UpdateSource};
use crate::domain::{InboundMessage, SessionKey};

use super::container::Container;

/// Pause after a failed poll before asking again.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);
/// How long a worker waits for in-flight generations once its queue closes.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

struct SessionWorker {
    queue: mpsc::UnboundedSender<InboundMessage>,
    handle: JoinHandle<()>,
}

/// Pulls inbound messages and hands each one to the worker owning its
/// session. Workers drain their queue in order, so one session never sees two
/// of its messages handled at once while different sessions proceed in
/// parallel.
pub struct Router {
    updates: Arc<dyn UpdateSource>,
    controller: Arc<DialogueController>,
    retry_delay: Duration,
    shutdown_grace: Duration,
}

impl Router {
    pub fn new(container: &Container) -> Self {
        Self::from_parts(container.update_source(), container.controller())
    }

    pub fn from_parts(updates: Arc<dyn UpdateSource>, controller: Arc<DialogueController>) -> Self {
        Self {
            updates,
            controller,
            retry_delay: DEFAULT_RETRY_DELAY,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Poll until `shutdown` fires, then close every session queue and wait
    /// for the workers to drain.
    pub async fn run(&self, shutdown: CancellationToken) -> Result<()> {
        let mut workers: HashMap<SessionKey, SessionWorker> = HashMap::new();
        info!("Polling for updates");

        loop {
            let batch = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                batch = self.updates.next_batch() => batch,
            };

            match batch {
                Ok(messages) => {
                    for message in messages {
                        self.dispatch(&mut workers, message);
                    }
                }
                Err(e) => {
                    warn!(
                        "Polling failed: {}. Retrying in {:?}",
                        e, self.retry_delay
                    );
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.retry_delay) => {}
                    }
                }
            }
        }

        info!("Shutting down {} session workers", workers.len());
        let handles: Vec<JoinHandle<()>> = workers
            .into_values()
            .map(|worker| {
                drop(worker.queue);
                worker.handle
            })
            .collect();
        for joined in join_all(handles).await {
            if let Err(e) = joined {
                error!("Session worker ended abnormally: {}", e);
            }
        }
        Ok(())
    }

    fn dispatch(&self, workers: &mut HashMap<SessionKey, SessionWorker>, message: InboundMessage) {
        let key = message.session;
        let message = match workers.get(&key) {
            Some(worker) => match worker.queue.send(message) {
                Ok(()) => return,
                Err(mpsc::error::SendError(message)) => {
                    warn!("Worker for session {} stopped; restarting it", key);
                    message
                }
            },
            None => message,
        };

        let worker = self.spawn_worker(key);
        if worker.queue.send(message).is_err() {
            error!("Dropping message for session {}: worker unavailable", key);
        }
        workers.insert(key, worker);
    }

    fn spawn_worker(&self, key: SessionKey) -> SessionWorker {
        debug!("Starting worker for session {}", key);
        let (queue, mut inbox) = mpsc::unbounded_channel::<InboundMessage>();
        let controller = Arc::clone(&self.controller);
        let grace = self.shutdown_grace;

        let handle = tokio::spawn(async move {
            let mut flows: Vec<JoinHandle<()>> = Vec::new();

            while let Some(message) = inbox.recv().await {
                flows.retain(|flow| !flow.is_finished());
                match controller.handle(message).await {
                    Ok(Some(flow)) => flows.push(flow),
                    Ok(None) => {}
                    Err(e) => error!("Failed to handle message for session {}: {}", key, e),
                }
            }

            for mut flow in flows {
                if tokio::time::timeout(grace, &mut flow).await.is_err() {
                    warn!("Abandoning image generation for session {} at shutdown", key);
                    flow.abort();
                }
            }
            debug!("Worker for session {} stopped", key);
        });

        SessionWorker { queue, handle }
    }
}
