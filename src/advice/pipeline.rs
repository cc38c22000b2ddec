//! Advice pipeline for running service requests off the controller thread
//!
//! Provides a channel-based interface: the controller hands requests to an
//! `AdviceHandle`, a worker thread with its own tokio runtime performs the
//! HTTP call, and the outcome comes back through the controller's `Notifier`.

use super::client::HttpAdviceClient;
use super::{AdviceConfig, AdviceRequest, AdviceService};
use crate::conversation::{Notifier, RequestTicket};
use crate::{MedchatError, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tokio::runtime::Runtime;
use tracing::{debug, error, info};

/// Commands that can be sent to the advice pipeline
#[derive(Debug, Clone)]
pub enum AdviceCommand {
    /// Ask the service about one turn
    Ask {
        ticket: RequestTicket,
        request: AdviceRequest,
    },

    /// Shutdown the pipeline
    Shutdown,
}

/// Controller-side end of the pipeline
#[derive(Clone, Debug)]
pub struct AdviceHandle {
    command_tx: Sender<AdviceCommand>,
}

impl AdviceHandle {
    /// Ask the worker to exit after the current request
    pub fn shutdown(&self) -> Result<()> {
        self.command_tx
            .send(AdviceCommand::Shutdown)
            .map_err(|e| MedchatError::ChannelError(format!("Failed to send shutdown: {}", e)))
    }
}

impl AdviceService for AdviceHandle {
    fn request(&mut self, ticket: RequestTicket, request: AdviceRequest) -> Result<()> {
        self.command_tx
            .send(AdviceCommand::Ask { ticket, request })
            .map_err(|e| MedchatError::ChannelError(format!("Advice worker is gone: {}", e)))
    }
}

/// Advice pipeline with a dedicated worker thread
pub struct AdvicePipeline {
    config: AdviceConfig,
    notifier: Notifier,
    command_tx: Sender<AdviceCommand>,
    command_rx: Receiver<AdviceCommand>,
}

impl AdvicePipeline {
    /// Create a new pipeline reporting outcomes to `notifier`
    pub fn new(config: AdviceConfig, notifier: Notifier) -> Self {
        let (command_tx, command_rx) = bounded(16);

        Self {
            config,
            notifier,
            command_tx,
            command_rx,
        }
    }

    /// Get a handle for issuing requests
    pub fn handle(&self) -> AdviceHandle {
        AdviceHandle {
            command_tx: self.command_tx.clone(),
        }
    }

    /// Start the worker thread
    ///
    /// The client is built before spawning so configuration errors surface here.
    pub fn start_worker(self) -> Result<JoinHandle<()>> {
        let client = HttpAdviceClient::new(&self.config)?;
        let command_rx = self.command_rx;
        let notifier = self.notifier;

        let handle = thread::spawn(move || {
            info!("Advice pipeline worker starting ({})", client.url());

            let runtime = match Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    error!("Failed to create tokio runtime: {}", e);
                    // Fail every queued request so the controller frees its ticket
                    while let Ok(AdviceCommand::Ask { ticket, .. }) = command_rx.recv() {
                        notifier.advice(
                            ticket,
                            Err(MedchatError::AdviceError(format!(
                                "Runtime creation failed: {}",
                                e
                            ))),
                        );
                    }
                    return;
                }
            };

            loop {
                match command_rx.recv() {
                    Ok(AdviceCommand::Ask { ticket, request }) => {
                        debug!("Processing advice request {:?}", ticket);
                        let result = runtime.block_on(client.ask(&request));
                        if let Err(e) = &result {
                            error!("Advice request failed: {}", e);
                        }
                        notifier.advice(ticket, result);
                    }

                    Ok(AdviceCommand::Shutdown) => {
                        info!("Advice pipeline worker shutting down");
                        break;
                    }

                    Err(e) => {
                        debug!("Advice command channel closed: {}", e);
                        break;
                    }
                }
            }

            info!("Advice pipeline worker stopped");
        });

        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::TurnEvent;
    use crate::language::Language;
    use crate::messages::Message;
    use std::time::Duration;

    #[test]
    fn test_handle_reports_closed_worker() {
        let (notifier, _rx) = Notifier::channel();
        let pipeline = AdvicePipeline::new(AdviceConfig::default(), notifier);
        let mut handle = pipeline.handle();
        drop(pipeline);

        let request = AdviceRequest::new("cough", Language::En, &[Message::user("cough")]);
        let err = handle.request(RequestTicket::new(), request).unwrap_err();
        assert!(matches!(err, MedchatError::ChannelError(_)));
    }

    #[test]
    fn test_unreachable_service_reports_failure() {
        let (notifier, rx) = Notifier::channel();
        // Port 9 (discard) on localhost is expected to refuse connections
        let pipeline = AdvicePipeline::new(AdviceConfig::new("http://127.0.0.1:9"), notifier);
        let mut handle = pipeline.handle();
        let worker = pipeline.start_worker().unwrap();

        let ticket = RequestTicket::new();
        let request = AdviceRequest::new("cough", Language::En, &[Message::user("cough")]);
        handle.request(ticket, request).unwrap();

        match rx.recv_timeout(Duration::from_secs(10)).unwrap() {
            TurnEvent::Advice { ticket: got, result } => {
                assert_eq!(got, ticket);
                assert!(result.is_err());
            }
            other => panic!("Unexpected event: {:?}", other),
        }

        handle.shutdown().unwrap();
        worker.join().unwrap();
    }
}
