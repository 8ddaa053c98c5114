use super::{FsmcRuntime, RuntimeError, RuntimeEvent};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::Any;
use tokio::sync::mpsc;

pub struct CliRuntime {
    event_tx: RwLock<mpsc::UnboundedSender<RuntimeEvent>>,
}

impl CliRuntime {
    pub fn new(event_tx: mpsc::UnboundedSender<RuntimeEvent>) -> Self {
        Self {
            event_tx: RwLock::new(event_tx),
        }
    }

    /// Replace the event sender (each compile round gets a fresh channel)
    pub fn replace_event_tx(&self, new_tx: mpsc::UnboundedSender<RuntimeEvent>) {
        *self.event_tx.write() = new_tx;
    }
}

#[async_trait]
impl FsmcRuntime for CliRuntime {
    fn emit(&self, event: RuntimeEvent) -> Result<(), RuntimeError> {
        self.event_tx
            .read()
            .send(event)
            .map_err(|_| RuntimeError::ReceiverClosed)?;
        Ok(())
    }

    fn is_interactive(&self) -> bool {
        atty::is(atty::Stream::Stdin)
    }

    async fn shutdown(&self) -> Result<(), RuntimeError> {
        // No cleanup needed - channel drop handles it
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
