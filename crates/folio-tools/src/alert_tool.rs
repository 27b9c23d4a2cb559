use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use tokio::sync::mpsc;

use crate::{ToolArguments, ToolImplementation};
use folio_common::tools::{Parameters, Property, Tool};

/// Delivers a message to whoever is looking at the page.
pub trait Notifier: Send + Sync {
    /// # Errors
    ///
    /// Returns an error if the message could not be delivered.
    fn notify(&self, message: &str) -> Result<()>;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) -> Result<()> {
        info!("Alert: {message}");
        Ok(())
    }
}

/// Forwards notifications to a channel, typically drained by a UI task.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<String>,
}

impl ChannelNotifier {
    #[must_use]
    pub const fn new(sender: mpsc::UnboundedSender<String>) -> Self {
        Self { sender }
    }

    /// Creates a notifier together with the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<String>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, message: &str) -> Result<()> {
        self.sender
            .send(message.to_string())
            .map_err(|_| anyhow::anyhow!("Notification receiver has been dropped"))
    }
}

pub struct AlertMessageTool {
    notifier: Arc<dyn Notifier>,
}

impl AlertMessageTool {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }
}

#[async_trait]
impl ToolImplementation for AlertMessageTool {
    fn get_definition(&self) -> Tool {
        Tool::function(
            "alert_message",
            "Shows a message to the visitor in a pop-up notification.",
            Parameters::from_properties([(
                "message",
                Property::string("The message to show."),
                true,
            )]),
        )
    }

    async fn execute(&self, args: &ToolArguments) -> Result<String> {
        self.notifier.notify(args.str("message")?)?;
        Ok("Done.".to_string())
    }
}
