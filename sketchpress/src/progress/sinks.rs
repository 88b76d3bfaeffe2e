//! Stock progress sinks

use std::sync::Mutex;

use colored::Colorize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::progress::{DeployStep, ProgressEvent, ProgressSink};

/// Forwards progress to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn on_progress(&self, event: &ProgressEvent) {
        match &event.error {
            Some(error) => warn!(step = ?event.step, "Deployment failed: {}", error),
            None => info!(step = ?event.step, "{}", event.message),
        }
    }
}

/// Prints progress lines for the CLI
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSink;

impl ProgressSink for TerminalSink {
    fn on_progress(&self, event: &ProgressEvent) {
        if let Some(error) = &event.error {
            eprintln!("{} {}", "✗".red().bold(), error.red());
        } else if event.step == DeployStep::Complete {
            println!("{} {}", "✓".green().bold(), event.message.green());
        } else {
            println!("{} {}", "→".cyan(), event.message);
        }
    }
}

/// Pushes events onto an unbounded channel, for UIs on another task
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn on_progress(&self, event: &ProgressEvent) {
        // A dropped receiver means nobody is watching any more
        let _ = self.tx.send(event.clone());
    }
}

/// Keeps every event in memory
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn steps(&self) -> Vec<DeployStep> {
        self.events().iter().map(|e| e.step).collect()
    }

    pub fn last(&self) -> Option<ProgressEvent> {
        self.events().last().cloned()
    }
}

impl ProgressSink for RecordingSink {
    fn on_progress(&self, event: &ProgressEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}

/// Fans one event out to several sinks
pub struct FanoutSink<'a> {
    sinks: Vec<&'a dyn ProgressSink>,
}

impl<'a> FanoutSink<'a> {
    pub fn new(sinks: Vec<&'a dyn ProgressSink>) -> Self {
        Self { sinks }
    }
}

impl ProgressSink for FanoutSink<'_> {
    fn on_progress(&self, event: &ProgressEvent) {
        for sink in &self.sinks {
            sink.on_progress(event);
        }
    }
}
