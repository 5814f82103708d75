//! In-memory doubles for the sink and log capabilities.

use std::{io, sync::Mutex};

use crate::{chat_log::ChatLog, connection::MessageSink};

#[derive(Default)]
pub struct RecordingSink {
    received: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn received(&self) -> Vec<String> {
        self.received.lock().unwrap().clone()
    }
}

impl MessageSink for RecordingSink {
    async fn send(&self, message: &str) -> io::Result<()> {
        if self.failing {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink is broken"));
        }
        self.received.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingLog {
    entries: Mutex<Vec<String>>,
    failing: bool,
}

impl RecordingLog {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }
}

impl ChatLog for RecordingLog {
    async fn log(&self, message: &str) -> io::Result<()> {
        if self.failing {
            return Err(io::Error::other("disk full"));
        }
        self.entries.lock().unwrap().push(message.to_string());
        Ok(())
    }

    async fn close(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Splits `(3:04PM) payload` into its stamp and payload, asserting the stamp
/// looks like a kitchen clock reading.
pub fn split_timestamp(line: &str) -> (&str, &str) {
    let (stamp, payload) = line
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(") "))
        .unwrap_or_else(|| panic!("missing timestamp prefix: {line:?}"));
    assert!(
        stamp.ends_with("AM") || stamp.ends_with("PM"),
        "unexpected timestamp {stamp:?}"
    );
    (stamp, payload)
}
