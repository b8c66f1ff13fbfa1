//! Output sinks for streamed tokens

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Receives generated text as it streams in
pub trait TokenSink: Send + Sync {
    /// Called for every non-empty text delta, in arrival order
    fn on_token(&self, token: &str) -> io::Result<()>;

    /// Called once when a generation has finished
    fn on_end(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Writes tokens to standard output as they arrive
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl TokenSink for StdoutSink {
    fn on_token(&self, token: &str) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(token.as_bytes())?;
        stdout.flush()
    }

    fn on_end(&self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(b"\n")?;
        stdout.flush()
    }
}

/// Collects tokens in memory
///
/// Clones share the same buffer, so a clone can be handed to a client and
/// the original inspected afterwards.
#[derive(Debug, Clone, Default)]
pub struct CaptureSink {
    inner: Arc<Mutex<Captured>>,
}

#[derive(Debug, Default)]
struct Captured {
    tokens: Vec<String>,
    ended: usize,
}

impl CaptureSink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Captured> {
        // Every write is a single push, so a poisoned buffer is still whole.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All tokens received so far, concatenated
    pub fn contents(&self) -> String {
        self.lock().tokens.concat()
    }

    /// Tokens received so far, one entry per delta
    pub fn tokens(&self) -> Vec<String> {
        self.lock().tokens.clone()
    }

    /// Number of finished generations
    pub fn end_count(&self) -> usize {
        self.lock().ended
    }
}

impl TokenSink for CaptureSink {
    fn on_token(&self, token: &str) -> io::Result<()> {
        self.lock().tokens.push(token.to_string());
        Ok(())
    }

    fn on_end(&self) -> io::Result<()> {
        self.lock().ended += 1;
        Ok(())
    }
}
