// src/prompt.rs
//! The "please fix it and retry" port between a session and whoever drives it.

use std::io::{
    BufRead,
    Write
};
use crate::error::RetryableError;

/// Operator's answer after a pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Continue,
    Abandon,
}

pub trait Operator {
    /// Called once for every retryable failure, before `await_continue`.
    fn report(&mut self, failure: &RetryableError);

    /// Block until the operator says to go on. May wait forever.
    fn await_continue(&mut self, hint: &str) -> Signal;
}

/// Line-oriented console operator: any line continues, `q`/`quit` or
/// end-of-input abandons.
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl ConsolePrompt<std::io::StdinLock<'static>, std::io::Stderr> {
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr())
    }
}

impl<R: BufRead, W: Write> Operator for ConsolePrompt<R, W> {
    fn report(&mut self, failure: &RetryableError) {
        // best effort; a broken stderr must not end the session
        let _ = writeln!(self.output, "{failure}");
    }

    fn await_continue(&mut self, hint: &str) -> Signal {
        let _ = writeln!(self.output, "{hint}");
        let _ = self.output.flush();

        let mut line = String::new();
        match self.input.read_line(&mut line) {
            Ok(0) => {
                log::warn!("Input closed, abandoning");
                Signal::Abandon
            }
            Ok(_) => match line.trim() {
                "q" | "Q" | "quit" => Signal::Abandon,
                _ => Signal::Continue,
            },
            Err(e) => {
                log::warn!("Failed to read from input: {e}");
                Signal::Abandon
            }
        }
    }
}
