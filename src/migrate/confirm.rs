//! Operator confirmation of mutating steps (`--confirm`).

use std::io::{self, BufRead, Write};

use tracing::warn;

pub trait Confirm {
    /// Ask whether `action` should go ahead. `false` skips the step.
    fn confirm(&mut self, action: &str) -> bool;
}

/// Approves every step.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoConfirm;

impl Confirm for AutoConfirm {
    fn confirm(&mut self, _action: &str) -> bool {
        true
    }
}

/// Asks a y/N question per step. Empty input, EOF and read errors decline.
pub struct PromptConfirm<R, W> {
    input: R,
    output: W,
}

impl PromptConfirm<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptConfirm<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, action: &str) -> io::Result<bool> {
        let mut line = String::new();
        loop {
            line.clear();
            write!(self.output, "{action}? (y/N): ")?;
            self.output.flush()?;

            if self.input.read_line(&mut line)? == 0 {
                return Ok(false);
            }
            match line.trim().to_uppercase().as_str() {
                "Y" | "YES" => return Ok(true),
                "N" | "NO" | "" => return Ok(false),
                _ => continue,
            }
        }
    }
}

impl<R: BufRead, W: Write> Confirm for PromptConfirm<R, W> {
    fn confirm(&mut self, action: &str) -> bool {
        match self.ask(action) {
            Ok(answer) => answer,
            Err(e) => {
                warn!(error = %e, "Could not read confirmation; declining");
                false
            }
        }
    }
}
