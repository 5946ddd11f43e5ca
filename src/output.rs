//! User-facing console lines. Colour is used only when the stream is a TTY.

use owo_colors::OwoColorize;

use crate::model::{DeviceOutcome, FinalState};

#[derive(Clone, Copy)]
enum Tone {
    Info,
    Warn,
    Error,
    Ok,
}

impl Tone {
    fn label(self) -> &'static str {
        match self {
            Tone::Info => "info:",
            Tone::Warn => "warn:",
            Tone::Error => "error:",
            Tone::Ok => "ok:",
        }
    }

    /// Warnings and errors go to stderr so stdout stays scriptable.
    fn to_stderr(self) -> bool {
        matches!(self, Tone::Warn | Tone::Error)
    }
}

fn emit(tone: Tone, msg: &str) {
    let stream = if tone.to_stderr() {
        atty::Stream::Stderr
    } else {
        atty::Stream::Stdout
    };
    let label = tone.label();
    let line = if atty::is(stream) {
        let styled = match tone {
            Tone::Info => label.cyan().bold().to_string(),
            Tone::Warn => label.yellow().bold().to_string(),
            Tone::Error => label.red().bold().to_string(),
            Tone::Ok => label.green().bold().to_string(),
        };
        format!("{styled} {msg}")
    } else {
        format!("{label} {msg}")
    };
    if tone.to_stderr() {
        eprintln!("{line}");
    } else {
        println!("{line}");
    }
}

pub fn print_info(msg: &str) {
    emit(Tone::Info, msg);
}

pub fn print_warn(msg: &str) {
    emit(Tone::Warn, msg);
}

pub fn print_error(msg: &str) {
    emit(Tone::Error, msg);
}

pub fn print_success(msg: &str) {
    emit(Tone::Ok, msg);
}

/// `name: state` or `name: state (detail)`, without colour.
pub fn outcome_line(outcome: &DeviceOutcome) -> String {
    match &outcome.error_detail {
        Some(detail) => format!("{}: {} ({})", outcome.device_name, outcome.final_state, detail),
        None => format!("{}: {}", outcome.device_name, outcome.final_state),
    }
}

/// One line per device on stdout; only the state word is coloured.
pub fn print_outcome(outcome: &DeviceOutcome) {
    if !atty::is(atty::Stream::Stdout) {
        println!("{}", outcome_line(outcome));
        return;
    }
    let state = outcome.final_state.to_string();
    let state = match outcome.final_state {
        FinalState::Copied | FinalState::Created => state.green().to_string(),
        FinalState::Dropped | FinalState::Skipped => state.yellow().to_string(),
        FinalState::Failed => state.red().bold().to_string(),
    };
    match &outcome.error_detail {
        Some(detail) => println!("{}: {} ({})", outcome.device_name, state, detail),
        None => println!("{}: {}", outcome.device_name, state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceState;

    fn outcome(state: FinalState, detail: Option<&str>) -> DeviceOutcome {
        DeviceOutcome {
            device_name: "backup01".into(),
            final_state: state,
            error_detail: detail.map(str::to_string),
            trace: vec![DeviceState::Discovered],
        }
    }

    #[test]
    fn outcome_line_without_detail() {
        assert_eq!(outcome_line(&outcome(FinalState::Copied, None)), "backup01: copied");
    }

    #[test]
    fn outcome_line_with_detail() {
        assert_eq!(
            outcome_line(&outcome(FinalState::Failed, Some("access denied"))),
            "backup01: failed (access denied)"
        );
    }
}
