//! Structured JSON logger
//!
//! One log line = one event. `event` and `severity` lead, remaining fields
//! follow sorted by key. Output is synchronous and unbuffered so nothing is
//! lost when the process exits.

use std::fmt;
use std::io::{self, Write};

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations
    Info,
    /// Recoverable issues (failed logins, denied requests)
    Warn,
    /// Operation failures
    Error,
    /// Unrecoverable, process exits
    Fatal,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured logger writing one JSON object per line.
pub struct Logger;

impl Logger {
    /// Logs an event to stdout.
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        Self::write_line(severity, event, fields, &mut io::stdout());
    }

    /// Logs an event to stderr.
    pub fn log_stderr(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        Self::write_line(severity, event, fields, &mut io::stderr());
    }

    fn write_line<W: Write>(severity: Severity, event: &str, fields: &[(&str, &str)], out: &mut W) {
        let mut line = String::with_capacity(128);

        line.push_str("{\"event\":\"");
        escape_into(&mut line, event);
        line.push_str("\",\"severity\":\"");
        line.push_str(severity.as_str());
        line.push('"');

        let mut sorted: Vec<_> = fields.iter().collect();
        sorted.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted {
            line.push_str(",\"");
            escape_into(&mut line, key);
            line.push_str("\":\"");
            escape_into(&mut line, value);
            line.push('"');
        }

        line.push_str("}\n");

        // One write, one flush; interleaving between threads stays per-line.
        let _ = out.write_all(line.as_bytes());
        let _ = out.flush();
    }
}

fn escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut buf = Vec::new();
        Logger::write_line(severity, event, fields, &mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_event_and_severity_lead() {
        let line = render(Severity::Info, "store.started", &[]);
        assert_eq!(
            line,
            "{\"event\":\"store.started\",\"severity\":\"INFO\"}\n"
        );
    }

    #[test]
    fn test_fields_sorted_by_key() {
        let line = render(
            Severity::Warn,
            "e",
            &[("zulu", "1"), ("alpha", "2"), ("mike", "3")],
        );
        let alpha = line.find("alpha").unwrap();
        let mike = line.find("mike").unwrap();
        let zulu = line.find("zulu").unwrap();
        assert!(alpha < mike && mike < zulu);
    }

    #[test]
    fn test_output_is_valid_json() {
        let line = render(
            Severity::Error,
            "weird \"event\"",
            &[("path", "a\\b"), ("note", "line1\nline2")],
        );
        let parsed: serde_json::Value = serde_json::from_str(line.trim()).unwrap();
        assert_eq!(parsed["event"], "weird \"event\"");
        assert_eq!(parsed["note"], "line1\nline2");
    }
}
