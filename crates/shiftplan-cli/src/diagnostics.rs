//! Diagnostic formatting for CLI output
//!
//! - `TerminalEmitter`: rustc-style lines on stderr
//! - `JsonEmitter`: collected for the `--format json` document
//!
//! ## Exit Code Semantics
//!
//! | Exit Code | Meaning |
//! |-----------|---------|
//! | 0 | Success: no errors (warnings/info allowed) |
//! | 1 | Failure: one or more errors emitted |
//!
//! `--strict` escalates warnings to errors, so a schedule with under-filled
//! cells or a heuristic fallback exits 1. `--quiet` only hides output.

use std::io::Write;
use std::process;

use serde::Serialize;
use shiftplan_core::{CategoryId, Diagnostic, DiagnosticEmitter, Severity};

// ============================================================================
// Exit Code
// ============================================================================

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    Failure = 1,
}

impl ExitCode {
    pub fn from_error_count(count: usize) -> Self {
        if count > 0 {
            ExitCode::Failure
        } else {
            ExitCode::Success
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl From<ExitCode> for process::ExitCode {
    fn from(code: ExitCode) -> Self {
        process::ExitCode::from(code as u8)
    }
}

// ============================================================================
// Diagnostic Config
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct DiagnosticConfig {
    /// Warnings become errors
    pub strict: bool,
    /// Suppress all output except errors
    pub quiet: bool,
}

impl DiagnosticConfig {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Default::default()
        }
    }

    pub fn quiet() -> Self {
        Self {
            quiet: true,
            ..Default::default()
        }
    }

    pub fn effective_severity(&self, severity: Severity) -> Severity {
        match severity {
            Severity::Warning if self.strict => Severity::Error,
            s => s,
        }
    }

    pub fn should_show(&self, severity: Severity) -> bool {
        !self.quiet || self.effective_severity(severity) == Severity::Error
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Writes `severity[CODE]: message` blocks
pub struct TerminalEmitter<W: Write> {
    writer: W,
    config: DiagnosticConfig,
    error_count: usize,
    warning_count: usize,
}

impl<W: Write> TerminalEmitter<W> {
    pub fn new(writer: W, config: DiagnosticConfig) -> Self {
        Self {
            writer,
            config,
            error_count: 0,
            warning_count: 0,
        }
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count)
    }

    fn write_diagnostic(&mut self, diagnostic: &Diagnostic) -> std::io::Result<()> {
        let severity = self.config.effective_severity(diagnostic.severity);
        match severity {
            Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
            Severity::Info => {}
        }
        if !self.config.should_show(diagnostic.severity) {
            return Ok(());
        }

        writeln!(
            self.writer,
            "{}[{}]: {}",
            severity.as_str(),
            diagnostic.code.as_str(),
            diagnostic.message
        )?;
        if let Some(tier) = diagnostic.tier {
            writeln!(self.writer, "   = tier {}", tier)?;
        }
        writeln!(self.writer)
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: Diagnostic) {
        // stderr may be closed
        let _ = self.write_diagnostic(&diagnostic);
    }
}

// ============================================================================
// JSON
// ============================================================================

#[derive(Debug, Serialize)]
pub struct JsonDiagnostic {
    pub code: String,
    pub severity: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<CategoryId>,
}

/// Collects diagnostics for machine-readable output
pub struct JsonEmitter {
    diagnostics: Vec<JsonDiagnostic>,
    config: DiagnosticConfig,
    error_count: usize,
}

impl JsonEmitter {
    pub fn new(config: DiagnosticConfig) -> Self {
        Self {
            diagnostics: Vec::new(),
            config,
            error_count: 0,
        }
    }

    pub fn diagnostics(&self) -> &[JsonDiagnostic] {
        &self.diagnostics
    }

    pub fn exit_code(&self) -> ExitCode {
        ExitCode::from_error_count(self.error_count)
    }

    pub fn to_json_value(&self) -> serde_json::Value {
        serde_json::to_value(&self.diagnostics).unwrap_or(serde_json::Value::Null)
    }
}

impl DiagnosticEmitter for JsonEmitter {
    fn emit(&mut self, diagnostic: Diagnostic) {
        let severity = self.config.effective_severity(diagnostic.severity);
        if severity == Severity::Error {
            self.error_count += 1;
        }
        if !self.config.should_show(diagnostic.severity) {
            return;
        }
        self.diagnostics.push(JsonDiagnostic {
            code: diagnostic.code.as_str().to_string(),
            severity: severity.as_str().to_string(),
            message: diagnostic.message,
            tier: diagnostic.tier,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiftplan_core::DiagnosticCode;

    fn underfilled() -> Diagnostic {
        Diagnostic::warning(
            DiagnosticCode::W003UnderfilledCell,
            3,
            "2025-01-06 work center 1 slot 3: staffed 0 of 1",
        )
    }

    fn optimal() -> Diagnostic {
        Diagnostic::info(DiagnosticCode::I001TierOptimal, 1, "tier 1 solved to optimality")
    }

    #[test]
    fn terminal_output_has_code_and_tier() {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, DiagnosticConfig::default());
        emitter.emit(underfilled());
        assert_eq!(emitter.warning_count(), 1);
        assert_eq!(emitter.exit_code(), ExitCode::Success);
        drop(emitter);

        let text = String::from_utf8(output).unwrap();
        assert!(text.starts_with("warning[W003]: 2025-01-06 work center 1"));
        assert!(text.contains("= tier 3"));
    }

    #[test]
    fn strict_mode_escalates_warnings() {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, DiagnosticConfig::strict());
        emitter.emit(underfilled());
        emitter.emit(optimal());
        assert_eq!(emitter.error_count(), 1);
        assert_eq!(emitter.exit_code(), ExitCode::Failure);
        drop(emitter);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("error[W003]"));
        assert!(text.contains("info[I001]"));
    }

    #[test]
    fn quiet_mode_hides_output_not_exit_code() {
        let mut output = Vec::new();
        let config = DiagnosticConfig {
            strict: true,
            quiet: true,
        };
        let mut emitter = TerminalEmitter::new(&mut output, config);
        emitter.emit(optimal());
        emitter.emit(underfilled());
        assert_eq!(emitter.exit_code(), ExitCode::Failure);
        drop(emitter);

        let text = String::from_utf8(output).unwrap();
        assert!(!text.contains("I001"));
        assert!(text.contains("error[W003]"));
    }

    #[test]
    fn quiet_without_strict_prints_nothing() {
        let mut output = Vec::new();
        let mut emitter = TerminalEmitter::new(&mut output, DiagnosticConfig::quiet());
        emitter.emit(underfilled());
        drop(emitter);
        assert!(output.is_empty());
    }

    #[test]
    fn json_emitter_collects_entries() {
        let mut emitter = JsonEmitter::new(DiagnosticConfig::default());
        emitter.emit(underfilled());
        emitter.emit(optimal());

        let json = emitter.to_json_value();
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["code"], "W003");
        assert_eq!(entries[0]["severity"], "warning");
        assert_eq!(entries[0]["tier"], 3);
        assert_eq!(emitter.exit_code(), ExitCode::Success);
    }

    #[test]
    fn json_strict_info_stays_info() {
        let mut emitter = JsonEmitter::new(DiagnosticConfig::strict());
        emitter.emit(optimal());
        assert_eq!(emitter.diagnostics()[0].severity, "info");
        assert!(emitter.exit_code().is_success());

        emitter.emit(underfilled());
        assert_eq!(emitter.diagnostics()[1].severity, "error");
        assert_eq!(emitter.exit_code().code(), 1);
    }
}
