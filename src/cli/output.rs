//! Terminal output helpers for `folio-update`.
//!
//! Colors are on by default and can be switched off (`--no-color` or
//! non-tty pipelines); the plain variants carry a bracketed level tag so
//! captured output stays greppable.

use owo_colors::OwoColorize;

/// Writer for user-facing status lines.
pub struct Output {
    /// Whether messages are styled with ANSI colors.
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Colored output.
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Plain output with level tags instead of colors.
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// A completed step.
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [ok] {}", message);
        }
    }

    /// A neutral progress line.
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [info] {}", message);
        }
    }

    /// A recoverable problem the run continued past.
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [warn] {}", message);
        }
    }

    /// A failure, written to stderr.
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [error] {}", message);
        }
    }

    /// A section title.
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  == {} ==", title);
        }
    }

    /// An indented `key: value` line under a header.
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// A bulleted line under a header.
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// A blank separator line.
    pub fn newline(&self) {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_new() {
        let output = Output::new();
        assert!(output.colored);
    }

    #[test]
    fn test_output_no_color() {
        let output = Output::no_color();
        assert!(!output.colored);
    }

    #[test]
    fn test_output_methods_no_panic() {
        // Smoke test over both styles
        for output in [Output::new(), Output::no_color()] {
            output.success("test success");
            output.info("test info");
            output.warning("test warning");
            output.error("test error");
            output.header("Test Header");
            output.kv("key", "value");
            output.list_item("item");
            output.newline();
        }
    }
}
