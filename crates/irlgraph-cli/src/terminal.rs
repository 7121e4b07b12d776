//! Terminal styling and number formatting.

/// ANSI escape codes for text styling and colors.
pub mod colors {
    /// Reset all styling.
    pub const RESET: &str = "\x1b[0m";
    /// Bright bold white for section headings.
    pub const WHITE_BOLD: &str = "\x1b[1;97m";
    /// Gray for labels.
    pub const GRAY: &str = "\x1b[90m";
    /// Cyan for costs.
    pub const CYAN: &str = "\x1b[36m";
    /// Green for counts.
    pub const GREEN: &str = "\x1b[32m";
}

/// Colors used by the text renderers; all empty when color is disabled.
#[derive(Debug, Clone, Copy)]
pub struct ColorPalette {
    pub heading: &'static str,
    pub label: &'static str,
    pub cost: &'static str,
    pub count: &'static str,
    pub reset: &'static str,
}

impl ColorPalette {
    pub const fn colored() -> Self {
        Self {
            heading: colors::WHITE_BOLD,
            label: colors::GRAY,
            cost: colors::CYAN,
            count: colors::GREEN,
            reset: colors::RESET,
        }
    }

    pub const fn plain() -> Self {
        Self {
            heading: "",
            label: "",
            cost: "",
            count: "",
            reset: "",
        }
    }

    /// Pick a palette from the environment.
    pub fn detect() -> Self {
        if supports_color() {
            Self::colored()
        } else {
            Self::plain()
        }
    }
}

/// Check if the terminal supports ANSI colors.
///
/// Respects the `NO_COLOR` environment variable and `TERM=dumb`.
#[must_use]
pub fn supports_color() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if let Ok(term) = std::env::var("TERM") {
        if term.eq_ignore_ascii_case("dumb") {
            return false;
        }
    }
    true
}

/// Format a number with thousand separators (commas).
///
/// ```
/// # use irlgraph_cli::terminal::format_with_separators;
/// assert_eq!(format_with_separators(999), "999");
/// assert_eq!(format_with_separators(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_with_separators(n: u64) -> String {
    if n < 1000 {
        return n.to_string();
    }
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}
