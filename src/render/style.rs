// src/render/style.rs

/// Semantic styles used by the console layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Section headers such as `Usage:` and `Flags:`.
    Header,
    /// The command path in the title line.
    Title,
    /// Labels such as `Description:`.
    Label,
    /// Deprecation markers.
    Dim,
}

const RESET: &str = "\x1b[0m";

/// Converts a `Style` into its raw ANSI escape code.
pub fn style_to_code(style: Style) -> &'static str {
    match style {
        Style::Header => "\x1b[33m", // Yellow
        Style::Title => "\x1b[34m",  // Blue
        Style::Label => "\x1b[32m",  // Green
        Style::Dim => "\x1b[2m",
    }
}

/// Wraps `text` in the style's escape codes when `colored` is set.
pub fn paint(text: &str, style: Style, colored: bool) -> String {
    if colored {
        format!("{}{}{}", style_to_code(style), text, RESET)
    } else {
        text.to_string()
    }
}
