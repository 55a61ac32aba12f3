/*!
format.rs

Terminal formatting helpers for the human-readable report.

  - StyleOptions::detect() honors NO_COLOR / NO_EMOJI
  - color(role, text, &style)
  - decorate(tag, text, &style): emoji prefix when enabled
  - pretty_json / truncate_chars / base64_preview

These return strings and never print; handlers decide where output goes.
*/

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/* -------------------------------------------------------------------------- */
/* Style Options                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy)]
pub struct StyleOptions {
    pub use_color: bool,
    pub use_emoji: bool,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self::detect()
    }
}

impl StyleOptions {
    pub fn detect() -> Self {
        StyleOptions {
            use_color: std::env::var_os("NO_COLOR").is_none(),
            use_emoji: std::env::var_os("NO_EMOJI").is_none(),
        }
    }

    /// No ANSI codes, no emoji. Used for captured output.
    #[cfg(test)]
    pub fn plain() -> Self {
        StyleOptions {
            use_color: false,
            use_emoji: false,
        }
    }
}

/* -------------------------------------------------------------------------- */
/* Color / Emoji                                                              */
/* -------------------------------------------------------------------------- */

#[derive(Debug, Clone, Copy)]
pub enum Role {
    Success,
    Warning,
    Error,
    Link,
    Bold,
}

pub fn color(role: Role, text: impl AsRef<str>, style: &StyleOptions) -> String {
    if !style.use_color {
        return text.as_ref().to_string();
    }
    let code = match role {
        Role::Success => "92",
        Role::Warning => "93",
        Role::Error => "91",
        Role::Link => "94",
        Role::Bold => "1",
    };
    format!("\x1b[{code}m{}\x1b[0m", text.as_ref())
}

pub fn emoji(tag: &str, style: &StyleOptions) -> &'static str {
    if !style.use_emoji {
        return "";
    }
    match tag {
        "rocket" => "🚀",
        "success" => "✅",
        "error" => "❌",
        "warn" => "⚠️ ",
        "link" => "🔗",
        "prompt" => "⎆",
        "tool" => "🔧",
        _ => "",
    }
}

/// Prefix `text` with the emoji for `tag`, or return it unchanged when emoji are off.
pub fn decorate(tag: &str, text: impl AsRef<str>, style: &StyleOptions) -> String {
    match emoji(tag, style) {
        "" => text.as_ref().to_string(),
        e => format!("{e} {}", text.as_ref()),
    }
}

/* -------------------------------------------------------------------------- */
/* Text Helpers                                                                */
/* -------------------------------------------------------------------------- */

pub fn pretty_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// First `max_chars` characters of `s`, and whether anything was cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> (&str, bool) {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => (&s[..idx], true),
        None => (s, false),
    }
}

/// Base64 of `bytes`, cut to at most `max_chars` encoded characters.
pub fn base64_preview(bytes: &[u8], max_chars: usize) -> String {
    let mut encoded = STANDARD.encode(bytes);
    encoded.truncate(max_chars);
    encoded
}

/* -------------------------------------------------------------------------- */
/* Tests                                                                       */
/* -------------------------------------------------------------------------- */
