//! Suggested registrations for undefined steps.

use regex::Regex;
use std::sync::OnceLock;

fn placeholders() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""[^"]*"|\d+"#).expect("placeholder pattern is valid"))
}

/// Pattern matching `text`: quoted strings become `"([^"]*)"`, integers
/// become `(\d+)`, everything else is escaped literally.
pub fn pattern_for(text: &str) -> String {
    let mut pattern = String::from("^");
    let mut last = 0;
    for m in placeholders().find_iter(text) {
        pattern.push_str(&regex::escape(&text[last..m.start()]));
        if m.as_str().starts_with('"') {
            pattern.push_str(r#""([^"]*)""#);
        } else {
            pattern.push_str(r"(\d+)");
        }
        last = m.end();
    }
    pattern.push_str(&regex::escape(&text[last..]));
    pattern.push('$');
    pattern
}

/// Raw string literal for `body`, with one more `#` than any `"#...` run
/// inside it.
fn raw_literal(body: &str) -> String {
    let mut hashes = "#".to_string();
    while body.contains(&format!("\"{hashes}")) {
        hashes.push('#');
    }
    format!("r{hashes}\"{body}\"{hashes}")
}

/// Rust snippet registering a pending handler for `text`.
pub fn snippet(text: &str) -> String {
    format!(
        "registry.register({}, |_args| steprun_core::pending())?;",
        raw_literal(&pattern_for(text))
    )
}

/// Snippet block printed after the summary, empty when nothing is undefined.
pub fn snippet_block(undefined: &[String]) -> String {
    if undefined.is_empty() {
        return String::new();
    }
    let mut out =
        String::from("\nYou can implement step definitions for undefined steps with these snippets:\n\n");
    for text in undefined {
        out.push_str(&snippet(text));
        out.push('\n');
    }
    out
}
