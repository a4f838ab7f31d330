// ============================================================
// Layer 4 — Text Preprocessor
// ============================================================
// Opt-in cleanup of record text, enabled per dataset with
// `clean_whitespace: true`.
//
// Scraped reviews and comments carry invisible noise that makes
// two identical sentences look different to deduplication:
//   - Non-breaking spaces (U+00A0) and zero-width spaces (U+200B)
//   - Byte order marks (U+FEFF) glued to the first word
//   - Carriage returns from Windows line endings
//   - Tabs and other control characters
//   - Runs of spaces, blank lines
//
// Cleaning steps (applied in order):
//   1. Map odd whitespace/control characters to a plain space,
//      and \r to \n
//   2. Collapse runs of spaces and trim each line
//   3. Drop lines that end up empty
//
// Reference: Rust Book §8 (Strings in Rust)

pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// Clean one text field. Returns an owned String.
    pub fn clean(&self, text: &str) -> String {
        // ── Step 1: Normalise individual characters ──────────────────────────
        let step1: String = text
            .chars()
            .map(|c| match c {
                '\r' => '\n',
                '\t' | '\u{00A0}' | '\u{200B}' | '\u{FEFF}' => ' ',
                c if c.is_control() && c != '\n' => ' ',
                c => c,
            })
            .collect();

        // ── Step 2 + 3: Collapse spaces per line, drop empty lines ───────────
        step1
            .lines()
            .map(collapse_spaces)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

fn collapse_spaces(line: &str) -> String {
    let mut out        = String::with_capacity(line.len());
    let mut last_space = false;

    for c in line.trim().chars() {
        if c == ' ' {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
        } else {
            out.push(c);
            last_space = false;
        }
    }

    out
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collapses_multiple_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("produto   muito  bom"), "produto muito bom");
    }

    #[test]
    fn test_invisible_characters_become_spaces() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("\u{FEFF}ótimo\u{00A0}produto\u{200B}!"), "ótimo produto !");
        assert_eq!(p.clean("a\x01b"), "a b");
    }

    #[test]
    fn test_blank_lines_removed() {
        let p = Preprocessor::new();
        assert_eq!(p.clean("linha 1\r\n\r\n   \nlinha 2  "), "linha 1\nlinha 2");
    }

    #[test]
    fn test_whitespace_only_becomes_empty() {
        let p = Preprocessor::new();
        assert_eq!(p.clean(" \t\u{00A0} "), "");
    }
}
