//! Cleanup of generated minutes before display.
//!
//! The minutes generator is a language model and sometimes wraps its whole
//! answer in a ```` ```markdown ```` fence. Rendered as-is, the document turns
//! into a single code block, so the fence is removed before pagination.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all cleanup rules to a minutes document.
///
/// Rules (applied in order):
/// 1. Normalise line endings (CRLF → LF)
/// 2. Strip an outer code fence
pub fn clean_minutes(input: &str) -> String {
    let s = normalise_line_endings(input);
    strip_code_fences(&s)
}

// ── Rule 1: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 2: Strip outer code fences ──────────────────────────────────────────

static RE_OPENING_FENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^```(?:markdown)?").expect("opening fence pattern is valid")
});

/// Trim; drop a leading ```` ```markdown ```` (or bare ```` ``` ````) and a
/// trailing ```` ``` ````; trim again.
///
/// Either fence may be missing: generators occasionally stop before the
/// closing one.
pub fn strip_code_fences(input: &str) -> String {
    let mut cleaned = input.trim();
    if let Some(m) = RE_OPENING_FENCE.find(cleaned) {
        cleaned = cleaned[m.end()..].trim();
    }
    if let Some(stripped) = cleaned.strip_suffix("```") {
        cleaned = stripped.trim();
    }
    cleaned.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_markdown_fence() {
        let input = "```markdown\n# Minutes\n\n- item\n```";
        assert_eq!(strip_code_fences(input), "# Minutes\n\n- item");
    }

    #[test]
    fn test_strip_bare_fence() {
        let input = "  ```\n# Minutes\n```  \n";
        assert_eq!(strip_code_fences(input), "# Minutes");
    }

    #[test]
    fn test_missing_closing_fence() {
        assert_eq!(strip_code_fences("```markdown\n# Minutes"), "# Minutes");
    }

    #[test]
    fn test_no_fences_passthrough() {
        assert_eq!(strip_code_fences("# Minutes\ntext"), "# Minutes\ntext");
    }

    #[test]
    fn test_inner_code_block_kept() {
        let input = "# Log\n\n```\nerror 42\n```\n\nDone.";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_clean_minutes_normalises_crlf() {
        let input = "```markdown\r\n# Title\r\nbody\r\n```";
        assert_eq!(clean_minutes(input), "# Title\nbody");
    }
}
