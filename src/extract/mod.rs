//! Fenced code block extraction from model responses.

use std::sync::OnceLock;

use regex::Regex;

fn code_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```python\n(.*?)\n```").unwrap())
}

/// Interior of the first fenced Python block, whitespace preserved.
///
/// `None` means the response carried no code block. That is a valid outcome
/// the caller branches on, not an error.
pub fn first_code_block(response: &str) -> Option<String> {
    code_block_re()
        .captures(response)
        .map(|caps| caps[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_interior_verbatim() {
        let response = "Here you go:\n```python\nimport pandas as pd\n\ndf = pd.read_csv('./d.csv')\n```\n";
        assert_eq!(
            first_code_block(response).as_deref(),
            Some("import pandas as pd\n\ndf = pd.read_csv('./d.csv')")
        );
    }

    #[test]
    fn preserves_indentation_and_blank_lines() {
        let response = "```python\nif x:\n    y = 1\n\n    z = 2\n```";
        assert_eq!(
            first_code_block(response).as_deref(),
            Some("if x:\n    y = 1\n\n    z = 2")
        );
    }

    #[test]
    fn no_block_yields_none() {
        assert_eq!(first_code_block("no code here"), None);
        assert_eq!(first_code_block("```text\nnot python\n```"), None);
    }

    #[test]
    fn only_first_of_several_blocks_is_used() {
        let response = "```python\nfirst()\n```\nand then\n```python\nsecond()\n```";
        assert_eq!(first_code_block(response).as_deref(), Some("first()"));
    }
}
