use std::path::Path;

use crate::error::ScoutError;

/// Loads the newline-delimited keyword list, skipping blanks and `#` comments.
/// Lines are trimmed first, so an indented `#` line is still a comment.
pub fn load_keywords(path: &Path) -> Result<Vec<String>, ScoutError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ScoutError::KeywordsUnavailable(format!("keywords file not found at '{}'", path.display()))
        } else {
            ScoutError::KeywordsUnavailable(format!("cannot read '{}': {}", path.display(), e))
        }
    })?;

    let keywords = parse_keywords(&text);
    if keywords.is_empty() {
        return Err(ScoutError::KeywordsUnavailable(format!(
            "'{}' is empty or contains no valid keywords",
            path.display()
        )));
    }
    Ok(keywords)
}

fn parse_keywords(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_skips_comments_and_blanks() {
        let keywords = parse_keywords("# sales tools\nCRM\n\n   \n  lead generation  \n#ignored\n");
        assert_eq!(keywords, vec!["CRM", "lead generation"]);
    }

    #[test]
    fn test_indented_comment_is_skipped() {
        assert_eq!(parse_keywords("CRM\n  # indented note\n\t#tabbed\n"), vec!["CRM"]);
    }

    #[test]
    fn test_only_comments_is_unavailable() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# nothing here").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "   # indented comment").unwrap();

        let err = load_keywords(file.path()).unwrap_err();
        assert!(matches!(err, ScoutError::KeywordsUnavailable(_)));
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_keywords(&dir.path().join("keywords.txt")).unwrap_err();
        match err {
            ScoutError::KeywordsUnavailable(msg) => assert!(msg.contains("not found")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_loads_in_file_order() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "CRM\nhelpdesk software\nsales automation").unwrap();

        let keywords = load_keywords(file.path()).unwrap();
        assert_eq!(keywords, vec!["CRM", "helpdesk software", "sales automation"]);
    }
}
