use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Short diff statistics, when the source can provide them.
    pub diff_summary: Option<String>,
    pub branch: String,
}

impl Commit {
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(7)
            .map(|(idx, _)| idx)
            .unwrap_or(self.hash.len());
        &self.hash[..end]
    }

    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or_default().trim()
    }

    pub fn body(&self) -> Option<&str> {
        let (_, rest) = self.message.split_once('\n')?;
        let rest = rest.trim();
        if rest.is_empty() { None } else { Some(rest) }
    }

    /// Matches either the author's name exactly or the email case-insensitively.
    pub fn authored_by(&self, author: &str) -> bool {
        let author = author.trim();
        self.author_name == author || self.author_email.eq_ignore_ascii_case(author)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{TimeZone, Utc};

    use super::Commit;

    pub fn commit(hash: &str, author: &str, branch: &str, secs: i64) -> Commit {
        Commit {
            hash: hash.to_string(),
            author_name: author.to_string(),
            author_email: format!("{}@example.com", author.to_lowercase()),
            timestamp: Utc.timestamp_opt(secs, 0).unwrap(),
            message: format!("Commit {hash}"),
            diff_summary: None,
            branch: branch.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::commit;

    #[test]
    fn splits_subject_and_body() {
        let mut c = commit("abcdef1234567890", "Ada", "main", 0);
        c.message = "Add parser\n\nHandles nested groups.\n".to_string();
        assert_eq!(c.subject(), "Add parser");
        assert_eq!(c.body(), Some("Handles nested groups."));
        assert_eq!(c.short_hash(), "abcdef1");
    }

    #[test]
    fn single_line_message_has_no_body() {
        let c = commit("abc", "Ada", "main", 0);
        assert_eq!(c.body(), None);
        assert_eq!(c.short_hash(), "abc");
    }

    #[test]
    fn matches_author_by_name_or_email() {
        let c = commit("abc", "Ada", "main", 0);
        assert!(c.authored_by("Ada"));
        assert!(c.authored_by("ADA@example.com"));
        assert!(!c.authored_by("ada"));
        assert!(!c.authored_by("Grace"));
    }
}
