use std::fmt::Write;

use chrono::{DateTime, Local, Utc};

use crate::domain::batch::Batch;
use crate::domain::range::{DATE_FORMAT, DateRange};

#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub branch: String,
    pub author: String,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
    pub commit_count: usize,
    pub body: SectionBody,
}

/// What the model produced for one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SectionBody {
    Summary(String),
    Failed(String),
}

impl BatchSummary {
    pub fn new(batch: &Batch, text: String) -> Self {
        Self::with_body(batch, SectionBody::Summary(text))
    }

    pub fn failed(batch: &Batch, reason: String) -> Self {
        Self::with_body(batch, SectionBody::Failed(reason))
    }

    fn with_body(batch: &Batch, body: SectionBody) -> Self {
        let now = Utc::now();
        let (first_commit, last_commit) = batch.period().unwrap_or((now, now));
        Self {
            branch: batch.branch.clone(),
            author: batch.author.clone(),
            first_commit,
            last_commit,
            commit_count: batch.len(),
            body,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.body, SectionBody::Failed(_))
    }

    /// Calendar days covered, counting a single day as one.
    pub fn span_days(&self) -> i64 {
        let first = self.first_commit.with_timezone(&Local).date_naive();
        let last = self.last_commit.with_timezone(&Local).date_naive();
        ((last - first).num_days() + 1).max(1)
    }
}

#[derive(Debug, Clone)]
pub struct SummaryReport {
    pub repository: String,
    pub range: DateRange,
    pub branch: Option<String>,
    pub author: Option<String>,
    pub sections: Vec<BatchSummary>,
}

impl SummaryReport {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn commit_count(&self) -> usize {
        self.sections.iter().map(|s| s.commit_count).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.sections.iter().filter(|s| s.is_failed()).count()
    }

    pub fn scope(&self) -> String {
        describe_scope(&self.range, self.branch.as_deref(), self.author.as_deref())
    }

    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Commit summary for {}", self.repository);
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "_{} commits, {}_",
            self.commit_count(),
            self.scope()
        );

        for section in &self.sections {
            let _ = writeln!(out);
            let _ = writeln!(out, "## {} on {}", section.author, section.branch);
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "- **Period:** {} to {} ({} days)",
                format_date(section.first_commit),
                format_date(section.last_commit),
                section.span_days()
            );
            let _ = writeln!(out, "- **Commits:** {}", section.commit_count);
            let _ = writeln!(out);
            match &section.body {
                SectionBody::Summary(text) => {
                    let _ = writeln!(out, "{}", text.trim());
                }
                SectionBody::Failed(reason) => {
                    let _ = writeln!(
                        out,
                        "_Failed to generate summary for author: {}, branch: {} ({reason})_",
                        section.author, section.branch
                    );
                }
            }
            let _ = writeln!(out);
            let _ = writeln!(out, "---");
        }
        out
    }
}

/// Human-readable scope line, e.g. "2024-03-01 to 2024-03-07 on branch 'main'".
pub fn describe_scope(range: &DateRange, branch: Option<&str>, author: Option<&str>) -> String {
    let mut scope = range.describe();
    if let Some(branch) = branch {
        let _ = write!(scope, " on branch '{branch}'");
    }
    if let Some(author) = author {
        let _ = write!(scope, " by '{author}'");
    }
    scope
}

fn format_date(instant: DateTime<Utc>) -> String {
    instant
        .with_timezone(&Local)
        .format(DATE_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::domain::commit::fixtures::commit;

    fn report(sections: Vec<BatchSummary>) -> SummaryReport {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        SummaryReport {
            repository: "widgets".to_string(),
            range: DateRange::new(start, end).unwrap(),
            branch: Some("main".to_string()),
            author: None,
            sections,
        }
    }

    #[test]
    fn renders_one_section_per_batch_in_order() {
        let day = 86_400;
        let base = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap().timestamp();
        let first = Batch {
            branch: "main".to_string(),
            author: "Ada".to_string(),
            commits: vec![
                commit("a", "Ada", "main", base),
                commit("b", "Ada", "main", base + 2 * day),
            ],
        };
        let second = Batch {
            branch: "main".to_string(),
            author: "Grace".to_string(),
            commits: vec![commit("c", "Grace", "main", base)],
        };

        let markdown = report(vec![
            BatchSummary::new(&first, "First summary".to_string()),
            BatchSummary::new(&second, "  Second summary\n".to_string()),
        ])
        .to_markdown();

        assert!(markdown.starts_with("# Commit summary for widgets\n"));
        assert!(markdown.contains("_3 commits, "));
        assert!(markdown.contains("on branch 'main'_"));
        assert!(markdown.contains("(3 days)"));
        let ada = markdown.find("## Ada on main").unwrap();
        let grace = markdown.find("## Grace on main").unwrap();
        assert!(ada < grace);
        assert!(markdown.contains("\nSecond summary\n"));
    }

    #[test]
    fn failed_sections_are_marked_and_counted() {
        let base = Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap().timestamp();
        let batch = Batch {
            branch: "main".to_string(),
            author: "Ada".to_string(),
            commits: vec![commit("a", "Ada", "main", base)],
        };

        let report = report(vec![
            BatchSummary::new(&batch, "Done".to_string()),
            BatchSummary::failed(&batch, "rate limited".to_string()),
        ]);

        assert_eq!(report.failed_count(), 1);
        assert_eq!(report.commit_count(), 2);
        let markdown = report.to_markdown();
        assert!(markdown.contains("\nDone\n"));
        assert!(markdown.contains(
            "_Failed to generate summary for author: Ada, branch: main (rate limited)_"
        ));
    }

    #[test]
    fn scope_mentions_filters() {
        let mut report = report(Vec::new());
        report.author = Some("Ada".to_string());
        assert!(report.scope().ends_with(" on branch 'main' by 'Ada'"));
    }

    #[test]
    fn empty_report_has_no_sections() {
        let report = report(Vec::new());
        assert!(report.is_empty());
        assert_eq!(report.commit_count(), 0);
        assert!(!report.to_markdown().contains("## "));
    }
}
