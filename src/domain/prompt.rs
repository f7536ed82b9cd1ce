use std::fmt::Write;

use crate::domain::batch::Batch;

const SUMMARY_PROMPT: &str = r#"You summarize Git commits for the branch "{branch}" in a clear, concise and standardized manner.

Summarize the following commits:

{commits}

Strictly follow this output format:
- 📝 Summary:
    - One sentence capturing the overall purpose of these commits.
    - Use the Git commit message style: imperative mood, capitalized, no trailing period.
    - Example: "✨ Add new feature for user authentication"

- 🔍 Key Changes:
    - 🌟 Feature: new features or enhancements
    - 🛠️ Refactor: significant refactoring or code improvements
    - 🐛 Fix: bug fixes or issue resolutions
    - 📚 Docs: documentation updates
    - 🚀 Perf: performance optimizations
    - 🧪 Test: added or modified tests
    - 🎨 Style: styling or UI changes
    - 🔧 Chore: build process, dependency or configuration updates
    Add bullets as needed, categorized with gitmoji. Omit categories with no changes.

- 💡 Insights:
    - Additional observations about the commits
    - Potential impact or benefits of the changes
    - Suggestions for future improvements

Follow gitmoji conventions and use Markdown formatting."#;

pub fn summary_prompt(batch: &Batch) -> String {
    SUMMARY_PROMPT
        .replace("{branch}", &batch.branch)
        .replace("{commits}", &render_commits(batch))
}

fn render_commits(batch: &Batch) -> String {
    let mut out = String::new();
    for commit in &batch.commits {
        let _ = writeln!(out, "- {} {}", commit.short_hash(), commit.subject());
        if let Some(body) = commit.body() {
            for line in body.lines().filter(|line| !line.trim().is_empty()) {
                let _ = writeln!(out, "  {}", line.trim_end());
            }
        }
        if let Some(diff) = commit.diff_summary.as_deref() {
            let _ = writeln!(out, "  ({diff})");
        }
    }
    out.trim_end().to_string()
}
