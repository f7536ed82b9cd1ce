use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Args;

use crate::config::{AppConfig, StoredConfig};
use crate::context::AppContext;
use crate::domain::location::RepositoryLocation;
use crate::domain::range::{DateRange, Window, parse_date};
use crate::domain::summary::{SummaryReport, describe_scope};
use crate::error::{AppError, AppResult};
use crate::services::CommitQuery;
use crate::workflow::summary::{SummaryRequest, summarize_repository};

#[derive(Args, Debug, Clone, Default)]
pub struct SummarizeArgs {
    /// Local path, remote URL, or GitHub owner/repo.
    pub repo: Option<String>,

    /// Start date (YYYY-MM-DD).
    #[arg(short, long = "start-date", requires = "end_date")]
    pub start_date: Option<String>,

    /// End date (YYYY-MM-DD), inclusive.
    #[arg(short, long = "end-date", requires = "start_date")]
    pub end_date: Option<String>,

    /// Number of days to include, ending now.
    #[arg(short, long, conflicts_with_all = ["weeks", "months", "start_date"])]
    pub days: Option<u32>,

    /// Number of weeks to include, ending now.
    #[arg(short, long, conflicts_with_all = ["months", "start_date"])]
    pub weeks: Option<u32>,

    /// Number of months (30 days each) to include, ending now.
    #[arg(short, long, conflicts_with = "start_date")]
    pub months: Option<u32>,

    /// Only walk this branch.
    #[arg(short, long)]
    pub branch: Option<String>,

    /// Only keep commits by this author name or email.
    #[arg(short, long)]
    pub author: Option<String>,

    /// Write the Markdown summary here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl SummarizeArgs {
    pub fn window(&self) -> AppResult<Window> {
        if let Some(days) = self.days {
            return Ok(Window::Days(days));
        }
        if let Some(weeks) = self.weeks {
            return Ok(Window::Weeks(weeks));
        }
        if let Some(months) = self.months {
            return Ok(Window::Months(months));
        }
        match (&self.start_date, &self.end_date) {
            (Some(start), Some(end)) => Ok(Window::Between(parse_date(start)?, parse_date(end)?)),
            (None, None) => Ok(Window::Default),
            _ => Err(AppError::InvalidInput(
                "--start-date and --end-date must be given together".to_string(),
            )),
        }
    }
}

pub async fn run(args: SummarizeArgs) -> AppResult<()> {
    let repo = args.repo.as_deref().ok_or_else(|| {
        AppError::InvalidInput("please provide a repository path or URL".to_string())
    })?;
    let location = RepositoryLocation::parse(repo)?;
    let range = DateRange::from_window(args.window()?, Utc::now())?;

    let stored = StoredConfig::load()?;
    let config = AppConfig::from_stored(&stored)?;

    if config.openai_api_key.is_none() {
        tracing::warn!("OpenAI API key not configured; summarization will fail.");
    }

    let context = AppContext::for_location(config, &location);

    let request = SummaryRequest {
        repository: location.name(),
        query: CommitQuery::new(range, args.branch, args.author),
    };
    let scope = describe_scope(
        &request.query.range,
        request.query.branch.as_deref(),
        request.query.author.as_deref(),
    );
    eprintln!("Start generating commits summary ({scope}):");

    let report = summarize_repository(&context, request).await?;
    if report.is_empty() {
        eprintln!("No commits found within the specified date range.");
        return Ok(());
    }

    finish(&report, args.output.as_deref())
}

/// Writes the report, then fails if any batch could not be summarized.
fn finish(report: &SummaryReport, output: Option<&Path>) -> AppResult<()> {
    write_output(output, &report.to_markdown())?;
    let failed = report.failed_count();
    if failed > 0 {
        return Err(AppError::IncompleteSummary {
            failed,
            total: report.sections.len(),
        });
    }
    eprintln!(
        "Summary generation complete: {} commits in {} sections.",
        report.commit_count(),
        report.sections.len()
    );
    Ok(())
}

pub fn write_output(path: Option<&Path>, markdown: &str) -> AppResult<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, markdown)?;
            eprintln!("Summary saved to {}", path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(markdown.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
