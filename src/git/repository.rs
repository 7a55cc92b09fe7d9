//! Git repository operations.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDateTime};
use git2::{
    Commit, ErrorCode, Repository, Signature, Sort, StashFlags, Status, StatusOptions, Time,
};
use tracing::{debug, info};

use crate::error::ChronoError;
use crate::git::rewrite::TimestampRewriter;
use crate::git::time::{local_git_time, to_datetime};
use crate::store::{HistoryStore, Record, RecordId, RewriteSummary, TimestampPlan};

/// Default name of the log file synthetic commits append to.
pub const DEFAULT_LOG_FILE: &str = "commit_log.txt";

/// First line written to a freshly created log file.
const LOG_HEADER: &str = "Commit Log\n";

/// Git repository wrapper.
pub struct GitRepository {
    repo: Repository,
    log_file: PathBuf,
}

/// Working directory status.
#[derive(Debug)]
pub struct WorkingDirectoryStatus {
    /// Whether the working directory has no changes.
    pub clean: bool,
    /// Files with uncommitted changes, untracked files included.
    pub changes: Vec<FileStatus>,
}

/// File status information.
#[derive(Debug)]
pub struct FileStatus {
    /// Git status flags (e.g., "AM", "??", "M ").
    pub status: String,
    /// Path to the file relative to repository root.
    pub file: String,
}

impl GitRepository {
    /// Opens the repository at the specified path.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::open(path)
            .with_context(|| format!("Failed to open git repository at {}", path.display()))?;

        Ok(Self {
            repo,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        })
    }

    /// Sets the log file, relative to the working directory, that records append to.
    pub fn with_log_file<P: Into<PathBuf>>(mut self, log_file: P) -> Self {
        self.log_file = log_file.into();
        self
    }

    /// Returns the working directory status, ignoring ignored files.
    pub fn get_working_directory_status(&self) -> Result<WorkingDirectoryStatus> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut options))
            .context("Failed to get repository status")?;

        let changes: Vec<FileStatus> = statuses
            .iter()
            .filter(|entry| !entry.status().is_ignored())
            .filter_map(|entry| {
                entry.path().map(|path| FileStatus {
                    status: format_status_flags(entry.status()),
                    file: path.to_string(),
                })
            })
            .collect();

        Ok(WorkingDirectoryStatus {
            clean: changes.is_empty(),
            changes,
        })
    }

    /// Returns the commit HEAD points at, or `None` on an unborn branch.
    pub fn head_commit(&self) -> Result<Option<Commit<'_>>> {
        match self.repo.head() {
            Ok(head) => {
                let commit = head
                    .peel_to_commit()
                    .context("Failed to peel HEAD to commit")?;
                Ok(Some(commit))
            }
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to get HEAD reference"),
        }
    }

    /// Builds a signature from the configured identity with the given time.
    fn signature_at(&self, time: &Time) -> Result<Signature<'static>> {
        let configured = self
            .repo
            .signature()
            .context("Failed to read user.name and user.email from git config")?;

        let name = configured
            .name()
            .context("Configured user.name is not valid UTF-8")?;
        let email = configured
            .email()
            .context("Configured user.email is not valid UTF-8")?;

        Signature::new(name, email, time).context("Failed to build commit signature")
    }

    /// Walks history from HEAD, newest committer time first.
    fn walk_from_head(&self) -> Result<Vec<Commit<'_>>> {
        let Some(head) = self.head_commit()? else {
            return Ok(Vec::new());
        };

        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .set_sorting(Sort::TIME)
            .context("Failed to set revwalk sorting")?;
        walker.push(head.id()).context("Failed to push HEAD")?;

        walker
            .map(|oid| {
                let oid = oid.context("Failed to get commit OID from walker")?;
                self.repo.find_commit(oid).context("Failed to find commit")
            })
            .collect()
    }
}

impl HistoryStore for GitRepository {
    fn has_local_changes(&self) -> Result<bool> {
        let status = self.get_working_directory_status()?;
        for change in &status.changes {
            debug!(status = %change.status, file = %change.file, "Uncommitted change");
        }
        Ok(!status.clean)
    }

    fn stash_local_changes(&mut self, message: &str) -> Result<()> {
        let stasher = self
            .repo
            .signature()
            .context("Failed to read user.name and user.email from git config")?;

        let oid = self
            .repo
            .stash_save(&stasher, message, Some(StashFlags::INCLUDE_UNTRACKED))
            .context("Failed to stash local changes")?;

        info!(stash = %oid, "Stashed local changes");
        Ok(())
    }

    fn restore_local_changes(&mut self) -> Result<()> {
        self.repo
            .stash_pop(0, None)
            .context("Failed to restore stashed changes")?;

        info!("Restored stashed changes");
        Ok(())
    }

    fn list_records_since(&self, cutoff: DateTime<Local>) -> Result<Vec<Record>> {
        let cutoff = cutoff.timestamp();
        let mut records = Vec::new();

        for commit in self.walk_from_head()? {
            if commit.committer().when().seconds() < cutoff {
                continue;
            }
            records.push(record_from_commit(&commit)?);
        }

        // Oldest first
        records.reverse();
        Ok(records)
    }

    fn boundary_before(&self, cutoff: DateTime<Local>) -> Result<Option<RecordId>> {
        let cutoff = cutoff.timestamp();

        Ok(self
            .walk_from_head()?
            .into_iter()
            .find(|commit| commit.committer().when().seconds() < cutoff)
            .map(|commit| RecordId(commit.id().to_string())))
    }

    fn append_record(
        &mut self,
        content: &str,
        timestamp: NaiveDateTime,
        label: &str,
    ) -> Result<RecordId> {
        let workdir = self.repo.workdir().ok_or(ChronoError::BareRepository)?;
        let log_path = workdir.join(&self.log_file);

        if !log_path.exists() {
            fs::write(&log_path, LOG_HEADER)
                .with_context(|| format!("Failed to create log file: {}", log_path.display()))?;
        }

        let mut file = OpenOptions::new()
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;
        writeln!(file, "{content}")
            .with_context(|| format!("Failed to append to log file: {}", log_path.display()))?;

        let mut index = self.repo.index().context("Failed to open index")?;
        index
            .add_path(&self.log_file)
            .with_context(|| format!("Failed to stage {}", self.log_file.display()))?;
        index.write().context("Failed to write index")?;

        let tree_id = index.write_tree().context("Failed to write tree")?;
        let tree = self.repo.find_tree(tree_id).context("Failed to find tree")?;

        let time = local_git_time(timestamp)?;
        let signature = self.signature_at(&time)?;

        let parent = self.head_commit()?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        let oid = self
            .repo
            .commit(Some("HEAD"), &signature, &signature, label, &tree, &parents)
            .with_context(|| format!("Failed to commit '{label}'"))?;

        debug!(commit = %oid, %timestamp, "Created commit");
        Ok(RecordId(oid.to_string()))
    }

    fn create_restore_point(&mut self, label: &str) -> Result<()> {
        let Some(head) = self.head_commit()? else {
            bail!("Cannot create restore point '{label}': repository has no commits");
        };

        self.repo
            .branch(label, &head, false)
            .with_context(|| format!("Failed to create backup branch '{label}'"))?;

        info!(branch = label, commit = %head.id(), "Created restore point");
        Ok(())
    }

    fn rewrite_timestamps(
        &mut self,
        boundary: Option<&RecordId>,
        plan: &TimestampPlan,
    ) -> Result<RewriteSummary> {
        TimestampRewriter::new(&self.repo).rewrite(boundary, plan)
    }
}

/// Converts a commit into a store record.
fn record_from_commit(commit: &Commit<'_>) -> Result<Record> {
    Ok(Record {
        id: RecordId(commit.id().to_string()),
        timestamp: to_datetime(commit.committer().when())?,
        authored: to_datetime(commit.author().when())?,
        label: commit.summary().unwrap_or("").to_string(),
    })
}

/// Formats git status flags into string representation.
fn format_status_flags(flags: Status) -> String {
    let mut status = String::new();

    if flags.contains(Status::INDEX_NEW) {
        status.push('A');
    } else if flags.contains(Status::INDEX_MODIFIED) {
        status.push('M');
    } else if flags.contains(Status::INDEX_DELETED) {
        status.push('D');
    } else if flags.contains(Status::INDEX_RENAMED) {
        status.push('R');
    } else if flags.contains(Status::INDEX_TYPECHANGE) {
        status.push('T');
    } else {
        status.push(' ');
    }

    if flags.contains(Status::WT_NEW) {
        status.push('?');
    } else if flags.contains(Status::WT_MODIFIED) {
        status.push('M');
    } else if flags.contains(Status::WT_DELETED) {
        status.push('D');
    } else if flags.contains(Status::WT_TYPECHANGE) {
        status.push('T');
    } else if flags.contains(Status::WT_RENAMED) {
        status.push('R');
    } else {
        status.push(' ');
    }

    status
}
