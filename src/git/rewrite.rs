//! Position-indexed rewrite of commit timestamps.
//!
//! Every commit reachable from a branch or tag is visited parents first. A
//! commit whose position after the boundary has a slot in the plan gets new
//! author and committer dates; any other commit is recreated only when one of
//! its parents was, so untouched history keeps its hashes.
//!
//! Objects are rebuilt from their raw bytes, so messages and headers such as
//! `encoding` come through unchanged whatever their encoding.

use std::collections::HashMap;

use anyhow::{Context, Result};
use git2::{ObjectType, Oid, Repository, Sort, Time};
use tracing::{debug, info, warn};

use crate::git::time::{format_raw_time, local_git_time};
use crate::git::REWRITE_REFLOG_MESSAGE;
use crate::store::{RecordId, RewriteSummary, TimestampPlan, RESTORE_POINT_PREFIX};

/// A reference to move once its commit has been rewritten.
#[derive(Debug)]
struct RefTarget {
    /// Full reference name.
    name: String,
    /// Commit the reference resolves to.
    commit: Oid,
    /// Annotated tag object, when the reference points at one.
    tag: Option<Oid>,
}

/// Rewrites commit timestamps across the whole repository.
pub struct TimestampRewriter<'r> {
    repo: &'r Repository,
}

impl<'r> TimestampRewriter<'r> {
    /// Creates a rewriter over `repo`.
    pub fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }

    /// Applies `plan` to the commits following `boundary` on HEAD.
    pub fn rewrite(
        &self,
        boundary: Option<&RecordId>,
        plan: &TimestampPlan,
    ) -> Result<RewriteSummary> {
        let positions = self.positions(boundary)?;
        let refs = self.collect_refs()?;
        let detached_head = self.detached_head()?;

        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
            .context("Failed to set revwalk sorting")?;
        for target in &refs {
            walker
                .push(target.commit)
                .with_context(|| format!("Failed to push {}", target.name))?;
        }
        if let Some(head) = detached_head {
            walker.push(head).context("Failed to push detached HEAD")?;
        }

        let odb = self.repo.odb().context("Failed to open object database")?;
        let mut summary = RewriteSummary::default();
        let mut rewritten: HashMap<Oid, Oid> = HashMap::new();

        for oid in walker {
            let oid = oid.context("Failed to get commit OID from walker")?;
            summary.visited += 1;

            let new_time = positions
                .get(&oid)
                .and_then(|&position| plan.timestamp_at(position));

            let commit = self.repo.find_commit(oid).context("Failed to find commit")?;
            let parent_ids: Vec<Oid> = commit
                .parent_ids()
                .map(|parent| rewritten.get(&parent).copied().unwrap_or(parent))
                .collect();
            let parents_changed = parent_ids.iter().copied().ne(commit.parent_ids());

            if new_time.is_none() && !parents_changed {
                continue;
            }

            let time = match new_time {
                Some(timestamp) => {
                    summary.retimed += 1;
                    Some(local_git_time(timestamp)?)
                }
                None => None,
            };

            let raw = rebuild_commit(
                commit.raw_header_bytes(),
                commit.message_raw_bytes(),
                &parent_ids,
                time.as_ref(),
            );
            let new_oid = odb
                .write(ObjectType::Commit, &raw)
                .with_context(|| format!("Failed to rewrite commit {oid}"))?;

            debug!(old = %oid, new = %new_oid, retimed = time.is_some(), "Rewrote commit");
            rewritten.insert(oid, new_oid);
        }

        for target in &refs {
            if let Some(&new_oid) = rewritten.get(&target.commit) {
                self.move_reference(target, new_oid)?;
                summary.refs_updated += 1;
            }
        }

        if let Some(head) = detached_head {
            if let Some(&new_oid) = rewritten.get(&head) {
                self.repo
                    .set_head_detached(new_oid)
                    .context("Failed to move detached HEAD")?;
                summary.refs_updated += 1;
            }
        }

        info!(
            visited = summary.visited,
            retimed = summary.retimed,
            refs_updated = summary.refs_updated,
            "Timestamp rewrite finished"
        );
        Ok(summary)
    }

    /// Maps each commit after `boundary` on HEAD to its chronological position.
    fn positions(&self, boundary: Option<&RecordId>) -> Result<HashMap<Oid, usize>> {
        let head = match self.repo.head() {
            Ok(head) => head.peel_to_commit().context("Failed to peel HEAD to commit")?,
            Err(_) => return Ok(HashMap::new()),
        };

        let mut walker = self.repo.revwalk().context("Failed to create revwalk")?;
        walker
            .set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)
            .context("Failed to set revwalk sorting")?;
        walker.push(head.id()).context("Failed to push HEAD")?;

        if let Some(boundary) = boundary {
            let oid = Oid::from_str(&boundary.0)
                .with_context(|| format!("Invalid boundary commit: {boundary}"))?;
            walker
                .hide(oid)
                .with_context(|| format!("Failed to hide boundary commit {}", boundary.short()))?;
        }

        walker
            .enumerate()
            .map(|(position, oid)| -> Result<(Oid, usize)> {
                let oid = oid.context("Failed to get commit OID from walker")?;
                Ok((oid, position))
            })
            .collect()
    }

    /// Branches and tags to carry over, restore points excluded.
    fn collect_refs(&self) -> Result<Vec<RefTarget>> {
        let mut targets = Vec::new();

        for reference in self
            .repo
            .references()
            .context("Failed to list references")?
        {
            let reference = reference.context("Failed to read reference")?;
            let Some(name) = reference.name() else {
                continue;
            };

            let is_branch = name.starts_with("refs/heads/");
            let is_tag = name.starts_with("refs/tags/");
            let is_restore_point = name
                .strip_prefix("refs/heads/")
                .is_some_and(|branch| branch.starts_with(RESTORE_POINT_PREFIX));

            if !(is_branch || is_tag) || is_restore_point {
                continue;
            }

            let Some(target) = reference.target() else {
                continue;
            };

            let object = self
                .repo
                .find_object(target, None)
                .with_context(|| format!("Failed to resolve {name}"))?;

            let (commit, tag) = match object.kind() {
                Some(ObjectType::Commit) => (target, None),
                Some(ObjectType::Tag) => match object.peel_to_commit() {
                    Ok(commit) => (commit.id(), Some(target)),
                    Err(_) => continue,
                },
                _ => continue,
            };

            targets.push(RefTarget {
                name: name.to_string(),
                commit,
                tag,
            });
        }

        Ok(targets)
    }

    /// The commit HEAD points at when it is detached.
    fn detached_head(&self) -> Result<Option<Oid>> {
        if !self
            .repo
            .head_detached()
            .context("Failed to inspect HEAD")?
        {
            return Ok(None);
        }

        let head = self.repo.head().context("Failed to get HEAD reference")?;
        Ok(head.target())
    }

    /// Points `target` at `new_oid`, recreating annotated tags.
    fn move_reference(&self, target: &RefTarget, new_oid: Oid) -> Result<()> {
        let new_target = match target.tag {
            Some(tag_oid) => self.retag(target, tag_oid, new_oid)?,
            None => new_oid,
        };

        self.repo
            .reference(&target.name, new_target, true, REWRITE_REFLOG_MESSAGE)
            .with_context(|| format!("Failed to update {}", target.name))?;
        Ok(())
    }

    /// Writes a copy of an annotated tag pointing at `new_oid`.
    ///
    /// Tags of tags are left pointing at their original tag object.
    fn retag(&self, target: &RefTarget, tag_oid: Oid, new_oid: Oid) -> Result<Oid> {
        let tag = self
            .repo
            .find_tag(tag_oid)
            .with_context(|| format!("Failed to find tag object for {}", target.name))?;
        if tag.target_type() != Some(ObjectType::Commit) {
            warn!(tag = %target.name, "Tag does not point at a commit; left unchanged");
            return Ok(tag_oid);
        }

        let odb = self.repo.odb().context("Failed to open object database")?;
        let object = odb
            .read(tag_oid)
            .with_context(|| format!("Failed to read tag object for {}", target.name))?;

        odb.write(ObjectType::Tag, &rebuild_tag(object.data(), new_oid))
            .with_context(|| format!("Failed to recreate tag {}", target.name))
    }
}

/// Rebuilds a raw commit object with `parents` and, when given, a new `time`
/// for both author and committer.
///
/// Every other header is kept byte for byte, except signatures, which would no
/// longer match the rewritten object.
fn rebuild_commit(header: &[u8], message: &[u8], parents: &[Oid], time: Option<&Time>) -> Vec<u8> {
    let mut raw = Vec::with_capacity(header.len() + message.len() + 1);
    let mut dropping = false;

    for line in header.split(|&b| b == b'\n').filter(|line| !line.is_empty()) {
        // Continuation of a multi-line header
        if line.starts_with(b" ") {
            if !dropping {
                push_line(&mut raw, line);
            }
            continue;
        }
        dropping = false;

        let key = line.split(|&b| b == b' ').next().unwrap_or_default();
        match key {
            b"tree" => {
                push_line(&mut raw, line);
                for parent in parents {
                    push_line(&mut raw, format!("parent {parent}").as_bytes());
                }
            }
            b"parent" => {}
            b"author" | b"committer" => match time {
                Some(time) => push_line(&mut raw, &retime_identity(line, time)),
                None => push_line(&mut raw, line),
            },
            b"gpgsig" | b"gpgsig-sha256" => dropping = true,
            _ => push_line(&mut raw, line),
        }
    }

    raw.push(b'\n');
    raw.extend_from_slice(message);
    raw
}

/// Replaces the timestamp at the end of an `author` or `committer` line.
fn retime_identity(line: &[u8], time: &Time) -> Vec<u8> {
    let Some(end) = line.iter().rposition(|&b| b == b'>') else {
        return line.to_vec();
    };

    let mut retimed = line[..=end].to_vec();
    retimed.push(b' ');
    retimed.extend_from_slice(format_raw_time(time).as_bytes());
    retimed
}

/// Points a raw tag object at `target`, keeping its name, tagger and message.
fn rebuild_tag(raw: &[u8], target: Oid) -> Vec<u8> {
    let rest = raw
        .iter()
        .position(|&b| b == b'\n')
        .map_or(&[][..], |end| &raw[end..]);

    let mut rebuilt = format!("object {target}").into_bytes();
    rebuilt.extend_from_slice(rest);
    rebuilt
}

fn push_line(raw: &mut Vec<u8>, line: &[u8]) {
    raw.extend_from_slice(line);
    raw.push(b'\n');
}
