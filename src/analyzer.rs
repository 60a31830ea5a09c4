// src/analyzer.rs

use crate::error::ScanError;
use crate::extractor::ImageExtractor;
use crate::model::*;
use git2::{Commit, DiffOptions, Oid, Repository, Revwalk, Sort};
use indexmap::IndexMap;
use indicatif::ProgressBar;
use std::path::Path;

pub fn open_repository(path: &Path) -> Result<Repository, ScanError> {
    Repository::open(path).map_err(|source| ScanError::RepositoryInvalid { path: path.to_path_buf(), source })
}

/// Walks a repository's history from HEAD, newest first, until the watermark
/// commit is reached. The watermark commit itself is never yielded.
pub struct RevisionWalk<'repo> {
    repo: &'repo Repository,
    revwalk: Option<Revwalk<'repo>>,
    /// First commit, already pulled from the revwalk to learn the tip
    pending: Option<Oid>,
    stop_at: Option<String>,
    tip: Option<String>,
}

impl RevisionWalk<'_> {
    /// The newest commit of the repository, regardless of where the walk stops
    pub fn tip(&self) -> Option<&str> {
        self.tip.as_deref()
    }
}

impl Iterator for RevisionWalk<'_> {
    type Item = Result<CommitRecord, git2::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = match self.pending.take() {
            Some(oid) => oid,
            None => match self.revwalk.as_mut()?.next()? {
                Ok(oid) => oid,
                Err(e) => return Some(Err(e)),
            },
        };

        if self.stop_at.as_deref() == Some(oid.to_string().as_str()) {
            self.revwalk = None;
            return None;
        }

        Some(read_commit(self.repo, oid))
    }
}

/// Starts a walk over `repo`. An absent watermark, or one that is not in
/// history, walks everything reachable from HEAD.
pub fn walk<'repo>(repo: &'repo Repository, watermark: Option<&str>) -> Result<RevisionWalk<'repo>, git2::Error> {
    let stop_at = watermark.map(String::from);

    if repo.is_empty()? {
        return Ok(RevisionWalk { repo, revwalk: None, pending: None, stop_at, tip: None });
    }

    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.set_sorting(Sort::TIME)?;

    let pending = revwalk.next().transpose()?;
    let tip = pending.map(|oid| oid.to_string());

    Ok(RevisionWalk { repo, revwalk: Some(revwalk), pending, stop_at, tip })
}

fn read_commit(repo: &Repository, oid: Oid) -> Result<CommitRecord, git2::Error> {
    let commit = repo.find_commit(oid)?;
    let signature = commit.author();
    let author = AuthorId::new(signature.name().unwrap_or("Unknown"), signature.email().unwrap_or(""));

    Ok(CommitRecord {
        id: oid.to_string(),
        author,
        message: commit.message().unwrap_or("").to_string(),
        paths: touched_paths(repo, &commit)?,
    })
}

/// Paths changed relative to the first parent; a root commit is compared with the empty tree
fn touched_paths(repo: &Repository, commit: &Commit) -> Result<Vec<String>, git2::Error> {
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };
    let tree = commit.tree()?;

    let mut diff_opts = DiffOptions::new();
    diff_opts.include_untracked(false);
    diff_opts.ignore_filemode(true);

    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;

    let mut paths = Vec::new();
    for delta in diff.deltas() {
        let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) else {
            continue;
        };
        match path.to_str() {
            Some(p) => paths.push(p.to_string()),
            None => tracing::debug!("Ignoring non UTF-8 path {} in {}", path.display(), commit.id()),
        }
    }
    Ok(paths)
}

/// Collects images and messages per author, keeping the order in which
/// authors were first seen during the walk.
#[derive(Debug, Default)]
pub struct AuthorAggregator {
    groups: IndexMap<AuthorId, AuthorGroup>,
}

impl AuthorAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends to the author's group, creating it on first sight even if there is nothing to add
    pub fn add(&mut self, author: &AuthorId, images: Vec<ExtractedImage>, messages: Vec<String>) {
        let group = self.groups.entry(author.clone()).or_insert_with(|| AuthorGroup {
            author: author.clone(),
            images: Vec::new(),
            messages: Vec::new(),
        });
        group.images.extend(images);
        group.messages.extend(messages);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Groups that found at least one image, in first-seen order
    pub fn into_groups(self) -> Vec<AuthorGroup> {
        self.groups.into_values().filter(|g| !g.images.is_empty()).collect()
    }
}

/// Walks `path` down to `watermark`, extracting and grouping the images of
/// every non-merge commit.
pub fn scan_repository(path: &Path, watermark: Option<&str>) -> Result<RepositoryScan, ScanError> {
    let repo = open_repository(path)?;
    let commits = walk(&repo, watermark)?;
    let tip = commits.tip().map(String::from);

    let extractor = ImageExtractor::new(repo.workdir().unwrap_or(path));
    let mut aggregator = AuthorAggregator::new();
    let mut commits_walked = 0;

    let bar = ProgressBar::new_spinner();
    bar.set_message(format!("Scanning {}", path.display()));

    for commit in commits {
        let commit = commit?;
        commits_walked += 1;
        bar.inc(1);

        if commit.is_merge() {
            tracing::debug!("Skipping merge commit {}", commit.id);
            aggregator.add(&commit.author, Vec::new(), Vec::new());
            continue;
        }

        let images = extractor.extract(&commit);
        let messages = if images.is_empty() { Vec::new() } else { vec![commit.message.clone()] };
        aggregator.add(&commit.author, images, messages);
    }
    bar.finish_and_clear();

    tracing::debug!("Walked {} commits by {} authors in {}", commits_walked, aggregator.len(), path.display());

    Ok(RepositoryScan { tip, groups: aggregator.into_groups(), commits_walked })
}
