//! History provider backed by a git repository on disk.
//!
//! Commits touching a path are found with a time-sorted revwalk from HEAD,
//! diffing each commit against its first parent. Patches are rendered as
//! unified diff text with 3 lines of context, the same shape a forge API
//! returns. `owner` and `repo` arguments are ignored.
//!
//! Each call opens its own `Repository` on the blocking pool, so calls never
//! wait on each other. A resolver timeout abandons the call but does not
//! interrupt git work that is already running; that task finishes on its own.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::DateTime;
use git2::{DiffOptions, Oid, Repository, Sort};

use crate::history::{HistoryProvider, ProviderError};
use crate::models::{CommitPage, CommitRecord, CommitRef, FilePatch};

pub struct LocalGitProvider {
    /// `.git` directory found by discovery
    git_dir: PathBuf,
    path: String,
    per_page: usize,
}

impl LocalGitProvider {
    pub fn open<P: AsRef<Path>>(path: P, per_page: u32) -> Result<Self, ProviderError> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let repo = Repository::discover(&path).map_err(|e| {
            ProviderError::NotFound(format!("repository {}: {}", path_str, e.message()))
        })?;

        Ok(Self {
            git_dir: repo.path().to_path_buf(),
            path: path_str,
            per_page: per_page.max(1) as usize,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Open the repository on the blocking pool and run `f` against it.
    async fn with_repo<F, T>(&self, f: F) -> Result<T, ProviderError>
    where
        F: FnOnce(&Repository) -> Result<T, ProviderError> + Send + 'static,
        T: Send + 'static,
    {
        let git_dir = self.git_dir.clone();
        tokio::task::spawn_blocking(move || {
            let repo = Repository::open(&git_dir)?;
            f(&repo)
        })
        .await
        .map_err(|e| ProviderError::Internal(format!("git task failed: {}", e)))?
    }
}

#[async_trait]
impl HistoryProvider for LocalGitProvider {
    async fn list_commits(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        page: u32,
    ) -> Result<CommitPage, ProviderError> {
        let per_page = self.per_page;
        let skip = (page.saturating_sub(1) as usize).saturating_mul(per_page);
        let path = path.to_string();

        tracing::debug!(repo = %self.path, %path, page, "Listing commits from local repository");

        self.with_repo(move |repo| {
            // One extra commit tells us whether another page exists.
            let page_end = skip.saturating_add(per_page);
            let mut touching = commits_touching_path(repo, &path, page_end.saturating_add(1))?;
            let has_more = touching.len() > page_end;
            touching.truncate(page_end);

            Ok(CommitPage {
                commits: touching
                    .into_iter()
                    .skip(skip)
                    .map(|oid| CommitRef { id: oid.to_string() })
                    .collect(),
                next_page: if has_more {
                    page.max(1).checked_add(1)
                } else {
                    None
                },
            })
        })
        .await
    }

    async fn get_commit(
        &self,
        _owner: &str,
        _repo: &str,
        commit_id: &str,
    ) -> Result<CommitRecord, ProviderError> {
        let commit_id = commit_id.to_string();
        self.with_repo(move |repo| commit_record(repo, &commit_id)).await
    }

    fn name(&self) -> &'static str {
        "local"
    }
}

/// Up to `limit` commits touching `path`, newest first.
fn commits_touching_path(
    repo: &Repository,
    path: &str,
    limit: usize,
) -> Result<Vec<Oid>, ProviderError> {
    if repo.is_empty()? {
        return Ok(Vec::new());
    }

    let mut revwalk = repo.revwalk()?;
    revwalk.set_sorting(Sort::TIME)?;
    revwalk.push_head()?;

    let mut touching = Vec::new();
    for oid in revwalk {
        if touching.len() >= limit {
            break;
        }

        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        if commit_touches_path(repo, &commit, path)? {
            touching.push(oid);
        }
    }

    Ok(touching)
}

fn commit_touches_path(
    repo: &Repository,
    commit: &git2::Commit,
    path: &str,
) -> Result<bool, ProviderError> {
    let tree = commit.tree()?;

    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };

    let mut opts = DiffOptions::new();
    opts.pathspec(path).disable_pathspec_match(true);

    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;

    Ok(diff.deltas().len() > 0)
}

fn commit_record(repo: &Repository, commit_id: &str) -> Result<CommitRecord, ProviderError> {
    let not_found = || ProviderError::NotFound(format!("commit {}", commit_id));
    let oid = Oid::from_str(commit_id).map_err(|_| not_found())?;
    let commit = repo.find_commit(oid).map_err(|_| not_found())?;

    let tree = commit.tree()?;
    let parent_tree = if commit.parent_count() > 0 {
        Some(commit.parent(0)?.tree()?)
    } else {
        None
    };

    let mut opts = DiffOptions::new();
    opts.context_lines(3);

    let diff = repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut opts))?;

    let mut files = Vec::new();
    for (delta_idx, delta) in diff.deltas().enumerate() {
        let path = delta
            .new_file()
            .path()
            .or_else(|| delta.old_file().path())
            .map(|p| p.to_string_lossy().to_string());

        let Some(path) = path else {
            continue;
        };

        // Binary files and mode-only changes produce no hunks.
        let patch = match git2::Patch::from_diff(&diff, delta_idx)? {
            Some(mut patch) if patch.num_hunks() > 0 => {
                let buf = patch.to_buf()?;
                Some(String::from_utf8_lossy(&buf).into_owned())
            }
            _ => None,
        };

        files.push(FilePatch { path, patch });
    }

    let author = commit.author();
    let name = author.name().map(str::to_string);

    Ok(CommitRecord {
        id: commit.id().to_string(),
        author: name.clone().filter(|n| !n.is_empty()),
        author_name: name,
        authored_at: DateTime::from_timestamp(author.when().seconds(), 0),
        files,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::blame::patch_covers_line;
    use git2::{Signature, Time};

    /// Write `contents` to `path` and commit it on HEAD as `author` at `time`.
    pub(crate) fn commit_file(
        repo: &Repository,
        path: &str,
        contents: &str,
        author: &str,
        time: i64,
    ) -> Oid {
        let workdir = repo.workdir().unwrap();
        std::fs::write(workdir.join(path), contents).unwrap();

        let mut index = repo.index().unwrap();
        index.add_path(Path::new(path)).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();

        let email = format!("{}@example.com", author);
        let sig = Signature::new(author, &email, &Time::new(time, 0)).unwrap();
        let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let message = format!("{} edits {}", author, path);
        repo.commit(Some("HEAD"), &sig, &sig, &message, &tree, &parents)
            .unwrap()
    }

    pub(crate) fn numbered_lines(count: usize, replace: Option<(usize, &str)>) -> String {
        (1..=count)
            .map(|i| match replace {
                Some((n, text)) if n == i => format!("{}\n", text),
                _ => format!("line {}\n", i),
            })
            .collect()
    }

    /// alice creates main.go (50 lines), bob rewrites line 5, carol only touches README.md.
    pub(crate) fn fixture_repo() -> (tempfile::TempDir, [Oid; 3]) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        let alice = commit_file(&repo, "main.go", &numbered_lines(50, None), "alice", 1_000);
        let bobs_edit = numbered_lines(50, Some((5, "changed by bob")));
        let bob = commit_file(&repo, "main.go", &bobs_edit, "bob", 2_000);
        let carol = commit_file(&repo, "README.md", "# hotel\n", "carol", 3_000);

        (dir, [alice, bob, carol])
    }

    #[tokio::test]
    async fn test_lists_only_commits_touching_path_newest_first() {
        let (dir, [alice, bob, _carol]) = fixture_repo();
        let provider = LocalGitProvider::open(dir.path(), 100).unwrap();

        let page = provider.list_commits("", "", "main.go", 1).await.unwrap();
        let ids: Vec<_> = page.commits.iter().map(|c| c.id.clone()).collect();
        assert_eq!(ids, vec![bob.to_string(), alice.to_string()]);
        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn test_pages_through_history() {
        let (dir, [alice, bob, _carol]) = fixture_repo();
        let provider = LocalGitProvider::open(dir.path(), 1).unwrap();

        let first = provider.list_commits("", "", "main.go", 1).await.unwrap();
        assert_eq!(first.commits, vec![CommitRef { id: bob.to_string() }]);
        assert_eq!(first.next_page, Some(2));

        let second = provider.list_commits("", "", "main.go", 2).await.unwrap();
        assert_eq!(second.commits, vec![CommitRef { id: alice.to_string() }]);
        assert_eq!(second.next_page, None);

        let beyond = provider.list_commits("", "", "main.go", 3).await.unwrap();
        assert!(beyond.commits.is_empty());
    }

    #[tokio::test]
    async fn test_last_possible_page_is_empty() {
        let (dir, _) = fixture_repo();
        let provider = LocalGitProvider::open(dir.path(), 1).unwrap();

        let page = provider.list_commits("", "", "main.go", u32::MAX).await.unwrap();
        assert!(page.commits.is_empty());
        assert_eq!(page.next_page, None);
    }

    #[tokio::test]
    async fn test_concurrent_calls_do_not_wait_on_each_other() {
        let (dir, [alice, bob, _carol]) = fixture_repo();
        let provider = LocalGitProvider::open(dir.path(), 100).unwrap();

        let alice_sha = alice.to_string();
        let bob_sha = bob.to_string();
        let (listed, first, second) = tokio::join!(
            provider.list_commits("", "", "main.go", 1),
            provider.get_commit("", "", &alice_sha),
            provider.get_commit("", "", &bob_sha),
        );
        assert_eq!(listed.unwrap().commits.len(), 2);
        assert_eq!(first.unwrap().author.as_deref(), Some("alice"));
        assert_eq!(second.unwrap().author.as_deref(), Some("bob"));
    }

    #[tokio::test]
    async fn test_unknown_path_has_no_commits() {
        let (dir, _) = fixture_repo();
        let provider = LocalGitProvider::open(dir.path(), 100).unwrap();

        let page = provider.list_commits("", "", "missing.go", 1).await.unwrap();
        assert!(page.commits.is_empty());
    }

    #[tokio::test]
    async fn test_commit_detail_has_unified_patch() {
        let (dir, [_alice, bob, _carol]) = fixture_repo();
        let provider = LocalGitProvider::open(dir.path(), 100).unwrap();

        let record = provider.get_commit("", "", &bob.to_string()).await.unwrap();
        assert_eq!(record.author.as_deref(), Some("bob"));
        assert_eq!(record.authored_at.unwrap().timestamp(), 2_000);

        let patch = record.file("main.go").unwrap().patch.as_deref().unwrap();
        assert!(patch.contains("+changed by bob"));
        assert!(patch_covers_line(patch, 5).is_some());
        assert!(patch_covers_line(patch, 45).is_none());
    }

    #[tokio::test]
    async fn test_unknown_commit_is_not_found() {
        let (dir, _) = fixture_repo();
        let provider = LocalGitProvider::open(dir.path(), 100).unwrap();

        let err = provider.get_commit("", "", "not-a-sha").await.unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_empty_repository_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        Repository::init(dir.path()).unwrap();
        let provider = LocalGitProvider::open(dir.path(), 100).unwrap();

        let page = provider.list_commits("", "", "main.go", 1).await.unwrap();
        assert!(page.commits.is_empty());
        assert_eq!(page.next_page, None);
    }

    #[test]
    fn test_open_outside_repository_fails() {
        let dir = tempfile::tempdir().unwrap();
        // A fresh temp dir is not inside a repository unless TMPDIR is.
        if Repository::discover(dir.path()).is_err() {
            assert!(matches!(
                LocalGitProvider::open(dir.path(), 100),
                Err(ProviderError::NotFound(_))
            ));
        }
    }
}
