// src/pipeline.rs

use crate::analyzer;
use crate::error::{PipelineError, ScanError};
use crate::model::*;
use crate::publisher::Publisher;
use crate::renderer;
use crate::watermark::WatermarkStore;
use std::fs;
use std::path::{Path, PathBuf};

/// Counters reported at the end of a run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub repositories: usize,
    pub skipped: usize,
    pub collages: usize,
    pub publish_failures: usize,
}

/// Drives one pass over every repository under `root`
pub struct Pipeline<'a, P: Publisher> {
    root: PathBuf,
    store: WatermarkStore,
    output: PathBuf,
    publisher: &'a mut P,
}

/// Immediate subdirectories of `root`, sorted by name. The sorted position is
/// what picks the palette color, so it has to be stable between runs. Only
/// directories are counted: plain files in the root such as the watermark
/// document never use up a color, even when they sort before a repository.
pub fn discover_repositories(root: &Path) -> Result<Vec<RepositoryEntry>, PipelineError> {
    let list_err = |source| PipelineError::ListRoot { root: root.to_path_buf(), source };

    let mut entries = Vec::new();
    for entry in fs::read_dir(root).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        entries.push((entry.file_name().to_string_lossy().into_owned(), entry.path()));
    }
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let mut repositories = Vec::new();
    for (name, path) in entries {
        if !path.is_dir() {
            tracing::debug!("{} is not a directory, skipping", path.display());
            continue;
        }
        let index = repositories.len();
        repositories.push(RepositoryEntry { name, path, index });
    }

    Ok(repositories)
}

impl<'a, P: Publisher> Pipeline<'a, P> {
    pub fn new(root: impl Into<PathBuf>, store: WatermarkStore, output: impl Into<PathBuf>, publisher: &'a mut P) -> Self {
        Self { root: root.into(), store, output: output.into(), publisher }
    }

    /// Scans every repository, publishes one collage per author with images,
    /// then persists the new watermarks in a single write.
    pub fn run(&mut self) -> Result<RunSummary, PipelineError> {
        let mut watermarks = self.store.load()?;
        let repositories = discover_repositories(&self.root)?;
        let mut summary = RunSummary::default();
        let mut tips = Watermarks::new();

        for repo in &repositories {
            let color = ColorTag::for_index(repo.index);
            let last = watermarks.get(&repo.name).map(String::as_str);
            tracing::info!("Repo: {}, Color: {}, Last SHA: {}", repo.path.display(), color, last.unwrap_or("N/A"));

            let scan = match analyzer::scan_repository(&repo.path, last) {
                Ok(scan) => scan,
                Err(ScanError::RepositoryInvalid { path, .. }) => {
                    tracing::warn!("{} is not a valid Git repo, skipping...", path.display());
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    tracing::error!("Failed to scan {}: {}", repo.path.display(), e);
                    summary.skipped += 1;
                    continue;
                }
            };
            summary.repositories += 1;
            tracing::debug!("{}: walked {} commits", repo.name, scan.commits_walked);

            if let Some(tip) = scan.tip {
                tips.insert(repo.name.clone(), tip);
            }

            for group in &scan.groups {
                tracing::info!(" - {}: found {} textures", group.author, group.images.len());
                for message in &group.messages {
                    tracing::debug!("   {}", message.lines().next().unwrap_or(""));
                }
                match self.publish_group(repo, color, group) {
                    Ok(()) => summary.collages += 1,
                    Err(e) => {
                        tracing::error!("Error posting collage for {} in {}: {}", group.author, repo.name, e);
                        summary.publish_failures += 1;
                    }
                }
            }
        }

        watermarks.extend(tips);
        self.store.save(&watermarks)?;
        tracing::info!("Saved watermarks for {} repositories to {}", watermarks.len(), self.store.path().display());

        Ok(summary)
    }

    fn publish_group(&mut self, repo: &RepositoryEntry, color: ColorTag, group: &AuthorGroup) -> anyhow::Result<()> {
        let Some(canvas) = renderer::compose(&group.images) else {
            return Ok(());
        };
        canvas.save(&self.output)?;

        let collage = Collage {
            path: self.output.clone(),
            author: group.author.to_string(),
            title: repo.name.to_uppercase(),
            footer: format!("{} Textures", group.images.len()),
            color,
        };
        self.publisher.publish(&collage)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PublishError;
    use crate::test_utils::{Change, TestRepo};
    use crate::watermark::DEFAULT_STATE_FILE;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingPublisher {
        sent: Vec<(Collage, (u32, u32))>,
        fail: bool,
    }

    impl Publisher for RecordingPublisher {
        fn publish(&mut self, collage: &Collage) -> Result<(), PublishError> {
            if self.fail {
                return Err(PublishError::Rejected { status: 404, body: "Unknown Channel".to_string() });
            }
            let dims = image::image_dimensions(&collage.path).unwrap();
            self.sent.push((collage.clone(), dims));
            Ok(())
        }
    }

    struct Workspace {
        root: tempfile::TempDir,
        state: tempfile::TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            Self { root: tempdir().unwrap(), state: tempdir().unwrap() }
        }

        fn store(&self) -> WatermarkStore {
            WatermarkStore::new(self.state.path().join(DEFAULT_STATE_FILE))
        }

        fn run(&self, publisher: &mut RecordingPublisher) -> RunSummary {
            let output = self.state.path().join("thumbnail.png");
            Pipeline::new(self.root.path(), self.store(), output, publisher).run().unwrap()
        }
    }

    #[test]
    fn discovery_sorts_and_skips_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("zeta")).unwrap();
        fs::create_dir(dir.path().join("alpha")).unwrap();
        fs::write(dir.path().join("beta.txt"), "not a repo").unwrap();
        fs::create_dir(dir.path().join("gamma")).unwrap();

        let repos = discover_repositories(dir.path()).unwrap();
        let names: Vec<(&str, usize)> = repos.iter().map(|r| (r.name.as_str(), r.index)).collect();
        assert_eq!(names, vec![("alpha", 0), ("gamma", 1), ("zeta", 2)]);
    }

    #[test]
    fn publishes_one_collage_per_author() {
        let ws = Workspace::new();
        let mut art = TestRepo::init(&ws.root.path().join("art"));
        art.commit("Ada", "grass", &[Change::Png("grass.png", [0, 200, 0, 255])]);
        art.commit("Bob", "stone", &[Change::Png("stone.png", [90, 90, 90, 255])]);
        let tip = art.commit("Ada", "seven tiles", &[
            Change::Png("t1.png", [1, 0, 0, 255]),
            Change::Png("t2.png", [2, 0, 0, 255]),
            Change::Png("t3.png", [3, 0, 0, 255]),
            Change::Png("t4.png", [4, 0, 0, 255]),
            Change::Png("t5.png", [5, 0, 0, 255]),
            Change::Png("t6.png", [6, 0, 0, 255]),
        ]);
        fs::create_dir(ws.root.path().join("plain-folder")).unwrap();

        let mut publisher = RecordingPublisher::default();
        let summary = ws.run(&mut publisher);

        assert_eq!(summary, RunSummary { repositories: 1, skipped: 1, collages: 2, publish_failures: 0 });

        let (ada, ada_dims) = &publisher.sent[0];
        assert_eq!(ada.author, "Ada");
        assert_eq!(ada.title, "ART");
        assert_eq!(ada.footer, "7 Textures");
        assert_eq!(ada.color, ColorTag::for_index(0));
        assert_eq!(*ada_dims, (1760, 608));

        let (bob, bob_dims) = &publisher.sent[1];
        assert_eq!(bob.author, "Bob");
        assert_eq!(bob.footer, "1 Textures");
        assert_eq!(*bob_dims, (1760, 320));

        let saved = ws.store().load().unwrap();
        assert_eq!(saved.get("art"), Some(&tip.to_string()));
        assert!(!saved.contains_key("plain-folder"));
    }

    #[test]
    fn second_run_only_sees_new_commits() {
        let ws = Workspace::new();
        let mut art = TestRepo::init(&ws.root.path().join("art"));
        art.commit("Ada", "grass", &[Change::Png("grass.png", [0, 200, 0, 255])]);

        let mut first = RecordingPublisher::default();
        ws.run(&mut first);
        assert_eq!(first.sent.len(), 1);

        let mut idle = RecordingPublisher::default();
        ws.run(&mut idle);
        assert!(idle.sent.is_empty());

        art.commit("Bob", "stone", &[Change::Png("stone.png", [90, 90, 90, 255])]);
        let mut second = RecordingPublisher::default();
        ws.run(&mut second);
        assert_eq!(second.sent.len(), 1);
        assert_eq!(second.sent[0].0.author, "Bob");
        assert_eq!(second.sent[0].0.footer, "1 Textures");
    }

    #[test]
    fn merge_only_author_gets_no_collage() {
        let ws = Workspace::new();
        let mut art = TestRepo::init(&ws.root.path().join("art"));
        art.commit("Ada", "grass", &[Change::Png("grass.png", [0, 200, 0, 255])]);
        art.commit("Cyd", "Merge branch 'feature'", &[Change::Png("lava.png", [200, 0, 0, 255])]);
        art.commit("Cyd", "update docs", &[Change::Text("README.md", "docs")]);

        let mut publisher = RecordingPublisher::default();
        ws.run(&mut publisher);

        let authors: Vec<&str> = publisher.sent.iter().map(|(c, _)| c.author.as_str()).collect();
        assert_eq!(authors, vec!["Ada"]);
    }

    #[test]
    fn colors_follow_sorted_directory_order() {
        let ws = Workspace::new();
        fs::write(ws.root.path().join("aaa.txt"), "ignored").unwrap();
        for name in ["models", "boards", "sprites"] {
            let mut repo = TestRepo::init(&ws.root.path().join(name));
            repo.commit("Ada", "add", &[Change::Png("a.png", [1, 2, 3, 255])]);
        }

        let mut publisher = RecordingPublisher::default();
        ws.run(&mut publisher);

        let titles: Vec<(&str, ColorTag)> = publisher.sent.iter().map(|(c, _)| (c.title.as_str(), c.color)).collect();
        assert_eq!(
            titles,
            vec![
                ("BOARDS", ColorTag::for_index(0)),
                ("MODELS", ColorTag::for_index(1)),
                ("SPRITES", ColorTag::for_index(2)),
            ]
        );
    }

    #[test]
    fn publish_failures_still_advance_watermarks() {
        let ws = Workspace::new();
        let mut art = TestRepo::init(&ws.root.path().join("art"));
        let tip = art.commit("Ada", "grass", &[Change::Png("grass.png", [0, 200, 0, 255])]);

        let mut publisher = RecordingPublisher { fail: true, ..Default::default() };
        let summary = ws.run(&mut publisher);

        assert_eq!(summary.publish_failures, 1);
        assert_eq!(summary.collages, 0);
        assert_eq!(ws.store().load().unwrap().get("art"), Some(&tip.to_string()));
    }

    #[test]
    fn watermarks_of_vanished_or_invalid_repos_are_kept() {
        let ws = Workspace::new();
        fs::create_dir(ws.root.path().join("broken")).unwrap();

        let mut previous = Watermarks::new();
        previous.insert("broken".to_string(), "a".repeat(40));
        previous.insert("archived".to_string(), "b".repeat(40));
        ws.store().save(&previous).unwrap();

        let mut publisher = RecordingPublisher::default();
        let summary = ws.run(&mut publisher);

        assert_eq!(summary.skipped, 1);
        assert_eq!(ws.store().load().unwrap(), previous);
    }
}
