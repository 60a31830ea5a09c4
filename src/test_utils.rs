// src/test_utils.rs

use git2::{IndexAddOption, Oid, Repository, Signature, Time};
use image::{Rgba, RgbaImage};
use std::fs;
use std::path::Path;

/// A file operation applied to the working tree before committing
pub enum Change<'a> {
    Png(&'a str, [u8; 4]),
    Text(&'a str, &'a str),
    Delete(&'a str),
}

/// Scratch repository whose commits get strictly increasing timestamps, so
/// time-sorted walks are deterministic.
pub struct TestRepo {
    pub repo: Repository,
    clock: i64,
}

impl TestRepo {
    pub fn init(path: &Path) -> Self {
        let repo = Repository::init(path).unwrap();
        Self { repo, clock: 1_700_000_000 }
    }

    pub fn commit(&mut self, author: &str, message: &str, changes: &[Change]) -> Oid {
        let root = self.repo.workdir().unwrap().to_path_buf();
        for change in changes {
            match change {
                Change::Png(rel, color) => {
                    let path = root.join(rel);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    RgbaImage::from_pixel(8, 8, Rgba(*color)).save(&path).unwrap();
                }
                Change::Text(rel, body) => {
                    let path = root.join(rel);
                    fs::create_dir_all(path.parent().unwrap()).unwrap();
                    fs::write(path, body).unwrap();
                }
                Change::Delete(rel) => fs::remove_file(root.join(rel)).unwrap(),
            }
        }

        let mut index = self.repo.index().unwrap();
        index.add_all(["*"], IndexAddOption::DEFAULT, None).unwrap();
        index.update_all(["*"], None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = self.repo.find_tree(tree_id).unwrap();

        self.clock += 60;
        let email = format!("{}@example.com", author.to_lowercase());
        let sig = Signature::new(author, &email, &Time::new(self.clock, 0)).unwrap();

        let parent = self.repo.head().ok().and_then(|head| head.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        self.repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).unwrap()
    }
}
