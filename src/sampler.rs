use crate::error::Error;
use rand::seq::IndexedRandom;
use rand::Rng;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Picks one image from a labeled validation tree, two-stage uniform:
/// first a class directory, then a file inside it.
///
/// Returns `Ok(None)` when the root has no class subdirectories or the
/// chosen class holds no qualifying image. There is no retry against
/// other classes when the chosen one is empty; every class gets equal
/// exposure regardless of how many images it holds.
///
/// A missing or unreadable root is an error, not an absent result.
pub fn sample_image<R: Rng + ?Sized>(
    root: &Path,
    extensions: &[&str],
    rng: &mut R,
) -> Result<Option<PathBuf>, Error> {
    let class_dirs = list_class_dirs(root)?;
    let Some(class_dir) = class_dirs.choose(rng) else {
        return Ok(None);
    };

    let images = list_images(class_dir, extensions)?;
    Ok(images.choose(rng).cloned())
}

/// Immediate subdirectories of `root`. Plain files are not classes.
fn list_class_dirs(root: &Path) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(root).map_err(|source| Error::list_dir(root, source))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::list_dir(root, source))?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}

/// Regular files directly inside `dir` with a qualifying extension.
fn list_images(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, Error> {
    let entries = fs::read_dir(dir).map_err(|source| Error::list_dir(dir, source))?;

    let mut images = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| Error::list_dir(dir, source))?;
        let path = entry.path();
        let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
        if is_file && has_image_extension(&path, extensions) {
            images.push(path);
        }
    }
    Ok(images)
}

fn has_image_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IMAGE_EXTENSIONS;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        File::create(path).unwrap();
    }

    #[test]
    fn missing_root_is_an_error() {
        let dir = tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let result = sample_image(&dir.path().join("nope"), &IMAGE_EXTENSIONS, &mut rng);

        match result {
            Err(Error::ListDir { source, .. }) => {
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected ListDir error, got {other:?}"),
        }
    }

    #[test]
    fn empty_root_yields_none() {
        let dir = tempdir().unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        let picked = sample_image(dir.path(), &IMAGE_EXTENSIONS, &mut rng).unwrap();

        assert!(picked.is_none());
    }

    #[test]
    fn plain_files_in_root_are_not_classes() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("stray.jpg"));
        let mut rng = StdRng::seed_from_u64(3);

        let picked = sample_image(dir.path(), &IMAGE_EXTENSIONS, &mut rng).unwrap();

        assert!(picked.is_none());
    }

    #[test]
    fn all_classes_empty_yields_none() {
        let dir = tempdir().unwrap();
        std::fs::create_dir(dir.path().join("rock")).unwrap();
        std::fs::create_dir(dir.path().join("paper")).unwrap();
        touch(&dir.path().join("rock").join("notes.txt"));
        let mut rng = StdRng::seed_from_u64(4);

        for _ in 0..100 {
            let picked = sample_image(dir.path(), &IMAGE_EXTENSIONS, &mut rng).unwrap();
            assert!(picked.is_none());
        }
    }

    #[test]
    fn picked_path_exists_under_root_with_valid_extension() {
        let dir = tempdir().unwrap();
        let class = dir.path().join("rock");
        std::fs::create_dir(&class).unwrap();
        touch(&class.join("a.jpg"));
        touch(&class.join("B.PNG"));
        touch(&class.join("c.JpEg"));
        let mut rng = StdRng::seed_from_u64(5);

        for _ in 0..50 {
            let picked = sample_image(dir.path(), &IMAGE_EXTENSIONS, &mut rng)
                .unwrap()
                .expect("class has images");
            assert!(picked.exists());
            assert!(picked.starts_with(dir.path()));
            let ext = picked.extension().unwrap().to_str().unwrap().to_lowercase();
            assert!(IMAGE_EXTENSIONS.contains(&ext.as_str()));
        }
    }

    #[test]
    fn non_image_files_are_never_picked() {
        let dir = tempdir().unwrap();
        let class = dir.path().join("rock");
        std::fs::create_dir(&class).unwrap();
        touch(&class.join("a.jpg"));
        touch(&class.join("labels.txt"));
        touch(&class.join("archive.gif"));
        let mut rng = StdRng::seed_from_u64(6);

        for _ in 0..200 {
            let picked = sample_image(dir.path(), &IMAGE_EXTENSIONS, &mut rng)
                .unwrap()
                .unwrap();
            assert_eq!(picked.file_name().unwrap(), "a.jpg");
        }
    }

    // Scenario: rock has 2 images, paper none, scissors 1. The empty class
    // is chosen a third of the time and yields an absent result; among the
    // hits the class split is ~50/50, not weighted by image count.
    #[test]
    fn empty_class_absorbs_its_share_and_split_is_per_class() {
        let dir = tempdir().unwrap();
        let rock = dir.path().join("rock");
        let paper = dir.path().join("paper");
        let scissors = dir.path().join("scissors");
        for d in [&rock, &paper, &scissors] {
            std::fs::create_dir(d).unwrap();
        }
        touch(&rock.join("a.jpg"));
        touch(&rock.join("b.png"));
        touch(&scissors.join("c.jpeg"));

        let mut rng = StdRng::seed_from_u64(7);
        let trials = 10_000;
        let mut absent = 0;
        let mut rock_hits = 0;
        let mut scissors_hits = 0;

        for _ in 0..trials {
            match sample_image(dir.path(), &IMAGE_EXTENSIONS, &mut rng).unwrap() {
                None => absent += 1,
                Some(path) => {
                    assert!(!path.starts_with(&paper), "picked from empty class");
                    if path.starts_with(&rock) {
                        rock_hits += 1;
                    } else if path.starts_with(&scissors) {
                        scissors_hits += 1;
                    } else {
                        panic!("path outside the validation tree: {path:?}");
                    }
                }
            }
        }

        let absent_rate = absent as f64 / trials as f64;
        assert!(
            (absent_rate - 1.0 / 3.0).abs() < 0.03,
            "absent rate {absent_rate} far from 1/3"
        );

        let hits = (rock_hits + scissors_hits) as f64;
        let rock_share = rock_hits as f64 / hits;
        assert!(
            (rock_share - 0.5).abs() < 0.03,
            "rock share {rock_share} far from 0.5 despite having twice the images"
        );
    }

    #[test]
    fn every_image_is_reachable() {
        let dir = tempdir().unwrap();
        for class in ["rock", "paper"] {
            let class_dir = dir.path().join(class);
            std::fs::create_dir(&class_dir).unwrap();
            touch(&class_dir.join("one.jpg"));
            touch(&class_dir.join("two.png"));
        }

        let mut rng = StdRng::seed_from_u64(8);
        let mut counts: HashMap<PathBuf, u32> = HashMap::new();
        for _ in 0..8_000 {
            let picked = sample_image(dir.path(), &IMAGE_EXTENSIONS, &mut rng)
                .unwrap()
                .unwrap();
            *counts.entry(picked).or_default() += 1;
        }

        assert_eq!(counts.len(), 4, "some image was never selected");
        for (path, count) in &counts {
            let share = *count as f64 / 8_000.0;
            assert!(
                share > 0.15,
                "image {path:?} selected in only {share} of trials"
            );
        }
    }
}
