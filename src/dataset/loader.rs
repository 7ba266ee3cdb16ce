//! Loader for directory-tree face archives
//!
//! An archive is a directory with one subdirectory per person, each holding
//! that person's face images (the layout used by the LFW distribution):
//!
//! ```text
//! archive/
//!   Ada_Lovelace/
//!     Ada_Lovelace_0001.jpg
//!     Ada_Lovelace_0002.jpg
//!   Grace_Hopper/
//!     ...
//! ```
//!
//! Images are decoded with the `image` crate, converted to grayscale and
//! scaled into `[0, 1]`. Whatever caching happens on disk is the archive
//! itself; nothing else is persisted.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use ndarray::{Array1, Array2};

use crate::dataset::FaceDataset;
use crate::error::{Error, Result};

const IMAGE_EXTENSIONS: &[&str] = &["bmp", "jpeg", "jpg", "pgm", "png"];

/// Load a face archive, keeping only identities with at least
/// `min_faces_per_person` images.
///
/// Identities are labeled `0..n_classes` in lexicographic order of their
/// directory names and images are visited in sorted order, so repeated loads
/// of the same archive produce identical datasets.
pub fn load_faces<P: AsRef<Path>>(root: P, min_faces_per_person: usize) -> Result<FaceDataset<f32>> {
    let root = root.as_ref();

    let mut by_person: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().into_owned();
        let mut files = fs::read_dir(entry.path())?
            .collect::<std::io::Result<Vec<_>>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| has_image_extension(p))
            .collect::<Vec<_>>();
        files.sort();

        if files.len() >= min_faces_per_person {
            debug!("keeping {} with {} images", name, files.len());
            by_person.insert(name, files);
        } else {
            debug!(
                "dropping {}: {} images below threshold {}",
                name,
                files.len(),
                min_faces_per_person
            );
        }
    }

    let mut target_names = Vec::with_capacity(by_person.len());
    let mut targets = Vec::new();
    let mut pixels = Vec::new();
    let mut shape: Option<(usize, usize)> = None;

    for (label, (name, files)) in by_person.into_iter().enumerate() {
        info!("loading {} images of {}", files.len(), name);
        target_names.push(name);

        for path in files {
            let img = image::open(&path)?.into_luma8();
            let (w, h) = img.dimensions();
            let dims = (h as usize, w as usize);

            match shape {
                None => shape = Some(dims),
                Some(expected) if expected != dims => {
                    return Err(Error::ImageShape {
                        expected,
                        actual: dims,
                    })
                }
                Some(_) => {}
            }

            // GrayImage pixels iterate row-major, matching the flattened
            // row layout of the dataset
            pixels.extend(img.pixels().map(|p| f32::from(p.0[0]) / 255.));
            targets.push(label);
        }
    }

    let (h, w) = shape.ok_or(Error::EmptyDataset)?;
    let records = Array2::from_shape_vec((targets.len(), h * w), pixels)?;

    info!(
        "loaded {} samples of {} identities at {}x{}",
        records.nrows(),
        target_names.len(),
        h,
        w
    );

    FaceDataset::new(records, Array1::from(targets), target_names, (h, w))
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma};

    fn write_archive(tag: &str, persons: &[(&str, usize)], (h, w): (u32, u32)) -> PathBuf {
        let root = std::env::temp_dir().join(format!("visage-{}-{}", tag, std::process::id()));

        for (name, count) in persons {
            let dir = root.join(name);
            fs::create_dir_all(&dir).unwrap();
            for i in 0..*count {
                let img = GrayImage::from_pixel(w, h, Luma([128]));
                img.save(dir.join(format!("{}_{:04}.png", name, i))).unwrap();
            }
        }

        root
    }

    #[test]
    fn loads_lfw_style_tree() {
        let root = write_archive("tree", &[("ada", 3), ("grace", 2)], (4, 5));

        let ds = load_faces(&root, 2).unwrap();
        assert_eq!(ds.nsamples(), 5);
        assert_eq!(ds.nfeatures(), 20);
        assert_eq!(ds.n_classes(), 2);
        assert_eq!(ds.image_shape(), (4, 5));
        // lexicographic labeling
        assert_eq!(ds.target_names(), &["ada".to_string(), "grace".to_string()]);
        assert_eq!(ds.label_counts(), vec![3, 2]);
        // pixels scaled into [0, 1]
        assert!((ds.records()[(0, 0)] - 128. / 255.).abs() < 1e-6);

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn threshold_filters_identities() {
        let root = write_archive("threshold", &[("one", 4), ("two", 1)], (3, 3));

        let ds = load_faces(&root, 2).unwrap();
        assert_eq!(ds.n_classes(), 1);
        assert_eq!(ds.nsamples(), 4);

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn empty_archive_fails() {
        let root = std::env::temp_dir().join(format!("visage-empty-{}", std::process::id()));
        fs::create_dir_all(&root).unwrap();

        assert!(matches!(load_faces(&root, 1), Err(Error::EmptyDataset)));

        fs::remove_dir_all(root).unwrap();
    }

    #[test]
    fn missing_archive_fails() {
        let res = load_faces("/definitely/not/an/archive", 1);
        assert!(matches!(res, Err(Error::Io(_))));
    }
}
