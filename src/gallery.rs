//! Per-cluster image galleries
//!
//! After a clustering run, each cluster is rendered as a montage of the face
//! images assigned to it, one PNG per cluster. Flicking through the montages
//! is the quickest sanity check on whether clusters correspond to
//! identities. Rendering is fire-and-forget: nothing feeds back into the
//! pipeline.
use std::path::{Path, PathBuf};

use image::GrayImage;
use log::info;
use ndarray::{ArrayBase, Data, Ix1};

use crate::dataset::{FaceDataset, Float};
use crate::error::{Error, Result};
use crate::metrics_clustering::group_by_cluster;

/// Renders cluster montages into a directory
pub struct GalleryRenderer {
    columns: usize,
}

impl Default for GalleryRenderer {
    fn default() -> Self {
        GalleryRenderer { columns: 8 }
    }
}

impl GalleryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Change the maximum number of images per montage row
    pub fn columns(mut self, columns: usize) -> Self {
        self.columns = columns;
        self
    }

    /// Write one montage per non-empty cluster into `out_dir`, named
    /// `cluster_<id>.png`, and return the written paths in cluster order.
    ///
    /// `predicted` must assign a cluster to every sample of `dataset`. The
    /// identity of every rendered face is logged alongside its cluster, as
    /// the montages themselves carry no captions.
    pub fn render<F: Float, D: Data<Elem = usize>>(
        &self,
        dataset: &FaceDataset<F>,
        predicted: &ArrayBase<D, Ix1>,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>> {
        if predicted.len() != dataset.nsamples() {
            return Err(Error::ShapeMismatch {
                expected: dataset.nsamples(),
                actual: predicted.len(),
            });
        }
        if self.columns == 0 {
            return Err(Error::Parameters("columns cannot be 0".into()));
        }

        let n_clusters = predicted.iter().max().map(|&m| m + 1).unwrap_or(0);
        let buckets = group_by_cluster(predicted, n_clusters)?;

        std::fs::create_dir_all(out_dir)?;

        let (h, w) = dataset.image_shape();
        let mut written = Vec::with_capacity(buckets.len());

        for (cluster, indices) in buckets {
            let columns = self.columns.min(indices.len());
            let rows = (indices.len() + columns - 1) / columns;

            let mut montage = GrayImage::new((columns * w) as u32, (rows * h) as u32);
            for (slot, &idx) in indices.iter().enumerate() {
                let (tile_row, tile_col) = (slot / columns, slot % columns);
                let face = dataset.image(idx);
                for r in 0..h {
                    for c in 0..w {
                        let value: f64 = face[(r, c)].as_();
                        let pixel = (value.max(0.).min(1.) * 255.) as u8;
                        montage.put_pixel(
                            (tile_col * w + c) as u32,
                            (tile_row * h + r) as u32,
                            image::Luma([pixel]),
                        );
                    }
                }
            }

            let names = indices
                .iter()
                .map(|&idx| dataset.target_names()[dataset.targets()[idx]].as_str())
                .collect::<Vec<_>>();
            info!("cluster {}: {}", cluster, names.join(", "));

            let path = out_dir.join(format!("cluster_{:02}.png", cluster));
            montage.save(&path)?;
            written.push(path);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array};

    fn tiny_dataset() -> FaceDataset<f32> {
        let records = Array::from_elem((5, 6), 0.5);
        let targets = array![0, 1, 0, 1, 0];
        FaceDataset::new(
            records,
            targets,
            vec!["ada".into(), "grace".into()],
            (2, 3),
        )
        .unwrap()
    }

    fn out_dir(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("visage-gallery-{}-{}", tag, std::process::id()))
    }

    #[test]
    fn writes_one_montage_per_cluster() {
        let dataset = tiny_dataset();
        let predicted = array![0usize, 1, 0, 1, 0];
        let dir = out_dir("per-cluster");

        let written = GalleryRenderer::new()
            .render(&dataset, &predicted, &dir)
            .unwrap();

        assert_eq!(written.len(), 2);
        // cluster 0 holds three 2x3 faces in a single row
        let montage = image::open(&written[0]).unwrap().into_luma8();
        assert_eq!(montage.dimensions(), (9, 2));
        // cluster 1 holds two
        let montage = image::open(&written[1]).unwrap().into_luma8();
        assert_eq!(montage.dimensions(), (6, 2));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn columns_bound_wraps_rows() {
        let dataset = tiny_dataset();
        let predicted = array![0usize, 0, 0, 0, 0];
        let dir = out_dir("wrap");

        let written = GalleryRenderer::new()
            .columns(2)
            .render(&dataset, &predicted, &dir)
            .unwrap();

        // five faces at two per row -> three rows
        let montage = image::open(&written[0]).unwrap().into_luma8();
        assert_eq!(montage.dimensions(), (6, 6));

        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn misaligned_prediction_fails() {
        let dataset = tiny_dataset();
        let predicted = array![0usize, 1];

        let res = GalleryRenderer::new().render(&dataset, &predicted, Path::new("unused"));
        assert!(matches!(res, Err(Error::ShapeMismatch { .. })));
    }
}
