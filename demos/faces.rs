use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

use ndarray::Array1;
use ndarray_rand::rand::SeedableRng;
use rand_isaac::Isaac64Rng;

use visage::agglomerative::{Agglomerative, Method};
use visage::gallery::GalleryRenderer;
use visage::kmeans::KMeans;
use visage::metrics::group_by_cluster;
use visage::prelude::*;
use visage::preprocessing::Canny;

// The full face-clustering experiment: K-means and agglomerative clustering
// on raw pixels, then K-means again on Canny edge maps, with agreement
// scores, confusion matrices and per-cluster galleries along the way.
fn main() -> Result<()> {
    env_logger::init();

    let root = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/faces"));

    let faces = load_faces(&root, 70)?;
    let (h, w) = faces.image_shape();
    let n_classes = faces.n_classes();

    println!("Total dataset size:");
    println!("n_samples: {}", faces.nsamples());
    println!("n_features: {} ({}x{} pixels)", faces.nfeatures(), h, w);
    println!("n_classes: {}", n_classes);

    let mut rng = Isaac64Rng::seed_from_u64(42);

    println!("\n== K-means on raw pixels ==");
    let (train, test) = faces.clone().shuffle(&mut rng).split_with_ratio(0.75);
    let predicted = kmeans_run(&train, &test, n_classes, &mut rng)?;
    evaluate(&predicted, &test)?;

    println!("\n== Agglomerative clustering on raw pixels ==");
    for method in &[Method::Ward, Method::Average, Method::Complete] {
        println!("linkage {:?}", method);
        let predicted = Agglomerative::default()
            .with_method(*method)
            .num_clusters(n_classes)
            .transform(test.records())?;
        evaluate(&predicted, &test)?;
    }

    println!("\n== K-means on edge maps ==");
    println!("preprocessing with Canny edge detection, sigma 3");
    let canny = Canny::params().sigma(3.).check()?;
    let edged = canny.transform_dataset(&faces)?;

    let (train, test) = edged.shuffle(&mut rng).split_with_ratio(0.75);
    let predicted = kmeans_run(&train, &test, n_classes, &mut rng)?;
    evaluate(&predicted, &test)?;

    let galleries = GalleryRenderer::new().render(&test, &predicted, Path::new("galleries"))?;
    println!("wrote {} cluster galleries to galleries/", galleries.len());

    Ok(())
}

/// Fit on the training records, assign the test records.
fn kmeans_run(
    train: &FaceDataset<f32>,
    test: &FaceDataset<f32>,
    n_clusters: usize,
    rng: &mut Isaac64Rng,
) -> Result<Array1<usize>> {
    println!("fitting K-means with {} clusters", n_clusters);
    let start = Instant::now();
    let model = KMeans::params_with_rng(n_clusters, rng.clone())
        .n_runs(30)
        .fit(train.records())?;
    println!("done in {:.3}s", start.elapsed().as_secs_f64());

    Ok(model.predict(test.records()))
}

fn evaluate(predicted: &Array1<usize>, test: &FaceDataset<f32>) -> Result<()> {
    let n_clusters = predicted.iter().max().map(|&m| m + 1).unwrap_or(0);
    let buckets = group_by_cluster(predicted, n_clusters)?;
    let labels = buckets.keys().copied().collect::<Vec<_>>();
    println!("cluster labels: {:?}", labels);
    let counts = buckets
        .into_iter()
        .map(|(id, members)| (id, members.len()))
        .collect::<Vec<_>>();
    println!("points per cluster: {:?}", counts);

    let report = predicted.agreement(test.targets())?;
    println!("homogeneity score = {}", report.homogeneity);
    println!("v-measure score = {}", report.v_measure);

    let confusion = predicted.confusion_matrix(test.targets());
    print_class_report(&confusion, test.target_names());
    println!("{:?}", confusion);

    Ok(())
}

fn print_class_report(confusion: &visage::metrics::ConfusionMatrix<usize>, names: &[String]) {
    let precision = confusion.precision();
    let recall = confusion.recall();
    let f1 = confusion.f1_score();

    println!("{:>24} {:>10} {:>10} {:>10}", "", "precision", "recall", "f1-score");
    for (i, &member) in confusion.members().iter().enumerate() {
        let name = names.get(member).map(|n| n.as_str()).unwrap_or("?");
        println!(
            "{:>24} {:>10.2} {:>10.2} {:>10.2}",
            name, precision[i], recall[i], f1[i]
        );
    }
    println!("accuracy: {:.2}", confusion.accuracy());
}
