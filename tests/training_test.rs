use image::{ImageBuffer, Rgb};
use pest_advisor::{
    models::ModelArtifact, training::Trainer, DiagnosisPipeline, PestClassifier, PestError,
    TrainingConfig,
};
use std::fs;
use std::path::Path;

const CLASSES: [(&str, [u8; 3]); 3] = [
    ("rice bug", [200, 40, 40]),
    ("Planthopper", [40, 200, 40]),
    ("green leafhopper", [40, 40, 200]),
];

/// 每类10张、分辨率各不相同的纯色加条纹图像
fn build_dataset(root: &Path) {
    for (name, color) in CLASSES {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for i in 0..10u32 {
            let (w, h) = (20 + i * 3, 15 + i * 2);
            let img = ImageBuffer::from_fn(w, h, |x, y| {
                let shade = ((x + y + i) % 5) as u8 * 6;
                Rgb([
                    color[0].saturating_sub(shade),
                    color[1].saturating_sub(shade),
                    color[2].saturating_sub(shade),
                ])
            });
            img.save(dir.join(format!("{:02}.png", i))).unwrap();
        }
    }
    // 无法解码的文件会被跳过
    fs::write(root.join("rice bug").join("notes.txt"), "field notes").unwrap();
}

fn config_for(root: &Path, output: &Path) -> TrainingConfig {
    let mut config = TrainingConfig::new(root, output);
    config.image_size = (12, 12);
    config.split_ratio = 0.8;
    config.seed = 42;
    config
}

#[test]
fn three_class_training_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("dataset");
    build_dataset(&root);
    let output = dir.path().join("model/pest_model.json");

    let (artifact, report) = Trainer::new(config_for(&root, &output)).run().unwrap();

    assert!((0.0..=1.0).contains(&report.metrics.accuracy));
    assert!(report.metrics.measured_accuracy().is_some());
    assert_eq!(report.metrics.skipped_files, 1);
    assert_eq!(report.metrics.train_samples + report.metrics.test_samples, 30);
    assert_eq!(report.metrics.train_samples, 24);

    let mut expected: Vec<String> = CLASSES.iter().map(|(n, _)| n.to_string()).collect();
    expected.sort();
    assert_eq!(artifact.class_names, expected);

    let loaded = ModelArtifact::load(&output).unwrap();
    assert_eq!(loaded.class_names.len(), 3);
    assert_eq!(loaded.class_names, expected);
    assert_eq!(loaded.image_size.as_tuple(), (12, 12));
}

#[test]
fn same_seed_gives_same_accuracy() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("dataset");
    build_dataset(&root);
    let output = dir.path().join("unused.json");

    let (first, first_report) = Trainer::new(config_for(&root, &output)).train().unwrap();
    let (second, second_report) = Trainer::new(config_for(&root, &output)).train().unwrap();

    assert_eq!(first_report.metrics.accuracy, second_report.metrics.accuracy);
    assert_eq!(first.classifier, second.classifier);
    assert!(!output.exists());
}

#[test]
fn trained_model_classifies_training_colors() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("dataset");
    build_dataset(&root);
    let output = dir.path().join("pest_model.json");

    let mut config = config_for(&root, &output);
    config.c = 10.0;
    Trainer::new(config).run().unwrap();

    let pipeline = DiagnosisPipeline::new(PestClassifier::load(&output).unwrap());
    let diagnosis = pipeline
        .diagnose_path(&root.join("rice bug").join("03.png"))
        .unwrap();

    assert_eq!(diagnosis.pest, "Rice Bug");
    assert!(diagnosis.recognized);
    assert!(diagnosis.remedies.windows(2).all(|w| w[0].price <= w[1].price));
    assert!(!diagnosis.soil_effect.is_empty());
}

#[test]
fn full_training_split_leaves_accuracy_unmeasured() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("dataset");
    build_dataset(&root);

    let mut config = config_for(&root, &dir.path().join("unused.json"));
    config.split_ratio = 1.0;
    let (_, report) = Trainer::new(config).train().unwrap();

    assert_eq!(report.metrics.train_samples, 30);
    assert_eq!(report.metrics.test_samples, 0);
    assert_eq!(report.metrics.measured_accuracy(), None);
    assert!(report.elapsed_secs.is_finite() && report.elapsed_secs >= 0.0);
}

#[test]
fn missing_dataset_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nowhere");
    let err = Trainer::new(config_for(&missing, &dir.path().join("m.json")))
        .run()
        .unwrap_err();

    match err {
        PestError::Dataset(msg) => assert!(msg.contains("nowhere")),
        other => panic!("unexpected error: {other:?}"),
    }
}
