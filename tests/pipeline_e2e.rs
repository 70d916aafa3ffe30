use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use imprint::{BatchOpts, BatchSpec, FixedContent, Registry, TextSpec, VariationStep, run_batch};

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target").join("pipeline_e2e").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn source_image() -> RgbaImage {
    let mut img = RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]));
    img.put_pixel(2, 2, Rgba([240, 240, 240, 255]));
    img
}

fn write_source(dir: &Path) -> PathBuf {
    let path = dir.join("source.png");
    source_image().save(&path).unwrap();
    path
}

fn spec_for(dir: &Path, prefix: &str) -> BatchSpec {
    BatchSpec {
        source_img: write_source(dir).to_string_lossy().into_owned(),
        out_folder: dir.join("out").to_string_lossy().into_owned(),
        out_file_prefix: prefix.to_string(),
        ..BatchSpec::default()
    }
}

fn compile(doc: serde_json::Value) -> Vec<imprint::CompiledStep> {
    let steps: Vec<VariationStep> = serde_json::from_value(doc).unwrap();
    Registry::new().compile_batch(&steps).unwrap()
}

fn load(path: &Path) -> RgbaImage {
    image::open(path).unwrap().to_rgba8()
}

#[test]
fn baseline_run_writes_one_copy_per_index() {
    let dir = scratch("baseline");
    let spec = spec_for(&dir, "base");

    let stats = run_batch(
        &spec,
        &[],
        BatchOpts {
            count: 3,
            seed: Some(7),
        },
    )
    .unwrap();
    assert_eq!(stats.indices, 3);
    assert_eq!(stats.files_written, 3);

    let original = source_image();
    for index in 0..3 {
        let path = Path::new(&spec.out_folder).join(format!("base-{index:05}-.png"));
        assert!(path.exists(), "missing {}", path.display());
        assert_eq!(load(&path), original);
    }
}

#[test]
fn each_step_adds_one_file_per_index() {
    let dir = scratch("rotate");
    let spec = spec_for(&dir, "img");
    let steps = compile(serde_json::json!([
        {"Type": "rotate", "Details": {"Degrees": 90.0}}
    ]));

    let stats = run_batch(
        &spec,
        &steps,
        BatchOpts {
            count: 2,
            seed: Some(1),
        },
    )
    .unwrap();
    assert_eq!(stats.files_written, 4);

    for index in 0..2 {
        let baseline = Path::new(&spec.out_folder).join(format!("img-{index:05}-.png"));
        let rotated = Path::new(&spec.out_folder).join(format!("img-{index:05}-rotate-90.png"));
        assert!(baseline.exists());
        assert!(rotated.exists());

        let baseline = load(&baseline);
        let rotated = load(&rotated);
        assert_eq!(rotated.dimensions(), baseline.dimensions());
        assert_ne!(rotated, baseline);
    }
}

#[test]
fn steps_apply_to_the_base_image_not_each_other() {
    let dir = scratch("independent");
    let spec = spec_for(&dir, "img");
    let steps = compile(serde_json::json!([
        {"Type": "invert", "Suffix": "a"},
        {"Type": "invert", "Suffix": "b"}
    ]));

    run_batch(
        &spec,
        &steps,
        BatchOpts {
            count: 1,
            seed: Some(5),
        },
    )
    .unwrap();

    let out = Path::new(&spec.out_folder);
    let baseline = load(&out.join("img-00000-.png"));
    let a = load(&out.join("img-00000-a.png"));
    let b = load(&out.join("img-00000-b.png"));
    assert_eq!(a, b);
    assert_ne!(a, baseline);
}

#[test]
fn ignored_texts_never_touch_the_font() {
    let dir = scratch("ignored");
    let mut spec = spec_for(&dir, "quiet");
    spec.font_path = dir.join("missing.ttf").to_string_lossy().into_owned();
    spec.font_size = 12.0;
    spec.texts = vec![TextSpec {
        content_type: "fixed".to_string(),
        fixed: Some(FixedContent {
            content: "never drawn".to_string(),
        }),
        ignore: true,
        ..TextSpec::default()
    }];

    let stats = run_batch(
        &spec,
        &[],
        BatchOpts {
            count: 1,
            seed: Some(2),
        },
    )
    .unwrap();
    assert_eq!(stats.files_written, 1);
}

#[test]
fn missing_source_image_is_fatal() {
    let dir = scratch("missing_source");
    let mut spec = spec_for(&dir, "img");
    spec.source_img = dir.join("nowhere.png").to_string_lossy().into_owned();

    let err = run_batch(&spec, &[], BatchOpts::default()).unwrap_err();
    assert!(err.to_string().contains("nowhere.png"));
}

#[test]
fn combine_writes_the_chained_result_under_one_suffix() {
    let dir = scratch("combine");
    let spec = spec_for(&dir, "img");
    let steps = compile(serde_json::json!([
        {"Type": "combine", "Details": [{"Type": "flipH"}, {"Type": "flipV"}]}
    ]));

    run_batch(
        &spec,
        &steps,
        BatchOpts {
            count: 1,
            seed: Some(3),
        },
    )
    .unwrap();

    let out = Path::new(&spec.out_folder);
    let combined = load(&out.join("img-00000-combine.png"));
    let expected = imprint::filters::flip_v(&imprint::filters::flip_h(&source_image()));
    assert_eq!(combined, expected);
}
