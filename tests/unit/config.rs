use super::*;

#[test]
fn empty_object_yields_defaults() {
    let cfg = RenderConfig::from_reader("{}".as_bytes()).unwrap();
    assert_eq!(cfg, RenderConfig::default());
    assert_eq!(cfg.canvas, Canvas::FULL_HD);
    assert_eq!(cfg.encode.crf, 23);
    assert_eq!(cfg.encode.audio_bitrate, "192k");
    assert!(cfg.unique_output_names);
}

#[test]
fn partial_sections_merge_with_defaults() {
    let cfg = RenderConfig::from_reader(
        r#"{ "fps": 25, "encode": { "crf": 18 }, "fonts": { "default_family": "DejaVu Sans" } }"#
            .as_bytes(),
    )
    .unwrap();
    assert_eq!(cfg.fps, 25);
    assert_eq!(cfg.encode.crf, 18);
    assert_eq!(cfg.encode.preset, "medium");
    assert_eq!(cfg.fonts.default_family, "DejaVu Sans");
    assert!(cfg.fonts.load_system_fonts);
}

#[test]
fn validation_catches_bad_values() {
    assert!(RenderConfig::from_reader(r#"{ "fps": 0 }"#.as_bytes()).is_err());
    assert!(
        RenderConfig::from_reader(r#"{ "canvas": { "width": 641, "height": 480 } }"#.as_bytes())
            .is_err()
    );
    assert!(RenderConfig::from_reader(r#"{ "encode": { "crf": 60 } }"#.as_bytes()).is_err());
    assert!(RenderConfig::from_reader(r#"{ "render_threads": 0 }"#.as_bytes()).is_err());
    assert!(RenderConfig::from_reader(r#"{ "encode": { "preset": " " } }"#.as_bytes()).is_err());
}

#[test]
fn scratch_root_defaults_to_temp_dir() {
    let cfg = RenderConfig::default();
    assert!(cfg.scratch_root().starts_with(std::env::temp_dir()));

    let cfg = RenderConfig {
        scratch_dir: Some(PathBuf::from("/var/tmp/jobs")),
        ..RenderConfig::default()
    };
    assert_eq!(cfg.scratch_root(), PathBuf::from("/var/tmp/jobs"));
}
