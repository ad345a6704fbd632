use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        LyricError::invalid_request("x")
            .to_string()
            .contains("invalid request:")
    );
    assert!(
        LyricError::asset_not_found("x")
            .to_string()
            .contains("asset not found:")
    );
    assert!(
        LyricError::assembly("x")
            .to_string()
            .contains("assembly error:")
    );
    assert_eq!(LyricError::Cancelled.to_string(), "render cancelled");
}

#[test]
fn rasterization_carries_verse_index() {
    let err = LyricError::rasterization(3, "no font");
    assert_eq!(err.kind(), ErrorKind::Rasterization);
    assert!(err.to_string().contains("verse 3"));
    assert!(err.to_string().contains("no font"));
}

#[test]
fn kinds_cover_validation_split() {
    assert!(LyricError::invalid_request("x").is_validation());
    assert!(LyricError::asset_not_found("x").is_validation());
    assert!(!LyricError::assembly("x").is_validation());
    assert!(!LyricError::Cancelled.is_validation());
    assert_eq!(LyricError::config("x").kind(), ErrorKind::Internal);
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = LyricError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), ErrorKind::Internal);
}

#[test]
fn strip_roots_rewrites_absolute_dirs_relative() {
    let assets = Path::new("/srv/lyrivid/assets");
    let scratch = Path::new("/srv/lyrivid/assets/tmp");
    let msg = "'/srv/lyrivid/assets/uploads/a.mp3': Invalid data; \
               '/srv/lyrivid/assets/tmp/job-1/frame-0000.png'; dir /srv/lyrivid/assets";
    assert_eq!(
        strip_roots(msg, &[assets, scratch]),
        "'uploads/a.mp3': Invalid data; 'job-1/frame-0000.png'; dir ."
    );
}

#[test]
fn strip_roots_respects_name_boundaries_and_relative_roots() {
    let msg = "/srv/out-old/x.mp4 and out/y.mp4";
    assert_eq!(strip_roots(msg, &[Path::new("/srv/out")]), msg);
    assert_eq!(strip_roots(msg, &[Path::new("out")]), msg);
}

#[test]
fn file_label_keeps_only_the_name() {
    assert_eq!(file_label(Path::new("/a/b/song.mp3")), "song.mp3");
    assert_eq!(file_label(Path::new("/")), "<unnamed>");
}
