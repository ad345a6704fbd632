use super::*;
use serde_json::json;

fn request_json() -> serde_json::Value {
    json!({
        "projectName": "Meu Projeto! #1",
        "audioPath": "/uploads/audio/song.mp3",
        "backgroundPath": "",
        "verses": [
            { "id": "v1", "text": "Hello", "startTime": "00:00", "endTime": "00:03" },
            { "id": "v2", "text": "World", "startTime": 3, "endTime": 6 }
        ]
    })
}

#[test]
fn parses_request_with_defaults() {
    let req: RenderRequest = serde_json::from_value(request_json()).unwrap();
    assert_eq!(req.background_color, Rgba8::BLACK);
    assert_eq!(req.audio_type, "original");
    assert_eq!(req.background(), None);
    assert_eq!(req.last_end_time(), 6.0);
    assert!(req.validate().is_ok());
}

#[test]
fn validate_requires_name_audio_and_verses() {
    let mut req: RenderRequest = serde_json::from_value(request_json()).unwrap();
    req.project_name = "  ".to_owned();
    assert!(matches!(req.validate(), Err(LyricError::InvalidRequest(_))));

    let mut req: RenderRequest = serde_json::from_value(request_json()).unwrap();
    req.audio_path.clear();
    assert!(req.validate().is_err());

    let mut req: RenderRequest = serde_json::from_value(request_json()).unwrap();
    req.verses.clear();
    assert!(req.validate().is_err());
}

#[test]
fn validate_rejects_duplicate_verse_ids() {
    let mut req: RenderRequest = serde_json::from_value(request_json()).unwrap();
    req.verses[1].id = "v1".to_owned();
    let err = req.validate().unwrap_err();
    assert!(err.to_string().contains("duplicate verse id"));
}

#[test]
fn sanitize_is_stable_and_filesystem_safe() {
    let once = sanitize_filename("Meu Projeto! #1");
    assert_eq!(once, "meu-projeto-1");
    assert_eq!(sanitize_filename(&once), once);
    assert_eq!(sanitize_filename("Meu Projeto! #1"), once);
    assert!(
        once.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    );
}

#[test]
fn sanitize_keeps_accents_and_handles_empty() {
    assert_eq!(sanitize_filename("Canção  Ação"), "canção-ação");
    assert_eq!(sanitize_filename("../../etc/passwd"), "etcpasswd");
    assert_eq!(sanitize_filename("!!!"), "untitled");
    assert_eq!(sanitize_filename("  Trailing  "), "trailing");
}
