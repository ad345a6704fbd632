use super::*;
use serde_json::json;

#[test]
fn deserializes_editor_json_with_partial_style() {
    let v: Verse = serde_json::from_value(json!({
        "id": "verse-1",
        "text": "Hello\r\nWorld",
        "startTime": "00:02",
        "endTime": 6,
        "style": { "fontSize": 52, "align": "right", "transition": { "type": "fade", "duration": 1 } }
    }))
    .unwrap();

    assert_eq!(v.start_time, 2.0);
    assert_eq!(v.end_time, 6.0);
    assert_eq!(v.lines(), vec!["Hello", "World"]);
    assert_eq!(v.style.font_size, 52);
    assert_eq!(v.style.align, Align::Right);
    assert_eq!(v.style.font_family, "Montserrat");
    assert_eq!(v.style.transition.fade_duration(), 1.0);
    assert!(v.validate(0).is_ok());
}

#[test]
fn unknown_transition_kind_renders_as_cut() {
    let t: Transition = serde_json::from_value(json!({ "type": "slide", "duration": 2 })).unwrap();
    assert_eq!(t.kind, TransitionKind::Other("slide".to_owned()));
    assert_eq!(t.fade_duration(), 0.0);
    assert_eq!(serde_json::to_value(&t).unwrap()["type"], json!("slide"));
}

#[test]
fn validate_rejects_inverted_window_and_bad_style() {
    let mut v = Verse {
        id: "a".to_owned(),
        text: "x".to_owned(),
        start_time: 5.0,
        end_time: 4.0,
        style: VerseStyle::default(),
    };
    assert!(matches!(v.validate(2), Err(LyricError::InvalidRequest(m)) if m.contains("verse 2")));

    v.end_time = 6.0;
    v.style.font_size = 0;
    assert!(v.validate(0).is_err());

    v.style.font_size = 10;
    v.style.stroke_width = -1.0;
    assert!(v.validate(0).is_err());
}

#[test]
fn blank_text_is_detected() {
    let v = Verse {
        id: "a".to_owned(),
        text: " \n ".to_owned(),
        start_time: 0.0,
        end_time: 0.0,
        style: VerseStyle::default(),
    };
    assert!(v.is_blank());
    assert_eq!(v.duration(), 0.0);
}
