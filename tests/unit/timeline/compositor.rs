use super::*;

fn cue(index: usize, start: f64, end: f64, fade: f64) -> Cue {
    Cue {
        index,
        start,
        end,
        fade,
    }
}

#[test]
fn later_start_wins_overlap() {
    let tl = Timeline::from_cues(vec![cue(0, 0.0, 10.0, 0.0), cue(1, 5.0, 15.0, 0.0)], 0.0);
    assert_eq!(tl.frame_at(7.0).map(|s| s.index), Some(1));
    assert_eq!(tl.frame_at(3.0).map(|s| s.index), Some(0));
    assert_eq!(tl.frame_at(12.0).map(|s| s.index), Some(1));
    assert_eq!(tl.total_duration(), 15.0);
}

#[test]
fn list_order_breaks_start_ties() {
    let tl = Timeline::from_cues(vec![cue(0, 1.0, 4.0, 0.0), cue(1, 1.0, 2.0, 0.0)], 0.0);
    assert_eq!(tl.frame_at(1.5).map(|s| s.index), Some(1));
    // The later entry ended, the earlier one is still on screen.
    assert_eq!(tl.frame_at(3.0).map(|s| s.index), Some(0));
}

#[test]
fn unsorted_input_is_scheduled_by_start() {
    let tl = Timeline::from_cues(vec![cue(0, 5.0, 15.0, 0.0), cue(1, 0.0, 10.0, 0.0)], 0.0);
    assert_eq!(tl.cues()[0].index, 1);
    assert_eq!(tl.frame_at(7.0).map(|s| s.index), Some(0));
}

#[test]
fn fade_envelope_hits_expected_points() {
    let c = cue(0, 2.0, 6.0, 0.5);
    assert_eq!(c.opacity_at(2.0), 0.0);
    assert_eq!(c.opacity_at(2.5), 1.0);
    assert_eq!(c.opacity_at(5.5), 1.0);
    assert_eq!(c.opacity_at(6.0), 0.0);

    let mut prev = 0.0;
    for i in 0..=50 {
        let t = 2.0 + 0.5 * f64::from(i) / 50.0;
        let a = c.opacity_at(t);
        assert!(a >= prev);
        prev = a;
    }
    for i in 0..=50 {
        let t = 5.5 + 0.5 * f64::from(i) / 50.0;
        let a = c.opacity_at(t);
        assert!(a <= prev);
        prev = a;
    }
}

#[test]
fn ramps_shrink_to_half_the_window() {
    let c = cue(0, 0.0, 1.0, 2.0);
    assert_eq!(c.ramp(), 0.5);
    assert_eq!(c.opacity_at(0.5), 1.0);
    assert_eq!(c.opacity_at(0.25), 0.5);
}

#[test]
fn hard_cut_is_fully_opaque_inside_window() {
    let tl = Timeline::from_cues(vec![cue(0, 1.0, 2.0, 0.0)], 3.0);
    assert_eq!(tl.frame_at(0.5), None);
    assert_eq!(
        tl.frame_at(1.0),
        Some(OverlaySample {
            index: 0,
            alpha: 1.0
        })
    );
    assert_eq!(tl.frame_at(2.0), None);
    assert_eq!(tl.frame_at(3.0), None);
}

#[test]
fn at_most_one_verse_is_visible() {
    let tl = Timeline::from_cues(
        vec![
            cue(0, 0.0, 4.0, 0.5),
            cue(1, 1.0, 3.0, 0.0),
            cue(2, 2.5, 6.0, 1.0),
        ],
        0.0,
    );
    for i in 0..600 {
        let t = f64::from(i) / 100.0;
        let visible = tl
            .cues()
            .iter()
            .filter(|c| tl.frame_at(t).is_some_and(|s| s.index == c.index))
            .count();
        assert!(visible <= 1);
    }
}

#[test]
fn total_duration_covers_audio() {
    let tl = Timeline::from_cues(vec![cue(0, 0.0, 3.0, 0.0)], 8.5);
    assert_eq!(tl.total_duration(), 8.5);
    assert_eq!(tl.frame_count(30), 255);
    assert_eq!(Timeline::from_cues(vec![cue(0, 0.0, 6.0, 0.0)], 6.0).frame_count(30), 180);
    assert_eq!(tl.sample(0, 30).map(|s| s.index), Some(0));
    assert_eq!(tl.sample(200, 30), None);
}

#[test]
fn segments_describe_the_schedule() {
    let tl = Timeline::from_cues(
        vec![
            cue(0, 0.0, 10.0, 0.0),
            cue(1, 5.0, 15.0, 0.0),
            cue(2, 20.0, 22.0, 0.0),
        ],
        25.0,
    );
    let segs = tl.segments();
    assert_eq!(
        segs,
        vec![
            Segment {
                from: 0.0,
                to: 5.0,
                index: 0
            },
            Segment {
                from: 5.0,
                to: 15.0,
                index: 1
            },
            Segment {
                from: 20.0,
                to: 22.0,
                index: 2
            },
        ]
    );
}

#[test]
fn built_from_verses_uses_transition() {
    let verses: Vec<Verse> = serde_json::from_str(
        r#"[
            { "id": "a", "text": "A", "startTime": "00:02", "endTime": 6,
              "style": { "transition": { "type": "fade", "duration": 0.5 } } },
            { "id": "b", "text": "B", "startTime": 7, "endTime": 8,
              "style": { "transition": { "type": "none", "duration": 1.0 } } }
        ]"#,
    )
    .unwrap();
    let tl = Timeline::new(&verses, 0.0);
    assert_eq!(tl.cues()[0].fade, 0.5);
    assert_eq!(tl.cues()[1].fade, 0.0);
    assert_eq!(tl.frame_at(2.0), None);
    assert_eq!(tl.frame_at(4.0).map(|s| s.alpha), Some(1.0));
}
