use super::*;

fn plan(background: Background) -> AssemblyPlan {
    AssemblyPlan {
        canvas: Canvas::new(640, 360).unwrap(),
        fps: 30,
        duration_sec: 6.0,
        background,
        audio: PathBuf::from("/assets/song.mp3"),
        output: PathBuf::from("/out/my-song-1a2b3c4d.mp4"),
        policy: EncodePolicy::default(),
        ffmpeg: PathBuf::from("ffmpeg"),
    }
}

fn strings(args: &[OsString]) -> Vec<String> {
    args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
}

struct Blank {
    frames: u64,
    buf: Vec<u8>,
}

impl OverlaySource for Blank {
    fn frame_count(&self) -> u64 {
        self.frames
    }

    fn frame(&mut self, _n: u64) -> LyricResult<&[u8]> {
        Ok(&self.buf)
    }
}

#[test]
fn media_kind_follows_extension() {
    assert_eq!(
        Background::from_media("/a/cover.JPG"),
        Background::Image(PathBuf::from("/a/cover.JPG"))
    );
    assert_eq!(
        Background::from_media("/a/loop.mp4"),
        Background::Video(PathBuf::from("/a/loop.mp4"))
    );
}

#[test]
fn part_path_sits_next_to_output() {
    assert_eq!(
        plan(Background::Color(Rgba8::BLACK)).part_path(),
        PathBuf::from("/out/my-song-1a2b3c4d.mp4.part")
    );
}

#[test]
fn solid_background_uses_lavfi_color_source() {
    let p = plan(Background::Color(Rgba8::rgb(0x12, 0x34, 0x56)));
    let args = strings(&build_ffmpeg_args(&p, &p.part_path()));
    assert!(args.contains(&"color=c=0x123456:s=640x360:r=30:d=6.000".to_owned()));
    assert!(args.windows(2).any(|w| w == ["-map", "2:a:0"]));
    assert!(args.windows(2).any(|w| w == ["-crf", "23"]));
    assert!(args.windows(2).any(|w| w == ["-movflags", "+faststart"]));
    assert!(args.windows(2).any(|w| w == ["-b:a", "192k"]));
    assert_eq!(args.last().map(String::as_str), Some("/out/my-song-1a2b3c4d.mp4.part"));
    assert!(!build_filter_graph(&p).contains("tpad"));
}

#[test]
fn image_is_looped_and_video_is_frozen() {
    let p = plan(Background::Image(PathBuf::from("/assets/bg.png")));
    let args = strings(&build_ffmpeg_args(&p, &p.part_path()));
    assert!(args.windows(2).any(|w| w == ["-loop", "1"]));
    assert!(args.windows(2).any(|w| w == ["-i", "/assets/bg.png"]));

    let p = plan(Background::Video(PathBuf::from("/assets/bg.mp4")));
    let graph = build_filter_graph(&p);
    assert!(graph.contains("tpad=stop_mode=clone:stop_duration=6.000"));
    assert!(graph.starts_with("[1:v]scale=640:360:force_original_aspect_ratio=decrease"));
    assert!(graph.ends_with("[bg][0:v]overlay=format=auto:eof_action=pass[v]"));
}

#[test]
fn faststart_is_policy() {
    let mut p = plan(Background::Color(Rgba8::BLACK));
    p.policy.faststart = false;
    let args = strings(&build_ffmpeg_args(&p, &p.part_path()));
    assert!(!args.iter().any(|a| a == "-movflags"));
}

#[test]
fn stderr_tail_keeps_last_lines() {
    assert_eq!(stderr_tail("a\n\nb\nc\n", 2), "b\nc");
    assert_eq!(stderr_tail("", 3), "");
}

#[test]
fn missing_encoder_fails_without_leaving_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = plan(Background::Color(Rgba8::BLACK));
    p.output = dir.path().join("out.mp4");
    p.ffmpeg = PathBuf::from("/definitely/not/ffmpeg");
    let mut overlay = Blank {
        frames: 3,
        buf: vec![0; p.canvas.rgba_len()],
    };
    let err = assemble(&p, &mut overlay, &CancelToken::new(), &mut |_, _| {}).unwrap_err();
    assert!(matches!(err, LyricError::Assembly(_)));
    assert!(!p.output.exists());
    assert!(!p.part_path().exists());
}

#[cfg(unix)]
#[test]
fn failing_encoder_reports_assembly_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = plan(Background::Color(Rgba8::BLACK));
    p.output = dir.path().join("out.mp4");
    p.ffmpeg = PathBuf::from("false");
    let mut overlay = Blank {
        frames: 2,
        buf: vec![0; p.canvas.rgba_len()],
    };
    let err = assemble(&p, &mut overlay, &CancelToken::new(), &mut |_, _| {}).unwrap_err();
    assert!(matches!(err, LyricError::Assembly(_)));
    assert!(!p.output.exists());
}

/// Shell script standing in for ffmpeg: creates the partial output (last argument), runs `body`
/// with stdin attached, then exits with `body`'s status.
#[cfg(unix)]
fn stub_encoder(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ffmpeg");
    std::fs::write(
        &path,
        format!("#!/bin/sh\nfor a in \"$@\"; do last=\"$a\"; done\n: > \"$last\"\n{body}\n"),
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

#[cfg(unix)]
#[test]
fn cancel_mid_stream_kills_encoder_and_removes_part() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = plan(Background::Color(Rgba8::BLACK));
    p.output = dir.path().join("out.mp4");
    p.ffmpeg = stub_encoder(dir.path(), "cat > /dev/null");
    let mut overlay = Blank {
        frames: 10,
        buf: vec![0; p.canvas.rgba_len()],
    };
    let cancel = CancelToken::new();
    let mut seen = Vec::new();
    let err = assemble(&p, &mut overlay, &cancel, &mut |done, _| {
        seen.push(done);
        cancel.cancel();
    })
    .unwrap_err();

    assert!(matches!(err, LyricError::Cancelled));
    assert_eq!(seen, vec![1]);
    assert!(!p.output.exists());
    assert!(!p.part_path().exists());
}

#[cfg(unix)]
#[test]
fn encoder_that_stops_reading_but_succeeds_publishes_output() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = plan(Background::Color(Rgba8::BLACK));
    p.output = dir.path().join("out.mp4");
    p.ffmpeg = stub_encoder(dir.path(), "head -c 100 > /dev/null\nexit 0");
    let mut overlay = Blank {
        frames: 3,
        buf: vec![0; p.canvas.rgba_len()],
    };
    assemble(&p, &mut overlay, &CancelToken::new(), &mut |_, _| {}).unwrap();

    assert!(p.output.is_file());
    assert!(!p.part_path().exists());
}

#[cfg(unix)]
#[test]
fn encoder_failure_hides_absolute_paths() {
    let dir = tempfile::tempdir().unwrap();
    let mut p = plan(Background::Image(dir.path().join("uploads/bg.png")));
    p.output = dir.path().join("exports/out.mp4");
    p.audio = dir.path().join("uploads/song.mp3");
    p.ffmpeg = stub_encoder(
        dir.path(),
        &format!(
            "cat > /dev/null\necho \"{}: Invalid data found\" >&2\nexit 1",
            p.audio.display()
        ),
    );
    let mut overlay = Blank {
        frames: 2,
        buf: vec![0; p.canvas.rgba_len()],
    };
    let err = assemble(&p, &mut overlay, &CancelToken::new(), &mut |_, _| {}).unwrap_err();

    let msg = err.to_string();
    assert!(matches!(err, LyricError::Assembly(_)));
    assert!(msg.contains("song.mp3: Invalid data found"), "{msg}");
    assert!(!msg.contains(dir.path().to_str().unwrap()), "{msg}");
    assert!(!p.part_path().exists());
}

#[test]
fn duration_is_rounded_up_to_whole_frames() {
    let mut p = plan(Background::Color(Rgba8::BLACK));
    p.duration_sec = 6.0004;
    assert_eq!(p.frame_count(), 181);
    let args = strings(&build_ffmpeg_args(&p, &p.part_path()));
    let t = args.windows(2).find(|w| w[0] == "-t").map(|w| w[1].clone());
    assert_eq!(t.as_deref(), Some("6.033"));
    assert!(args.iter().any(|a| a.ends_with(":d=6.033")));
}

#[test]
fn redact_replaces_plan_paths_with_file_names() {
    let p = plan(Background::Video(PathBuf::from("/assets/bg.mp4")));
    assert_eq!(
        p.redact("/assets/bg.mp4: bad; /out/my-song-1a2b3c4d.mp4.part: busy; /assets/song.mp3"),
        "bg.mp4: bad; my-song-1a2b3c4d.mp4.part: busy; song.mp3"
    );
}

#[test]
fn zero_frames_is_rejected() {
    let p = plan(Background::Color(Rgba8::BLACK));
    let mut overlay = Blank {
        frames: 0,
        buf: Vec::new(),
    };
    let err = assemble(&p, &mut overlay, &CancelToken::new(), &mut |_, _| {}).unwrap_err();
    assert!(err.to_string().contains("duration is zero"));
}
