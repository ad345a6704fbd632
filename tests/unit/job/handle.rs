use super::*;

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct Counting {
    progress: Mutex<Vec<u8>>,
    completes: AtomicUsize,
    errors: AtomicUsize,
}

impl JobObserver for Counting {
    fn on_progress(&self, percent: u8) {
        self.progress.lock().unwrap().push(percent);
    }

    fn on_complete(&self, _output: &std::path::Path) {
        self.completes.fetch_add(1, Ordering::SeqCst);
    }

    fn on_error(&self, _failure: &JobFailure) {
        self.errors.fetch_add(1, Ordering::SeqCst);
    }
}

fn handle() -> (JobHandle, Arc<JobShared>) {
    let shared = Arc::new(JobShared::default());
    (
        JobHandle::new(JobId::new(), Arc::clone(&shared), CancelToken::new()),
        shared,
    )
}

#[test]
fn progress_is_monotonic_and_terminal_is_delivered_once() {
    let (h, shared) = handle();
    let obs = Arc::new(Counting::default());
    h.subscribe(obs.clone());

    shared.advance(JobStatus::Rasterizing).unwrap();
    shared.report_progress(10);
    shared.report_progress(5);
    shared.report_progress(10);
    shared.report_progress(60);
    shared.finish(Ok(PathBuf::from("/out/x.mp4")));
    shared.finish(Err(JobFailure::from(&LyricError::Cancelled)));

    assert_eq!(*obs.progress.lock().unwrap(), vec![10, 60, 100]);
    assert_eq!(obs.completes.load(Ordering::SeqCst), 1);
    assert_eq!(obs.errors.load(Ordering::SeqCst), 0);
    assert_eq!(h.status(), JobStatus::Succeeded);
    assert_eq!(h.progress(), 100);
    assert_eq!(h.wait(), Ok(PathBuf::from("/out/x.mp4")));
}

#[test]
fn late_subscriber_gets_terminal_event() {
    let (h, shared) = handle();
    shared.finish(Err(JobFailure::from(&LyricError::assembly("ffmpeg exited"))));

    let obs = Arc::new(Counting::default());
    h.subscribe(obs.clone());
    assert_eq!(obs.errors.load(Ordering::SeqCst), 1);

    let rx = h.events();
    match rx.recv().unwrap() {
        JobEvent::Failed(f) => assert_eq!(f.kind, ErrorKind::Assembly),
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(h.status(), JobStatus::Failed);
}

#[test]
fn illegal_transitions_are_rejected() {
    let (_h, shared) = handle();
    assert!(shared.advance(JobStatus::Assembling).is_err());
    shared.advance(JobStatus::Rasterizing).unwrap();
    assert!(shared.advance(JobStatus::Succeeded).is_err());
}

#[test]
fn wait_blocks_until_finished() {
    let (h, shared) = handle();
    assert_eq!(h.wait_timeout(Duration::from_millis(10)), None);

    let worker = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(20));
        shared.finish(Err(JobFailure::from(&LyricError::Cancelled)));
    });
    let outcome = h.wait();
    worker.join().unwrap();
    assert_eq!(
        outcome.unwrap_err().kind,
        ErrorKind::Cancelled
    );
    assert!(h.is_finished());
}
