// tests/go_scenario.rs
//
// `autocmd go run main.go -- '\.go$'` driven end to end with a scripted
// event stream and a fake spawner.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::sync::mpsc;
use tokio::time::sleep;

use autocmd::config::ConfigFile;
use autocmd::engine::{ShutdownPolicy, Supervisor, SupervisorEvent};
use autocmd::fs::RealFileSystem;
use autocmd::watch::{
    spawn_watcher, Debouncer, FsEvent, FsEventKind, PathFilter, SourceMessage, TreeEnumerator,
};
use autocmd_test_utils::{
    init_tracing, settle, FakeProcesses, FakeSpawner, RecordingSource, SettingsBuilder,
};

struct Scenario {
    _tmp: TempDir,
    cfg: ConfigFile,
    procs: FakeProcesses,
    source: Arc<RecordingSource>,
    source_tx: mpsc::UnboundedSender<SourceMessage>,
    events_tx: mpsc::Sender<SupervisorEvent>,
}

impl Scenario {
    fn touch(&self, rel: &str) {
        self.send(FsEventKind::Modify, rel);
    }

    fn send(&self, kind: FsEventKind, rel: &str) {
        let event = FsEvent::new(kind, self.cfg.root().join(rel));
        self.source_tx.send(SourceMessage::Event(event)).unwrap();
    }
}

async fn scenario(wait_ms: u64) -> Scenario {
    init_tracing();
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("main.go"), "package main").unwrap();
    fs::write(tmp.path().join("README.md"), "# demo").unwrap();
    fs::create_dir_all(tmp.path().join(".git")).unwrap();

    let cfg = SettingsBuilder::new(tmp.path())
        .cmd(&["go", "run", "main.go"])
        .include(r"\.go$")
        .wait_ms(wait_ms)
        .build();

    let filter = Arc::new(PathFilter::from_config(&cfg).unwrap());
    let source = Arc::new(RecordingSource::new());
    let enumerator = Arc::new(TreeEnumerator::new(
        cfg.root(),
        Arc::clone(&filter),
        source.clone(),
        Arc::new(RealFileSystem),
    ));
    enumerator.enumerate_root().unwrap();

    let (events_tx, events_rx) = mpsc::channel(1);
    let (source_tx, source_rx) = mpsc::unbounded_channel();
    let debouncer = Debouncer::new(cfg.wait(), events_tx.clone());
    spawn_watcher(enumerator, filter, debouncer, source_rx);

    let (spawner, procs) = FakeSpawner::new();
    let supervisor = Supervisor::new(
        cfg.command().to_vec(),
        spawner,
        ShutdownPolicy::from_config(&cfg),
        cfg.process().on_exit,
        events_rx,
    );
    tokio::spawn(supervisor.run());
    settle().await;

    Scenario {
        _tmp: tmp,
        cfg,
        procs,
        source,
        source_tx,
        events_tx,
    }
}

#[tokio::test(start_paused = true)]
async fn burst_of_saves_restarts_once_after_the_last_one() {
    let s = scenario(1000).await;
    assert_eq!(s.procs.started(), 1);

    // t=0, 100, 200
    for _ in 0..3 {
        s.touch("main.go");
        sleep(Duration::from_millis(100)).await;
    }
    // t=300: last event was at t=200, so nothing may fire before t=1200.
    sleep(Duration::from_millis(850)).await;
    assert_eq!(s.procs.started(), 1);

    sleep(Duration::from_millis(100)).await;
    assert_eq!(s.procs.started(), 2);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(s.procs.started(), 2);
}

#[tokio::test(start_paused = true)]
async fn irrelevant_and_excluded_changes_never_restart() {
    let s = scenario(1000).await;

    s.touch("README.md");
    s.touch(".git/index");
    s.send(FsEventKind::Create, ".git/objects");
    sleep(Duration::from_secs(5)).await;

    assert_eq!(s.procs.started(), 1);
    assert!(!s.source.is_registered(&s.cfg.root().join(".git")));
}

#[tokio::test(start_paused = true)]
async fn separated_saves_restart_separately() {
    let s = scenario(1000).await;

    s.touch("main.go");
    sleep(Duration::from_millis(1001)).await;
    s.touch("main.go");
    sleep(Duration::from_millis(1100)).await;

    assert_eq!(s.procs.started(), 3);
}

#[tokio::test(start_paused = true)]
async fn new_package_directory_is_watched_and_its_files_restart() {
    let s = scenario(200).await;
    let pkg = s.cfg.root().join("pkg");
    fs::create_dir_all(&pkg).unwrap();

    s.send(FsEventKind::Create, "pkg");
    // Registration runs on the blocking pool; the paused clock only moves
    // once it has finished.
    sleep(Duration::from_millis(10)).await;
    assert!(s.source.is_registered(&pkg));

    sleep(Duration::from_secs(1)).await;
    assert_eq!(s.procs.started(), 1);

    s.send(FsEventKind::Create, "pkg/util.go");
    sleep(Duration::from_millis(300)).await;
    assert_eq!(s.procs.started(), 2);
}

#[tokio::test(start_paused = true)]
async fn shutdown_request_reaches_the_supervisor() {
    let s = scenario(1000).await;

    s.events_tx
        .send(SupervisorEvent::ShutdownRequested)
        .await
        .unwrap();
    settle().await;

    assert!(s.procs.alive().is_empty());
}
