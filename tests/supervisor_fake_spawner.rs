// tests/supervisor_fake_spawner.rs

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use autocmd::engine::{
    RestartSignal, ShutdownPolicy, Supervisor, SupervisorEvent, SupervisorState,
};
use autocmd::errors::Result;
use autocmd::exec::ProcessOutcome;
use autocmd::types::ExitPolicy;
use autocmd_test_utils::{
    init_tracing, settle, with_timeout, FakeProcesses, FakeSpawner, ProcessEvent,
};

use ProcessEvent::{Exited, Interrupted, Killed, SpawnFailed, Started};

struct Harness {
    procs: FakeProcesses,
    tx: mpsc::Sender<SupervisorEvent>,
    state: tokio::sync::watch::Receiver<SupervisorState>,
    handle: JoinHandle<Result<()>>,
}

fn start(policy: ShutdownPolicy, on_exit: ExitPolicy) -> Harness {
    start_with(policy, on_exit, |_| {})
}

fn start_with(
    policy: ShutdownPolicy,
    on_exit: ExitPolicy,
    prepare: impl FnOnce(&FakeProcesses),
) -> Harness {
    init_tracing();
    let (spawner, procs) = FakeSpawner::new();
    prepare(&procs);

    let (tx, rx) = mpsc::channel(1);
    let supervisor = Supervisor::new(
        vec!["go".to_string(), "run".to_string(), "main.go".to_string()],
        spawner,
        policy,
        on_exit,
        rx,
    );
    let state = supervisor.subscribe();
    let handle = tokio::spawn(supervisor.run());

    Harness {
        procs,
        tx,
        state,
        handle,
    }
}

fn restart(trigger: &str) -> SupervisorEvent {
    SupervisorEvent::Restart(RestartSignal {
        trigger: trigger.to_string(),
    })
}

#[tokio::test(start_paused = true)]
async fn starts_once_at_startup() {
    let h = start(ShutdownPolicy::default(), ExitPolicy::Terminate);
    settle().await;

    assert_eq!(h.procs.events(), vec![Started(1)]);
    assert_eq!(*h.state.borrow(), SupervisorState::Running);
    assert_eq!(
        h.procs.argv(),
        vec![vec!["go".to_string(), "run".to_string(), "main.go".to_string()]]
    );
}

#[tokio::test(start_paused = true)]
async fn restart_waits_for_previous_exit_before_starting() {
    let h = start(ShutdownPolicy::default(), ExitPolicy::Terminate);
    settle().await;

    h.tx.send(restart("/main.go")).await.unwrap();
    settle().await;

    assert_eq!(
        h.procs.events(),
        vec![
            Started(1),
            Killed(1),
            Exited(1, ProcessOutcome::Terminated),
            Started(2),
        ]
    );
    assert_eq!(h.procs.alive(), vec![2]);

    h.tx.send(restart("/util.go")).await.unwrap();
    settle().await;
    assert_eq!(h.procs.alive(), vec![3]);
    assert_eq!(h.procs.started(), 3);
}

#[tokio::test(start_paused = true)]
async fn zero_sigint_kills_without_interrupting() {
    let h = start(ShutdownPolicy::from_millis(0, 0), ExitPolicy::Terminate);
    settle().await;

    h.tx.send(restart("/main.go")).await.unwrap();
    settle().await;

    assert!(!h.procs.events().contains(&Interrupted(1)));
    assert!(h.procs.events().contains(&Killed(1)));
}

#[tokio::test(start_paused = true)]
async fn interrupt_then_grace_period_then_kill() {
    let h = start_with(
        ShutdownPolicy::from_millis(500, 0),
        ExitPolicy::Terminate,
        FakeProcesses::ignore_interrupts,
    );
    settle().await;

    h.tx.send(restart("/main.go")).await.unwrap();
    settle().await;

    // Interrupted but still inside the grace period.
    assert_eq!(h.procs.events(), vec![Started(1), Interrupted(1)]);
    assert_eq!(*h.state.borrow(), SupervisorState::Stopping);

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(
        h.procs.events(),
        vec![
            Started(1),
            Interrupted(1),
            Killed(1),
            Exited(1, ProcessOutcome::Terminated),
            Started(2),
        ]
    );

    let interrupted = h.procs.time_of(&Interrupted(1)).unwrap();
    let killed = h.procs.time_of(&Killed(1)).unwrap();
    let gap = killed - interrupted;
    assert!(gap >= Duration::from_millis(500), "kill came after {gap:?}");
    assert!(gap < Duration::from_millis(520), "kill came after {gap:?}");
}

#[tokio::test(start_paused = true)]
async fn kill_follows_the_grace_period_even_if_the_child_already_exited() {
    let h = start(ShutdownPolicy::from_millis(200, 0), ExitPolicy::Terminate);
    settle().await;

    h.tx.send(restart("/main.go")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(
        h.procs.events(),
        vec![
            Started(1),
            Interrupted(1),
            Exited(1, ProcessOutcome::Terminated),
            Killed(1),
            Started(2),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn cooldown_separates_exit_from_next_start() {
    let h = start(ShutdownPolicy::from_millis(0, 300), ExitPolicy::Terminate);
    settle().await;

    h.tx.send(restart("/main.go")).await.unwrap();
    settle().await;
    assert_eq!(h.procs.alive(), Vec::<u32>::new());
    assert_eq!(h.procs.started(), 1);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(h.procs.started(), 2);

    let exited = h
        .procs
        .time_of(&Exited(1, ProcessOutcome::Terminated))
        .unwrap();
    let restarted = h.procs.time_of(&Started(2)).unwrap();
    assert!(restarted - exited >= Duration::from_millis(300));
}

#[tokio::test(start_paused = true)]
async fn failed_start_waits_for_next_signal() {
    let mut h = start_with(
        ShutdownPolicy::default(),
        ExitPolicy::Terminate,
        |procs| procs.fail_next_spawns(1),
    );
    settle().await;

    assert_eq!(h.procs.events(), vec![SpawnFailed]);
    assert_eq!(*h.state.borrow_and_update(), SupervisorState::Idle);

    // Nothing happens on its own.
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.procs.events(), vec![SpawnFailed]);

    h.tx.send(restart("/main.go")).await.unwrap();
    settle().await;
    assert_eq!(h.procs.events(), vec![SpawnFailed, Started(1)]);
    assert_eq!(*h.state.borrow(), SupervisorState::Running);
}

#[tokio::test(start_paused = true)]
async fn natural_exit_is_not_restarted_until_next_signal() {
    let h = start(ShutdownPolicy::from_millis(100, 0), ExitPolicy::Terminate);
    settle().await;

    h.procs.exit(1, ProcessOutcome::Failed(2));
    settle().await;

    assert_eq!(*h.state.borrow(), SupervisorState::Idle);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.procs.started(), 1);

    h.tx.send(restart("/main.go")).await.unwrap();
    settle().await;

    // The exited process is not interrupted or killed again.
    assert_eq!(
        h.procs.events(),
        vec![Started(1), Exited(1, ProcessOutcome::Failed(2)), Started(2)]
    );
}

#[tokio::test(start_paused = true)]
async fn shutdown_terminates_current_process() {
    let h = start(ShutdownPolicy::default(), ExitPolicy::Terminate);
    settle().await;

    h.tx.send(SupervisorEvent::ShutdownRequested).await.unwrap();
    with_timeout(h.handle).await.unwrap().unwrap();

    assert_eq!(h.procs.alive(), Vec::<u32>::new());
    assert!(h.procs.events().contains(&Killed(1)));
}

#[tokio::test(start_paused = true)]
async fn shutdown_can_leave_process_running() {
    let h = start(ShutdownPolicy::default(), ExitPolicy::Orphan);
    settle().await;

    h.tx.send(SupervisorEvent::ShutdownRequested).await.unwrap();
    with_timeout(h.handle).await.unwrap().unwrap();

    assert_eq!(h.procs.alive(), vec![1]);
    assert_eq!(h.procs.events(), vec![Started(1)]);
}

#[tokio::test(start_paused = true)]
async fn closed_channel_ends_supervision() {
    let h = start(ShutdownPolicy::default(), ExitPolicy::Terminate);
    settle().await;

    drop(h.tx);
    h.handle.await.unwrap().unwrap();

    assert_eq!(h.procs.alive(), Vec::<u32>::new());
}

#[tokio::test(start_paused = true)]
async fn never_more_than_one_process_alive() {
    let h = start_with(
        ShutdownPolicy::from_millis(50, 10),
        ExitPolicy::Terminate,
        FakeProcesses::ignore_interrupts,
    );
    settle().await;

    for i in 0..20 {
        let _ = h.tx.try_send(restart(&format!("/file{i}.go")));
        assert!(h.procs.alive().len() <= 1);
        tokio::time::sleep(Duration::from_millis(25)).await;
        assert!(h.procs.alive().len() <= 1);
    }

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(h.procs.alive().len(), 1);
}
