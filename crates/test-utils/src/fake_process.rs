use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use tokio::sync::watch;
use tokio::time::Instant;

use autocmd::exec::{ChildProcess, ProcessOutcome, ProcessSpawner};

/// Something that happened to a fake process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Started(u32),
    SpawnFailed,
    Interrupted(u32),
    Killed(u32),
    Exited(u32, ProcessOutcome),
}

/// A [`ProcessEvent`] with the (tokio) time it was recorded at.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub at: Instant,
    pub event: ProcessEvent,
}

#[derive(Default)]
struct Shared {
    next_id: u32,
    log: Vec<Recorded>,
    children: BTreeMap<u32, watch::Sender<Option<ProcessOutcome>>>,
    argv: Vec<Vec<String>>,
    fail_spawns: usize,
    ignore_interrupt: bool,
}

impl Shared {
    fn record(&mut self, event: ProcessEvent) {
        self.log.push(Recorded {
            at: Instant::now(),
            event,
        });
    }

    /// First exit wins; later calls are no-ops.
    fn finish(&mut self, id: u32, outcome: ProcessOutcome) {
        let Some(tx) = self.children.get(&id) else {
            return;
        };
        let changed = tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(outcome);
            true
        });
        if changed {
            self.record(ProcessEvent::Exited(id, outcome));
        }
    }
}

/// A fake spawner that:
/// - hands out [`FakeChild`]s with increasing ids starting at 1
/// - records every start, interrupt, kill and exit with its timestamp
/// - exits a child on interrupt (unless told to ignore interrupts) or kill.
pub struct FakeSpawner {
    shared: Arc<Mutex<Shared>>,
}

/// Test-side handle onto the processes of a [`FakeSpawner`].
#[derive(Clone)]
pub struct FakeProcesses {
    shared: Arc<Mutex<Shared>>,
}

impl FakeSpawner {
    pub fn new() -> (Self, FakeProcesses) {
        let shared = Arc::new(Mutex::new(Shared::default()));
        (
            Self {
                shared: Arc::clone(&shared),
            },
            FakeProcesses { shared },
        )
    }
}

impl ProcessSpawner for FakeSpawner {
    fn spawn(&mut self, argv: &[String]) -> Result<Box<dyn ChildProcess>> {
        let mut shared = self.shared.lock().unwrap();

        if shared.fail_spawns > 0 {
            shared.fail_spawns -= 1;
            shared.record(ProcessEvent::SpawnFailed);
            return Err(anyhow!("fake spawn failure for {argv:?}"));
        }

        shared.next_id += 1;
        let id = shared.next_id;
        let (tx, rx) = watch::channel(None);
        shared.children.insert(id, tx);
        shared.argv.push(argv.to_vec());
        shared.record(ProcessEvent::Started(id));

        Ok(Box::new(FakeChild {
            id,
            exit_rx: rx,
            shared: Arc::clone(&self.shared),
        }))
    }
}

pub struct FakeChild {
    id: u32,
    exit_rx: watch::Receiver<Option<ProcessOutcome>>,
    shared: Arc<Mutex<Shared>>,
}

impl ChildProcess for FakeChild {
    fn id(&self) -> Option<u32> {
        Some(self.id)
    }

    fn interrupt(&mut self) -> Result<()> {
        let mut shared = self.shared.lock().unwrap();
        shared.record(ProcessEvent::Interrupted(self.id));
        if !shared.ignore_interrupt {
            shared.finish(self.id, ProcessOutcome::Terminated);
        }
        Ok(())
    }

    fn kill(&mut self) -> Result<()> {
        let mut shared = self.shared.lock().unwrap();
        shared.record(ProcessEvent::Killed(self.id));
        shared.finish(self.id, ProcessOutcome::Terminated);
        Ok(())
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send + '_>> {
        let mut rx = self.exit_rx.clone();
        Box::pin(async move {
            let outcome = *rx
                .wait_for(Option::is_some)
                .await
                .map_err(|_| anyhow!("fake process handle dropped"))?;
            outcome.ok_or_else(|| anyhow!("fake process has no outcome"))
        })
    }
}

impl FakeProcesses {
    /// Make the next `n` spawns fail.
    pub fn fail_next_spawns(&self, n: usize) {
        self.shared.lock().unwrap().fail_spawns = n;
    }

    /// Children keep running after an interrupt and only die on kill.
    pub fn ignore_interrupts(&self) {
        self.shared.lock().unwrap().ignore_interrupt = true;
    }

    /// Let process `id` exit on its own.
    pub fn exit(&self, id: u32, outcome: ProcessOutcome) {
        self.shared.lock().unwrap().finish(id, outcome);
    }

    pub fn events(&self) -> Vec<ProcessEvent> {
        self.recorded().into_iter().map(|r| r.event).collect()
    }

    pub fn recorded(&self) -> Vec<Recorded> {
        self.shared.lock().unwrap().log.clone()
    }

    /// Command lines of every successful spawn, in order.
    pub fn argv(&self) -> Vec<Vec<String>> {
        self.shared.lock().unwrap().argv.clone()
    }

    pub fn started(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, ProcessEvent::Started(_)))
            .count()
    }

    /// Ids of processes that have been started but not exited.
    pub fn alive(&self) -> Vec<u32> {
        let shared = self.shared.lock().unwrap();
        shared
            .children
            .iter()
            .filter(|(_, tx)| tx.borrow().is_none())
            .map(|(id, _)| *id)
            .collect()
    }

    /// Time the first event matching `event` was recorded.
    pub fn time_of(&self, event: &ProcessEvent) -> Option<Instant> {
        self.recorded()
            .into_iter()
            .find(|r| &r.event == event)
            .map(|r| r.at)
    }
}
