// src/exec/process.rs

//! `tokio::process` implementation of the process backend.

use std::future::Future;
use std::pin::Pin;
use std::process::{ExitStatus, Stdio};

use anyhow::{anyhow, bail, Context, Result};
use tokio::process::{Child, Command};

use super::backend::{ChildProcess, ProcessOutcome, ProcessSpawner};

impl From<ExitStatus> for ProcessOutcome {
    fn from(status: ExitStatus) -> Self {
        if status.success() {
            return ProcessOutcome::Success;
        }
        match status.code() {
            Some(code) => ProcessOutcome::Failed(code),
            None => ProcessOutcome::Terminated,
        }
    }
}

/// Spawns real OS processes with inherited standard streams.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner;

impl ProcessSpawner for TokioSpawner {
    fn spawn(&mut self, argv: &[String]) -> Result<Box<dyn ChildProcess>> {
        let Some((program, args)) = argv.split_first() else {
            bail!("empty command line");
        };

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            // Whether the child outlives us is decided by the supervisor's
            // exit policy, not by drop order.
            .kill_on_drop(false)
            .spawn()
            .with_context(|| format!("spawning {:?}", argv))?;

        Ok(Box::new(TokioChild { child }))
    }
}

#[derive(Debug)]
pub struct TokioChild {
    child: Child,
}

impl ChildProcess for TokioChild {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    #[cfg(unix)]
    fn interrupt(&mut self) -> Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let pid = self
            .child
            .id()
            .ok_or_else(|| anyhow!("process has already exited"))?;
        kill(Pid::from_raw(pid as i32), Signal::SIGINT).context("sending SIGINT")?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn interrupt(&mut self) -> Result<()> {
        Err(anyhow!("graceful interrupt is not supported on this platform"))
    }

    /// A no-op once the child has been reaped.
    fn kill(&mut self) -> Result<()> {
        self.child.start_kill().context("sending kill signal")
    }

    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<ProcessOutcome>> + Send + '_>> {
        Box::pin(async move {
            let status = self.child.wait().await.context("waiting for process")?;
            Ok(ProcessOutcome::from(status))
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn argv(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn exit_codes_are_reported() {
        let mut spawner = TokioSpawner;

        let mut ok = spawner.spawn(&argv(&["true"])).unwrap();
        assert_eq!(ok.wait().await.unwrap(), ProcessOutcome::Success);

        let mut failed = spawner.spawn(&argv(&["sh", "-c", "exit 3"])).unwrap();
        assert_eq!(failed.wait().await.unwrap(), ProcessOutcome::Failed(3));
    }

    #[tokio::test]
    async fn kill_terminates_a_long_running_process() {
        let mut child = TokioSpawner.spawn(&argv(&["sleep", "30"])).unwrap();
        assert!(child.id().is_some());

        child.kill().unwrap();
        assert_eq!(child.wait().await.unwrap(), ProcessOutcome::Terminated);
    }

    #[tokio::test]
    async fn interrupt_stops_a_process_that_does_not_trap_it() {
        let mut child = TokioSpawner.spawn(&argv(&["sleep", "30"])).unwrap();
        child.interrupt().unwrap();
        assert_eq!(child.wait().await.unwrap(), ProcessOutcome::Terminated);

        // Already reaped: the pid is forgotten so an interrupt fails instead
        // of hitting a recycled pid, and a kill is a no-op.
        assert!(child.id().is_none());
        assert!(child.interrupt().is_err());
        assert!(child.kill().is_ok());
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let _guard = rt.enter();
        let err = TokioSpawner
            .spawn(&argv(&["autocmd-definitely-not-a-program"]))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("spawning"));
        assert!(TokioSpawner.spawn(&[]).is_err());
    }
}
