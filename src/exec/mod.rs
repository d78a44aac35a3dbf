// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the `ProcessSpawner` / `ChildProcess` traits the
//!   supervisor is written against.
//! - [`process`] implements them on top of `tokio::process::Command`, with
//!   stdio inherited from autocmd and SIGINT delivered through `nix`.

pub mod backend;
pub mod process;

pub use backend::{ChildProcess, ProcessOutcome, ProcessSpawner};
pub use process::{TokioChild, TokioSpawner};
