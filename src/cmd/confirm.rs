//! Operator confirmation after an authorization link is shown.
//!
//! `StdinOperator` waits for one line on stdin. A closed stdin, a read error
//! or Ctrl-C all mean nobody can confirm interactively, reported as
//! `Confirmation::Unavailable` instead of an error.

use async_trait::async_trait;
use std::io::{self, BufRead};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Unavailable,
}

#[async_trait]
pub trait Operator: Send {
    /// Block until the operator confirms (or confirmation becomes impossible).
    /// The prompt has already been written by the caller.
    async fn confirm(&mut self) -> Confirmation;
}

#[derive(Debug, Default)]
pub struct StdinOperator;

#[async_trait]
impl Operator for StdinOperator {
    async fn confirm(&mut self) -> Confirmation {
        let mut read = tokio::task::spawn_blocking(|| {
            let mut line = String::new();
            io::stdin().lock().read_line(&mut line)
        });

        tokio::select! {
            res = &mut read => classify(res),
            sig = tokio::signal::ctrl_c() => match sig {
                Ok(()) => {
                    tracing::debug!("interrupted while waiting for confirmation");
                    Confirmation::Unavailable
                }
                Err(e) => {
                    tracing::warn!("cannot listen for Ctrl-C: {e}");
                    classify(read.await)
                }
            },
        }
    }
}

fn classify(res: Result<io::Result<usize>, tokio::task::JoinError>) -> Confirmation {
    match res {
        Ok(Ok(0)) => {
            tracing::debug!("stdin closed while waiting for confirmation");
            Confirmation::Unavailable
        }
        Ok(Ok(_)) => Confirmation::Confirmed,
        Ok(Err(e)) => {
            tracing::debug!("stdin unreadable: {e}");
            Confirmation::Unavailable
        }
        Err(e) => {
            tracing::debug!("confirmation reader stopped: {e}");
            Confirmation::Unavailable
        }
    }
}
