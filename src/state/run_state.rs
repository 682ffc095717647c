//! Run state machine
//!
//! `Idle --try_begin--> Running --ticket dropped--> Idle`. A stop request only
//! raises the run's `StopSignal`; the gate returns to idle once the run's
//! ticket is dropped, after every site task has finished.

use crate::{Result, SitelexError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Notify;

/// Cooperative cancellation flag for one indexing run
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag and wakes every task waiting in `stopped()`
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Completes once `stop()` has been called
    pub async fn stopped(&self) {
        loop {
            // Register before checking the flag so a concurrent stop() is not missed
            let notified = self.notify.notified();
            if self.is_stopped() {
                return;
            }
            notified.await;
        }
    }
}

#[derive(Debug)]
enum RunState {
    Idle,
    Running(Arc<StopSignal>),
}

/// Guards the single-run invariant
#[derive(Debug)]
pub struct RunGate {
    state: Mutex<RunState>,
}

impl Default for RunGate {
    fn default() -> Self {
        Self {
            state: Mutex::new(RunState::Idle),
        }
    }
}

impl RunGate {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RunState> {
        // The state is a plain enum, a panicking holder cannot leave it half-written
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Atomically moves the gate from idle to running
    ///
    /// Returns `AlreadyRunning` if another run holds the gate.
    pub fn try_begin(self: &Arc<Self>) -> Result<RunTicket> {
        let mut state = self.state();
        match *state {
            RunState::Running(_) => Err(SitelexError::AlreadyRunning),
            RunState::Idle => {
                let signal = Arc::new(StopSignal::new());
                *state = RunState::Running(signal.clone());
                Ok(RunTicket {
                    gate: self.clone(),
                    signal,
                })
            }
        }
    }

    /// Raises the stop signal of the current run
    ///
    /// Returns `NotRunning` if the gate is idle.
    pub fn request_stop(&self) -> Result<()> {
        match &*self.state() {
            RunState::Idle => Err(SitelexError::NotRunning),
            RunState::Running(signal) => {
                signal.stop();
                Ok(())
            }
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(*self.state(), RunState::Running(_))
    }
}

/// Proof of holding the run gate; releases it when dropped
#[derive(Debug)]
pub struct RunTicket {
    gate: Arc<RunGate>,
    signal: Arc<StopSignal>,
}

impl RunTicket {
    pub fn signal(&self) -> Arc<StopSignal> {
        self.signal.clone()
    }
}

impl Drop for RunTicket {
    fn drop(&mut self) {
        *self.gate.state() = RunState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_second_begin_is_rejected() {
        let gate = Arc::new(RunGate::new());
        let ticket = gate.try_begin().unwrap();
        assert!(gate.is_running());
        assert!(matches!(gate.try_begin(), Err(SitelexError::AlreadyRunning)));

        drop(ticket);
        assert!(!gate.is_running());
        assert!(gate.try_begin().is_ok());
    }

    #[test]
    fn test_stop_when_idle_is_rejected() {
        let gate = RunGate::new();
        assert!(matches!(gate.request_stop(), Err(SitelexError::NotRunning)));
    }

    #[test]
    fn test_stop_raises_signal_and_keeps_gate_held() {
        let gate = Arc::new(RunGate::new());
        let ticket = gate.try_begin().unwrap();
        let signal = ticket.signal();

        gate.request_stop().unwrap();
        assert!(signal.is_stopped());
        // Still running until the ticket is released
        assert!(gate.is_running());
        drop(ticket);
        assert!(!gate.is_running());
    }

    #[test]
    fn test_concurrent_begin_admits_exactly_one() {
        let gate = Arc::new(RunGate::new());
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let result = gate.try_begin();
                    let won = result.is_ok();
                    // Hold the ticket until every thread has tried
                    thread::sleep(Duration::from_millis(50));
                    drop(result);
                    won
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_stopped_completes_after_stop() {
        let signal = Arc::new(StopSignal::new());
        let waiter = {
            let signal = signal.clone();
            tokio::spawn(async move { signal.stopped().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        signal.stop();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_stopped_returns_immediately_when_already_stopped() {
        let signal = StopSignal::new();
        signal.stop();
        signal.stopped().await;
    }
}
