//! Common test utilities

#![allow(dead_code)]

use kargar::{action, Action, Context};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::subscriber::DefaultGuard;

/// One time unit for timing tests
pub const UNIT: Duration = Duration::from_millis(50);

pub fn units(n: u32) -> Duration {
    UNIT * n
}

/// Shared log of the order in which actions ran
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    /// An action that appends `entry` when it runs
    pub fn record(&self, entry: &str) -> Action {
        let journal = self.clone();
        let entry = entry.to_string();
        action(move |_| {
            journal.push(&entry);
            async { Ok(()) }
        })
    }

    pub fn push(&self, entry: &str) {
        self.0.lock().unwrap().push(entry.to_string());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// An action that sleeps for `duration` unless cancelled first.
///
/// Counts completed runs in `runs` and returns the context error on cancellation.
pub fn sleeper(duration: Duration, runs: Arc<AtomicUsize>) -> Action {
    action(move |ctx: Context| {
        let runs = Arc::clone(&runs);
        async move {
            tokio::select! {
                _ = tokio::time::sleep(duration) => {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                err = ctx.done() => Err(err.into()),
            }
        }
    })
}

/// An action that always fails with `message`
pub fn failing(message: &'static str) -> Action {
    action(move |_| async move { Err(anyhow::anyhow!(message)) })
}

/// Collects formatted log output written on the current thread
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Route warnings and errors here until the guard is dropped
    pub fn install(&self) -> DefaultGuard {
        let sink = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || sink.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
