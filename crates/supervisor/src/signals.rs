//! The fixed set of relayed signals and where they come from

use async_trait::async_trait;
use std::fmt;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tokio::sync::mpsc;

/// Signals relayed to the child. Anything else is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandledSignal {
    /// `SIGTERM`; also starts the graceful shutdown timer
    Terminate,
    /// `SIGINT`
    Interrupt,
    /// `SIGQUIT`
    Quit,
    /// `SIGUSR1`
    UserDefined1,
    /// `SIGUSR2`
    UserDefined2,
}

impl HandledSignal {
    /// Every handled signal.
    pub const ALL: [Self; 5] = [
        Self::Terminate,
        Self::Interrupt,
        Self::Quit,
        Self::UserDefined1,
        Self::UserDefined2,
    ];

    /// Classify a raw signal number.
    #[must_use]
    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|signal| signal.as_raw() == raw)
    }

    /// The platform signal number.
    #[must_use]
    pub const fn as_raw(self) -> i32 {
        match self {
            Self::Terminate => libc::SIGTERM,
            Self::Interrupt => libc::SIGINT,
            Self::Quit => libc::SIGQUIT,
            Self::UserDefined1 => libc::SIGUSR1,
            Self::UserDefined2 => libc::SIGUSR2,
        }
    }

    /// Termination-class signals: `SIGTERM`, `SIGINT`, `SIGQUIT`.
    #[must_use]
    pub const fn is_termination(self) -> bool {
        matches!(self, Self::Terminate | Self::Interrupt | Self::Quit)
    }

    /// Only `SIGTERM` asks for an orderly shutdown with a kill deadline.
    #[must_use]
    pub const fn requests_shutdown(self) -> bool {
        matches!(self, Self::Terminate)
    }

    /// Conventional name, e.g. `SIGTERM`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Terminate => "SIGTERM",
            Self::Interrupt => "SIGINT",
            Self::Quit => "SIGQUIT",
            Self::UserDefined1 => "SIGUSR1",
            Self::UserDefined2 => "SIGUSR2",
        }
    }

    fn kind(self) -> SignalKind {
        match self {
            Self::Terminate => SignalKind::terminate(),
            Self::Interrupt => SignalKind::interrupt(),
            Self::Quit => SignalKind::quit(),
            Self::UserDefined1 => SignalKind::user_defined1(),
            Self::UserDefined2 => SignalKind::user_defined2(),
        }
    }
}

impl fmt::Display for HandledSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stream of raw signal numbers delivered to the supervisor.
#[async_trait]
pub trait SignalSource: Send + 'static {
    /// Next signal number, or `None` once the source is closed.
    async fn recv(&mut self) -> Option<i32>;
}

/// Process-wide subscription to every [`HandledSignal`].
///
/// Dropping the listener ends the subscription.
#[derive(Debug)]
pub struct SignalListener {
    terminate: Signal,
    interrupt: Signal,
    quit: Signal,
    user1: Signal,
    user2: Signal,
}

impl SignalListener {
    /// Subscribe to the handled signal set.
    ///
    /// # Errors
    ///
    /// Fails if a handler cannot be registered with the runtime.
    pub fn install() -> std::io::Result<Self> {
        Ok(Self {
            terminate: signal(HandledSignal::Terminate.kind())?,
            interrupt: signal(HandledSignal::Interrupt.kind())?,
            quit: signal(HandledSignal::Quit.kind())?,
            user1: signal(HandledSignal::UserDefined1.kind())?,
            user2: signal(HandledSignal::UserDefined2.kind())?,
        })
    }
}

#[async_trait]
impl SignalSource for SignalListener {
    async fn recv(&mut self) -> Option<i32> {
        let received = tokio::select! {
            Some(()) = self.terminate.recv() => HandledSignal::Terminate,
            Some(()) = self.interrupt.recv() => HandledSignal::Interrupt,
            Some(()) = self.quit.recv() => HandledSignal::Quit,
            Some(()) = self.user1.recv() => HandledSignal::UserDefined1,
            Some(()) = self.user2.recv() => HandledSignal::UserDefined2,
            else => return None,
        };
        Some(received.as_raw())
    }
}

#[async_trait]
impl SignalSource for mpsc::Receiver<i32> {
    async fn recv(&mut self) -> Option<i32> {
        Self::recv(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_round_trip() {
        for signal in HandledSignal::ALL {
            assert_eq!(HandledSignal::from_raw(signal.as_raw()), Some(signal));
        }
    }

    #[test]
    fn test_unhandled_signals() {
        assert_eq!(HandledSignal::from_raw(libc::SIGHUP), None);
        assert_eq!(HandledSignal::from_raw(libc::SIGWINCH), None);
        assert_eq!(HandledSignal::from_raw(0), None);
    }

    #[test]
    fn test_only_sigterm_requests_shutdown() {
        let shutdown: Vec<_> = HandledSignal::ALL
            .into_iter()
            .filter(|s| s.requests_shutdown())
            .collect();
        assert_eq!(shutdown, vec![HandledSignal::Terminate]);
    }

    #[test]
    fn test_termination_class() {
        assert!(HandledSignal::Quit.is_termination());
        assert!(HandledSignal::Interrupt.is_termination());
        assert!(!HandledSignal::UserDefined2.is_termination());
    }

    #[test]
    fn test_display() {
        assert_eq!(HandledSignal::UserDefined1.to_string(), "SIGUSR1");
    }

    #[tokio::test]
    async fn test_channel_source() {
        let (tx, mut rx) = mpsc::channel(2);
        tx.send(libc::SIGUSR2).await.unwrap();
        drop(tx);

        assert_eq!(SignalSource::recv(&mut rx).await, Some(libc::SIGUSR2));
        assert_eq!(SignalSource::recv(&mut rx).await, None);
    }

    #[tokio::test]
    async fn test_listener_installs() {
        assert!(SignalListener::install().is_ok());
    }
}
