//! Process supervision for aws-init
//!
//! Runs the target command as a child in its own process group, relays
//! termination and user signals to it, and escalates to `SIGKILL` when the
//! child outlives the graceful shutdown window after a `SIGTERM`.
//!
//! ```ignore
//! let code = Supervisor::new().run("python", &["app.py".into()], &env).await;
//! std::process::exit(code);
//! ```

mod relay;
mod signals;
mod supervisor;

pub use relay::{force_kill, forward_signal};
pub use signals::{HandledSignal, SignalListener, SignalSource};
pub use supervisor::{ChildState, GRACEFUL_TIMEOUT, Supervisor};
