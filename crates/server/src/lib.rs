//! Banking server: sessions, connection workers, accept loop, diagnostics, and
//! cooperative shutdown around one shared [`bankd_ledger::Ledger`].

pub mod config;
pub mod diagnostics;
pub mod listener;
pub mod server;
pub mod session;
pub mod shutdown;
pub mod worker;

pub use config::{ConfigError, ServerConfig};
pub use server::Server;
pub use session::{Disposition, Outcome, Session, SessionState};
pub use worker::{WorkerContext, WorkerExit};
