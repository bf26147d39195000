//! # botkit
//!
//! Client for the AI BotKit admin-ajax API: chat with streamed replies,
//! batch PDF export, and knowledge-base migration.
//!
//! Every long-running feature is the same shape on the wire: submit
//! once, then poll a status action until a terminal state. The crate
//! builds that shape once ([`poll::drive`] over the [`poll::JobProbe`]
//! trait) and instantiates it per feature under [`services`].
//! [`surface::JobSurface`] adds at-most-one-job-per-surface ownership
//! with cancellation that discards late responses.

pub mod config;
pub mod conversation;
pub mod envelope;
pub mod error;
pub mod job;
pub mod poll;
pub mod services;
pub mod surface;
pub mod transport;

pub use config::BotkitConfig;
pub use error::{ClientError, ErrorCode};
pub use job::{Job, JobKind, JobStatus, Progress};
pub use poll::{JobProbe, PollPolicy, Step, drive};
pub use surface::{JobEvent, JobSurface};
pub use transport::{Ajax, HttpAjax};
