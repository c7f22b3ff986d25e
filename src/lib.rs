//! Identity resolution and event tracking for the student journey.
//!
//! If you're just getting started, take a look at the [`Emitter`].
//! It owns the tracking session and forwards normalized calls to a
//! [`Sink`](sink::Sink): the tracking API via [`Builder`], the log via
//! [`sink::LogSink`] or memory via [`sink::Recorder`].
//!
//! # Examples
//! ```
//! use campus_analytics::{events::*, identity, profile::Traits, sink::Recorder, Emitter};
//!
//! let recorder = Recorder::default();
//! let mut emitter = Emitter::new(recorder.clone());
//!
//! // Anonymous visitors are tracked against the session only.
//! emitter.track(&ProgramViewed::new("cs_data", "Master of Data Science"));
//!
//! // Both addresses of a student resolve to the same id.
//! let id = identity::resolve("Jane.Doe@Example.com ");
//! assert_eq!(id, identity::resolve("jane.doe@example.com"));
//! emitter.log_in(id, Traits::with_email("jane.doe@example.com"), "email");
//!
//! emitter.track(&EventRsvped::new("e1", "Open Day", "2024-12-20T18:00:00Z"));
//! emitter.reset();
//!
//! assert_eq!(recorder.tracked("Event RSVPed")[0]["user_id"], "user_4396f837");
//! ```
pub mod config;
pub mod emitter;
pub mod error;
pub mod events;
pub mod flows;
mod http;
#[cfg(feature = "tokio")]
mod http_async;
#[cfg(feature = "blocking")]
mod http_blocking;
pub mod identity;
pub mod profile;
mod serde;
pub mod session;
pub mod sink;

pub use config::{Builder, Config};
pub use emitter::Emitter;
pub use error::{Error, Result};
pub use identity::Identity;

#[cfg(feature = "tokio")]
pub use http_async::BatchSink;
#[cfg(feature = "blocking")]
pub use http_blocking::HttpSink;

#[doc = include_str!("../README.md")]
#[cfg(doctest)]
pub struct ReadmeDoctests;

#[cfg(all(feature = "default-tls", feature = "native-tls"))]
compile_error!("Feature \"default-tls\" and \"native-tls\" cannot be enabled at the same time");

#[cfg(all(feature = "native-tls", feature = "rustls-tls"))]
compile_error!("Feature \"native-tls\" and \"rustls-tls\" cannot be enabled at the same time");

#[cfg(all(feature = "rustls-tls", feature = "default-tls"))]
compile_error!("Feature \"rustls-tls\" and \"default-tls\" cannot be enabled at the same time");
