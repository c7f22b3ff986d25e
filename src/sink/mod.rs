//! Where normalized calls end up.
//!
//! [`Sink`] is the capability the [`Emitter`](crate::Emitter) forwards to.
//! The crate ships a [`LogSink`], an in-memory [`Recorder`] and, depending on
//! the enabled features, a blocking `HttpSink` and a batching `BatchSink`.
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

use crate::{error::Result, identity::Identity};

pub(crate) mod message;

/// A field name to value mapping, as sent to the sink.
pub type Properties = Map<String, Value>;

/// An analytics backend.
///
/// Errors are reported to the emitter, which logs and drops them.
pub trait Sink {
    /// Attaches traits to a user.
    fn identify(&mut self, user_id: &Identity, traits: &Properties) -> Result<()>;
    /// Records an event.
    fn track(&mut self, event: &str, properties: &Properties) -> Result<()>;
    /// Records a page view.
    fn page(&mut self, name: &str, properties: &Properties) -> Result<()>;
    /// Forgets the current user.
    fn reset(&mut self) -> Result<()>;
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn identify(&mut self, user_id: &Identity, traits: &Properties) -> Result<()> {
        (**self).identify(user_id, traits)
    }

    fn track(&mut self, event: &str, properties: &Properties) -> Result<()> {
        (**self).track(event, properties)
    }

    fn page(&mut self, name: &str, properties: &Properties) -> Result<()> {
        (**self).page(name, properties)
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }
}

/// Writes every call to the log and nothing else.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl Sink for LogSink {
    fn identify(&mut self, user_id: &Identity, traits: &Properties) -> Result<()> {
        let traits = serde_json::to_string(traits)?;
        info!(%user_id, %traits, "identify");
        Ok(())
    }

    fn track(&mut self, event: &str, properties: &Properties) -> Result<()> {
        let properties = serde_json::to_string(properties)?;
        info!(event, %properties, "track");
        Ok(())
    }

    fn page(&mut self, name: &str, properties: &Properties) -> Result<()> {
        let properties = serde_json::to_string(properties)?;
        info!(name, %properties, "page");
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        info!("reset");
        Ok(())
    }
}

/// A call as received by a sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Identify {
        user_id: Identity,
        traits: Properties,
    },
    Track {
        event: String,
        properties: Properties,
    },
    Page {
        name: String,
        properties: Properties,
    },
    Reset,
}

impl Call {
    /// The event name of a track call.
    pub fn event_name(&self) -> Option<&str> {
        match self {
            Call::Track { event, .. } => Some(event.as_str()),
            _ => None,
        }
    }

    /// Properties of a track or page call, traits of an identify call.
    pub fn properties(&self) -> Option<&Properties> {
        match self {
            Call::Identify { traits, .. } => Some(traits),
            Call::Track { properties, .. } | Call::Page { properties, .. } => Some(properties),
            Call::Reset => None,
        }
    }
}

/// Keeps every call in memory. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Recorder {
    /// All calls so far, oldest first.
    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Track calls with the given event name.
    pub fn tracked(&self, event: &str) -> Vec<Properties> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Track {
                    event: name,
                    properties,
                } if name == event => Some(properties),
                _ => None,
            })
            .collect()
    }

    /// Forgets all calls.
    pub fn clear(&self) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn push(&self, call: Call) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl Sink for Recorder {
    fn identify(&mut self, user_id: &Identity, traits: &Properties) -> Result<()> {
        self.push(Call::Identify {
            user_id: user_id.clone(),
            traits: traits.clone(),
        });
        Ok(())
    }

    fn track(&mut self, event: &str, properties: &Properties) -> Result<()> {
        self.push(Call::Track {
            event: event.to_string(),
            properties: properties.clone(),
        });
        Ok(())
    }

    fn page(&mut self, name: &str, properties: &Properties) -> Result<()> {
        self.push(Call::Page {
            name: name.to_string(),
            properties: properties.clone(),
        });
        Ok(())
    }

    fn reset(&mut self) -> Result<()> {
        self.push(Call::Reset);
        Ok(())
    }
}
