use http::header::AUTHORIZATION;
use std::fmt;
use tracing::instrument;
use ureq::Agent;
use url::Url;

use crate::{
    config::Config,
    error::{ApiError, Error, Result},
    http::{authorization, USER_AGENT},
    identity::Identity,
    sink::{
        message::{random_id, Message},
        Properties, Sink,
    },
};

/// Posts every call to the tracking API before returning.
///
/// Failed requests are not retried.
pub struct HttpSink {
    agent: Agent,
    base_url: Url,
    authorization: String,
    anonymous_id: String,
}

impl fmt::Debug for HttpSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpSink")
            .field("base_url", &self.base_url.as_str())
            .field("anonymous_id", &self.anonymous_id)
            .finish_non_exhaustive()
    }
}

impl HttpSink {
    /// Creates a new sink.
    pub fn new(config: &Config) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .user_agent(USER_AGENT)
                .timeout(config.timeout)
                .build(),
            base_url: config.url.clone(),
            authorization: authorization(&config.write_key),
            anonymous_id: random_id(),
        }
    }

    /// The id calls are attributed to until a user is identified.
    pub fn anonymous_id(&self) -> &str {
        &self.anonymous_id
    }

    #[instrument(skip(self, message), fields(path = message.path()))]
    fn send(&self, message: &Message) -> Result<()> {
        let url = self
            .base_url
            .join(message.path())
            .map_err(Error::InvalidUrl)?;

        let res = self
            .agent
            .request_url("POST", &url)
            .set(AUTHORIZATION.as_str(), &self.authorization)
            .send_json(message);

        match res {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(status, res)) => {
                let body = res.into_string().ok().filter(|body| !body.is_empty());
                Err(Error::Api(ApiError::new(status, url.path(), body)))
            }
            Err(e) => Err(Error::Transport(Box::new(e))),
        }
    }
}

impl Sink for HttpSink {
    fn identify(&mut self, user_id: &Identity, traits: &Properties) -> Result<()> {
        self.send(&Message::identify(&self.anonymous_id, user_id, traits))
    }

    fn track(&mut self, event: &str, properties: &Properties) -> Result<()> {
        self.send(&Message::track(&self.anonymous_id, event, properties))
    }

    fn page(&mut self, name: &str, properties: &Properties) -> Result<()> {
        self.send(&Message::page(&self.anonymous_id, name, properties))
    }

    fn reset(&mut self) -> Result<()> {
        self.anonymous_id = random_id();
        Ok(())
    }
}
