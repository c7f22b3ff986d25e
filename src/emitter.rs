//! Normalize events and forward them to a sink.
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    error::Result,
    events::{Event, PageViewed, UserLoggedIn, UserLoggedOut},
    identity::Identity,
    profile::Traits,
    serde::{now_iso8601, strip_nulls},
    session::Session,
    sink::{Properties, Sink},
};

/// Keys callers used for the email before it was sent as a single `email`
/// trait, in order of preference.
const ALTERNATE_EMAIL_KEYS: [&str; 4] = [
    "email_personal",
    "emailPersonal",
    "email_iu",
    "email_institutional",
];

/// The emitter owns the tracking [`Session`] and a [`Sink`].
///
/// Every operation runs to completion synchronously and never fails: sink
/// errors are logged and dropped.
///
/// # Examples
/// ```
/// use campus_analytics::{events::EventRsvped, identity, profile::Traits, sink::Recorder, Emitter};
///
/// let recorder = Recorder::default();
/// let mut emitter = Emitter::new(recorder.clone());
///
/// let id = identity::resolve("jane.doe@example.com");
/// emitter.log_in(id, Traits::with_email("jane.doe@example.com"), "email");
/// emitter.track(&EventRsvped::new("e1", "Open Day", "2024-12-20T18:00:00Z"));
/// emitter.reset();
///
/// assert_eq!(recorder.tracked("User Logged Out").len(), 1);
/// ```
#[derive(Debug)]
pub struct Emitter<S> {
    sink: S,
    session: Session,
}

impl<S: Sink> Emitter<S> {
    /// Creates an emitter with a fresh anonymous session.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            session: Session::new(),
        }
    }

    /// The current session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// The identity set by the last identify, if any.
    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    /// The sink calls are forwarded to.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Drops the session and returns the sink, e.g. to flush it.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Tracks an arbitrary named event.
    ///
    /// `null` fields are dropped, `timestamp` is set to now and `user_id` to
    /// the current identity (or removed when there is none).
    pub fn emit(&mut self, event: &str, fields: Properties) {
        let payload = self.normalize(fields, false);
        self.dispatch_track(event, payload);
    }

    /// Tracks a typed event. Session-scoped events also get `session_id`.
    pub fn track<E: Event>(&mut self, event: &E) {
        let Some(fields) = to_properties(event) else {
            return;
        };
        let payload = self.normalize(fields, event.is_session_scoped());
        self.dispatch_track(event.name(), payload);
    }

    /// Records a page view under the page's name.
    pub fn page(&mut self, page: &PageViewed) {
        let Some(fields) = to_properties(page) else {
            return;
        };
        let payload = self.normalize(fields, false);
        info!(page = %page.name, payload = %describe(&payload), "Page Viewed");
        report("page", self.sink.page(&page.name, &payload));
    }

    /// Attaches `traits` to `user_id` and makes it the session's identity.
    ///
    /// Only one email is ever sent per call. Calling this again with the same
    /// id and a different address is how two logins get linked downstream.
    pub fn identify<I: Into<Identity>>(&mut self, user_id: I, traits: Traits) {
        let user_id = user_id.into();
        let Some(traits) = to_properties(&traits) else {
            return;
        };
        let traits = normalize_traits(traits);
        info!(%user_id, email = ?traits.get("email"), "identify");
        report("identify", self.sink.identify(&user_id, &traits));
        self.session.identify(user_id, traits);
    }

    /// Identifies the user and tracks `User Logged In`.
    pub fn log_in<I: Into<Identity>>(&mut self, user_id: I, traits: Traits, method: &str) {
        self.identify(user_id, traits);
        self.track(&UserLoggedIn {
            method: method.to_string(),
        });
    }

    /// Ends the session.
    ///
    /// When someone is logged in, `User Logged Out` with the session duration
    /// is tracked first. The sink is reset and a new anonymous session starts.
    pub fn reset(&mut self) {
        if self.session.is_logged_in() {
            let session_duration = self.session.duration_millis();
            self.track(&UserLoggedOut { session_duration });
        }
        info!(session_id = self.session.id(), "reset");
        report("reset", self.sink.reset());
        self.session = Session::new();
    }

    fn normalize(&self, mut fields: Properties, session_scoped: bool) -> Properties {
        strip_nulls(&mut fields);
        fields.insert("timestamp".to_string(), Value::String(now_iso8601()));

        fields.remove("user_id");
        if let Some(identity) = self.session.identity() {
            fields.insert("user_id".to_string(), identity.clone().into());
        }

        fields.remove("session_id");
        if session_scoped {
            fields.insert(
                "session_id".to_string(),
                Value::String(self.session.id().to_string()),
            );
        }
        fields
    }

    fn dispatch_track(&mut self, event: &str, payload: Properties) {
        info!(event, payload = %describe(&payload), "track");
        report("track", self.sink.track(event, &payload));
    }
}

/// Leaves exactly one email address among the traits.
fn normalize_traits(mut traits: Properties) -> Properties {
    strip_nulls(&mut traits);
    if !traits.contains_key("email") {
        let promoted = ALTERNATE_EMAIL_KEYS
            .iter()
            .find_map(|key| traits.get(*key).cloned());
        if let Some(email) = promoted {
            traits.insert("email".to_string(), email);
        }
    }
    for key in ALTERNATE_EMAIL_KEYS {
        if traits.remove(key).is_some() {
            debug!(key, "dropped alternate email trait");
        }
    }
    traits
}

fn to_properties<T: Serialize>(value: &T) -> Option<Properties> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            warn!(?other, "event did not serialize to an object, dropped");
            None
        }
        Err(e) => {
            warn!(error = %e, "failed to serialize event, dropped");
            None
        }
    }
}

fn describe(payload: &Properties) -> String {
    serde_json::to_string(payload).unwrap_or_default()
}

fn report(call: &str, res: Result<()>) {
    if let Err(e) = res {
        warn!(call, error = %e, "sink call failed");
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::Error,
        events::{ApplicationStarted, ConsentUpdated, ProgramViewed},
        profile::{Channel, Purpose},
        sink::{Call, Recorder},
    };
    use serde_json::json;

    struct FailingSink;

    impl Sink for FailingSink {
        fn identify(&mut self, _: &Identity, _: &Properties) -> Result<()> {
            Err(Error::MissingWriteKey)
        }

        fn track(&mut self, _: &str, _: &Properties) -> Result<()> {
            Err(Error::MissingWriteKey)
        }

        fn page(&mut self, _: &str, _: &Properties) -> Result<()> {
            Err(Error::MissingWriteKey)
        }

        fn reset(&mut self) -> Result<()> {
            Err(Error::MissingWriteKey)
        }
    }

    fn props(value: Value) -> Properties {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_emit_strips_nulls_and_reserved_keys() {
        let recorder = Recorder::default();
        let mut emitter = Emitter::new(recorder.clone());
        emitter.emit(
            "Navigation Click",
            props(json!({
                "link_text": "Study",
                "link_url": null,
                "user_id": "spoofed",
                "session_id": "spoofed",
                "timestamp": "1970-01-01T00:00:00.000Z",
            })),
        );

        let payload = &recorder.tracked("Navigation Click")[0];
        assert_eq!(payload["link_text"], json!("Study"));
        assert!(!payload.contains_key("link_url"));
        assert!(!payload.contains_key("user_id"));
        assert!(!payload.contains_key("session_id"));
        assert_ne!(payload["timestamp"], json!("1970-01-01T00:00:00.000Z"));
    }

    #[test]
    fn test_track_attaches_identity_after_identify() {
        let recorder = Recorder::default();
        let mut emitter = Emitter::new(recorder.clone());

        emitter.track(&ProgramViewed::new("cs_data", "Data"));
        emitter.identify("user_abc", Traits::with_email("a@b.com"));
        emitter.track(&ProgramViewed::new("cs_data", "Data"));

        let payloads = recorder.tracked("Program Viewed");
        assert!(!payloads[0].contains_key("user_id"));
        assert_eq!(payloads[1]["user_id"], json!("user_abc"));
        assert!(!payloads[1].contains_key("session_id"));
    }

    #[test]
    fn test_session_id_is_stable_within_session() {
        let recorder = Recorder::default();
        let mut emitter = Emitter::new(recorder.clone());
        emitter.track(&ApplicationStarted::new("cs_data"));
        emitter.track(&ApplicationStarted::new("cs_data"));
        let first_session = emitter.session().id().to_string();
        emitter.reset();
        emitter.track(&ApplicationStarted::new("cs_data"));

        let payloads = recorder.tracked("Application Started");
        assert_eq!(payloads[0]["session_id"], json!(first_session));
        assert_eq!(payloads[0]["session_id"], payloads[1]["session_id"]);
        assert_ne!(payloads[1]["session_id"], payloads[2]["session_id"]);
    }

    #[test]
    fn test_identify_promotes_alternate_email() {
        let recorder = Recorder::default();
        let mut emitter = Emitter::new(recorder.clone());
        let traits = Traits::default()
            .insert("email_personal", "a@b.com")
            .insert("email_iu", "a@student.iu.org");
        emitter.identify("user_abc", traits);

        match &recorder.calls()[0] {
            Call::Identify { user_id, traits } => {
                assert_eq!(user_id.as_str(), "user_abc");
                assert_eq!(traits, &props(json!({"email": "a@b.com"})));
            }
            call => panic!("Expected identify, got {:?}", call),
        }
        assert_eq!(emitter.session().traits()["email"], json!("a@b.com"));
    }

    #[test]
    fn test_identify_keeps_explicit_email() {
        let mut traits =
            Traits::with_email("a@student.iu.org").insert("email_personal", "a@b.com");
        traits.phone = Some("+49123456789".to_string());
        let traits = normalize_traits(to_properties(&traits).unwrap());
        assert_eq!(
            traits,
            props(json!({"email": "a@student.iu.org", "phone": "+49123456789"}))
        );
    }

    #[test]
    fn test_reset_without_identity_skips_logout() {
        let recorder = Recorder::default();
        let mut emitter = Emitter::new(recorder.clone());
        emitter.reset();
        assert_eq!(recorder.calls(), vec![Call::Reset]);
    }

    #[test]
    fn test_sink_errors_are_swallowed() {
        let mut emitter = Emitter::new(FailingSink);
        emitter.identify("user_abc", Traits::with_email("a@b.com"));
        emitter.track(&ConsentUpdated::new(Channel::Email, Purpose::Marketing, false));
        emitter.page(&PageViewed::new("Homepage"));
        emitter.reset();
        assert!(emitter.identity().is_none());
    }

    #[test]
    fn test_page_uses_page_name() {
        let recorder = Recorder::default();
        let mut emitter = Emitter::new(recorder.clone());
        emitter.page(&PageViewed::new("Study").with_path("/index.html"));

        match &recorder.calls()[0] {
            Call::Page { name, properties } => {
                assert_eq!(name, "Study");
                assert_eq!(properties["page_name"], json!("Study"));
                assert_eq!(properties["path"], json!("/index.html"));
                assert!(properties.contains_key("timestamp"));
                assert!(!properties.contains_key("title"));
            }
            call => panic!("Expected page, got {:?}", call),
        }
    }
}
