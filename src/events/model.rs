use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

use super::OnboardingStep;
use crate::{
    error::Error,
    profile::{Channel, Purpose},
};

/// A trackable event.
///
/// The serialized form of the event becomes the property bag. The emitter
/// adds `timestamp`, `user_id` and, for session-scoped events, `session_id`.
pub trait Event: Serialize {
    /// The name the event is tracked under.
    fn name(&self) -> &str;

    /// Whether the event gets the session id attached.
    fn is_session_scoped(&self) -> bool {
        false
    }
}

macro_rules! named_event {
    ($ty:ty, $name:literal) => {
        impl Event for $ty {
            fn name(&self) -> &str {
                $name
            }
        }
    };
    ($ty:ty, $name:literal, session) => {
        impl Event for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn is_session_scoped(&self) -> bool {
                true
            }
        }
    };
}

/// A page view. Sent through the sink's `page` call under the page name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PageViewed {
    #[serde(rename = "page_name")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

impl PageViewed {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            title: None,
            url: None,
            path: None,
            referrer: None,
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_referrer<S: Into<String>>(mut self, referrer: S) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    /// The page name for a location on the site.
    ///
    /// Sections of the start page are named by their anchor, the demo guide
    /// has a fixed name and every other page goes by its title.
    pub fn page_name(path: &str, hash: &str, title: &str) -> String {
        if path == "/" || path.contains("index.html") {
            match hash {
                "#programs" => "Study",
                "#events" => "Information Events",
                "#about" => "About",
                _ => "Homepage",
            }
            .to_string()
        } else if path.contains("demo-guide") {
            "Demo Guide".to_string()
        } else {
            title.to_string()
        }
    }
}

/// A visitor opened a study programme.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProgramViewed {
    pub program_id: String,
    pub program_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl ProgramViewed {
    pub fn new<I, N>(program_id: I, program_name: N) -> Self
    where
        I: Into<String>,
        N: Into<String>,
    {
        Self {
            program_id: program_id.into(),
            program_name: program_name.into(),
            category: None,
        }
    }

    pub fn with_category<S: Into<String>>(mut self, category: S) -> Self {
        self.category = Some(category.into());
        self
    }
}

named_event!(ProgramViewed, "Program Viewed");

/// An application was opened.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApplicationStarted {
    pub program_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_name: Option<String>,
}

impl ApplicationStarted {
    pub fn new<S: Into<String>>(program_id: S) -> Self {
        Self {
            program_id: program_id.into(),
            program_name: None,
        }
    }

    pub fn with_program_name<S: Into<String>>(mut self, program_name: S) -> Self {
        self.program_name = Some(program_name.into());
        self
    }
}

named_event!(ApplicationStarted, "Application Started", session);

/// An application was sent off.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ApplicationSubmitted {
    pub program_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_name: Option<String>,
}

impl ApplicationSubmitted {
    pub fn new<S: Into<String>>(program_id: S) -> Self {
        Self {
            program_id: program_id.into(),
            program_name: None,
        }
    }

    pub fn with_program_name<S: Into<String>>(mut self, program_name: S) -> Self {
        self.program_name = Some(program_name.into());
        self
    }
}

named_event!(ApplicationSubmitted, "Application Submitted", session);

/// An RSVP to an information event or webinar.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventRsvped {
    pub event_id: String,
    pub title: String,
    /// Start time as given by the event listing.
    pub starts_at: String,
}

impl EventRsvped {
    pub fn new<I, T, S>(event_id: I, title: T, starts_at: S) -> Self
    where
        I: Into<String>,
        T: Into<String>,
        S: Into<String>,
    {
        Self {
            event_id: event_id.into(),
            title: title.into(),
            starts_at: starts_at.into(),
        }
    }
}

named_event!(EventRsvped, "Event RSVPed", session);

/// An opt-in changed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentUpdated {
    pub channel: Channel,
    pub purpose: Purpose,
    pub value: bool,
}

impl ConsentUpdated {
    pub fn new(channel: Channel, purpose: Purpose, value: bool) -> Self {
        Self {
            channel,
            purpose,
            value,
        }
    }
}

named_event!(ConsentUpdated, "Consent Updated");

/// The preferred channel changed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactPreferenceSet {
    pub preferred_channel: Channel,
}

impl ContactPreferenceSet {
    pub fn new(preferred_channel: Channel) -> Self {
        Self { preferred_channel }
    }
}

named_event!(ContactPreferenceSet, "Contact Preference Set");

/// Payment state of an invoice.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    Paid,
    Pending,
    Overdue,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::Overdue => "overdue",
        }
    }
}

impl Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "paid" => Ok(InvoiceStatus::Paid),
            "pending" => Ok(InvoiceStatus::Pending),
            "overdue" => Ok(InvoiceStatus::Overdue),
            _ => Err(Error::UnknownInvoiceStatus(s.to_string())),
        }
    }
}

/// A student looked at an invoice.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InvoiceViewed {
    pub invoice_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
}

impl InvoiceViewed {
    pub fn new<S: Into<String>>(invoice_id: S) -> Self {
        Self {
            invoice_id: invoice_id.into(),
            amount: None,
            status: None,
        }
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_status(mut self, status: InvoiceStatus) -> Self {
        self.status = Some(status);
        self
    }
}

named_event!(InvoiceViewed, "Invoice Viewed");

/// A generic engagement signal, e.g. `mycampus_login` or `video_watched`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EngagementEvent {
    pub event_type: String,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl EngagementEvent {
    pub fn new<S: Into<String>>(event_type: S) -> Self {
        Self {
            event_type: event_type.into(),
            details: Map::new(),
        }
    }

    pub fn with_detail<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.details.insert(key.into(), value.into());
        self
    }
}

named_event!(EngagementEvent, "Engagement Event", session);

/// Progress on an onboarding step, tracked under the step's own name.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct OnboardingStepCompleted {
    pub step: OnboardingStep,
    pub completed: bool,
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl OnboardingStepCompleted {
    pub fn new(step: OnboardingStep, completed: bool) -> Self {
        Self {
            step,
            completed,
            metadata: Map::new(),
        }
    }

    pub fn with_metadata<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl Event for OnboardingStepCompleted {
    fn name(&self) -> &str {
        self.step.event_name()
    }
}

/// Sent by the emitter after an identify that starts a login.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserLoggedIn {
    pub method: String,
}

named_event!(UserLoggedIn, "User Logged In");

/// Sent by the emitter right before a reset.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserLoggedOut {
    /// Milliseconds since the session started.
    pub session_duration: u64,
}

named_event!(UserLoggedOut, "User Logged Out");

/// A browsing session began.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionStarted {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub referrer: String,
}

impl SessionStarted {
    /// A session without a known referrer counts as direct traffic.
    pub fn new(user_agent: Option<String>, referrer: Option<String>) -> Self {
        Self {
            user_agent,
            referrer: referrer
                .filter(|referrer| !referrer.is_empty())
                .unwrap_or_else(|| "direct".to_string()),
        }
    }
}

named_event!(SessionStarted, "Session Started");

/// A login into another institution system, e.g. myCampus via SSO.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SystemLogin {
    pub system: String,
    pub email_type: String,
}

named_event!(SystemLogin, "System Login");

/// A link in the main navigation was clicked.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NavigationClick {
    pub link_text: String,
    pub link_url: String,
}

named_event!(NavigationClick, "Navigation Click");

/// A form field received focus.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FormFieldFocused {
    pub field_name: String,
    pub field_type: String,
}

named_event!(FormFieldFocused, "Form Field Focused");

/// The visitor scrolled past a depth threshold.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollDepth {
    pub depth_percentage: u8,
}

named_event!(ScrollDepth, "Scroll Depth");

/// A reminder for an information event went out.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventReminderSent {
    pub event_id: String,
    pub reminder_type: Channel,
    pub hours_before: u32,
}

named_event!(EventReminderSent, "Event Reminder Sent");

/// A student attended an information event.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EventAttended {
    pub event_id: String,
    pub attendance_duration_minutes: u32,
    /// Between 0 and 1.
    pub engagement_score: f64,
}

named_event!(EventAttended, "Event Attended");

/// The RSVP confirmation mail went out.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventConfirmationEmailSent {
    pub event_id: String,
}

named_event!(EventConfirmationEmailSent, "Event Confirmation Email Sent");

/// Any other named event.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Custom {
    #[serde(skip)]
    pub name: String,
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Custom {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            properties: Map::new(),
        }
    }

    pub fn with_property<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.properties.insert(key.into(), value.into());
        self
    }
}

impl Event for Custom {
    fn name(&self) -> &str {
        &self.name
    }
}
