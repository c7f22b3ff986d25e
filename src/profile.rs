//! User profiles and the trait snapshots sent with identify calls.
use bitflags::bitflags;
use chrono::{DateTime, Utc};
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::{
    fmt::{self, Display},
    str::FromStr,
};

use crate::{
    error::Error,
    identity::{self, Identity},
    serde::serialize_iso8601_opt,
};

/// A communication channel.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    #[default]
    Email,
    Whatsapp,
    Sms,
}

impl Channel {
    /// Returns the channel as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Whatsapp => "whatsapp",
            Channel::Sms => "sms",
        }
    }
}

impl Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(Channel::Email),
            "whatsapp" => Ok(Channel::Whatsapp),
            "sms" => Ok(Channel::Sms),
            _ => Err(Error::UnknownChannel(s.to_string())),
        }
    }
}

/// What a message on a channel is used for.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Purpose {
    Marketing,
    Transactional,
}

impl Purpose {
    /// Returns the purpose as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Purpose::Marketing => "marketing",
            Purpose::Transactional => "transactional",
        }
    }
}

impl Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Purpose {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "marketing" => Ok(Purpose::Marketing),
            "transactional" => Ok(Purpose::Transactional),
            _ => Err(Error::UnknownPurpose(s.to_string())),
        }
    }
}

bitflags! {
    /// Opt-ins per channel and purpose.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Consent: u8 {
        const EMAIL_MARKETING = 0b0001;
        const EMAIL_TRANSACTIONAL = 0b0010;
        const WHATSAPP_MARKETING = 0b0100;
        const WHATSAPP_TRANSACTIONAL = 0b1000;
    }
}

impl Default for Consent {
    /// Marketing off, transactional on.
    fn default() -> Self {
        Consent::EMAIL_TRANSACTIONAL | Consent::WHATSAPP_TRANSACTIONAL
    }
}

impl Consent {
    /// The flag for a channel and purpose. SMS has no opt-in flags.
    pub fn flag(channel: Channel, purpose: Purpose) -> Option<Consent> {
        match (channel, purpose) {
            (Channel::Email, Purpose::Marketing) => Some(Consent::EMAIL_MARKETING),
            (Channel::Email, Purpose::Transactional) => Some(Consent::EMAIL_TRANSACTIONAL),
            (Channel::Whatsapp, Purpose::Marketing) => Some(Consent::WHATSAPP_MARKETING),
            (Channel::Whatsapp, Purpose::Transactional) => Some(Consent::WHATSAPP_TRANSACTIONAL),
            (Channel::Sms, _) => None,
        }
    }

    /// Whether the user opted in to `purpose` messages on `channel`.
    pub fn allows(&self, channel: Channel, purpose: Purpose) -> bool {
        Consent::flag(channel, purpose).map_or(false, |flag| self.contains(flag))
    }

    /// Sets or clears one opt-in. Returns false for pairs without a flag.
    pub fn set_opt_in(&mut self, channel: Channel, purpose: Purpose, value: bool) -> bool {
        match Consent::flag(channel, purpose) {
            Some(flag) => {
                self.set(flag, value);
                true
            }
            None => false,
        }
    }
}

impl Serialize for Consent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(4))?;
        map.serialize_entry(
            "email_marketing_opt_in",
            &self.contains(Consent::EMAIL_MARKETING),
        )?;
        map.serialize_entry(
            "email_transactional_opt_in",
            &self.contains(Consent::EMAIL_TRANSACTIONAL),
        )?;
        map.serialize_entry(
            "whatsapp_marketing_opt_in",
            &self.contains(Consent::WHATSAPP_MARKETING),
        )?;
        map.serialize_entry(
            "whatsapp_transactional_opt_in",
            &self.contains(Consent::WHATSAPP_TRANSACTIONAL),
        )?;
        map.end()
    }
}

/// A trait snapshot for one identify call.
///
/// It holds a single `email`. Sending the personal and the institutional
/// address in separate calls for the same id is what lets the downstream
/// identity resolution merge the two profiles.
#[derive(Serialize, Debug, Clone, Default, PartialEq)]
pub struct Traits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_channel: Option<Channel>,
    #[serde(flatten)]
    pub consent: Option<Consent>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_iso8601_opt"
    )]
    pub created_at: Option<DateTime<Utc>>,
    /// Anything else, e.g. the system a login came from.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Traits {
    /// Traits holding only an email address.
    pub fn with_email<S: Into<String>>(email: S) -> Self {
        Self {
            email: Some(email.into()),
            ..Default::default()
        }
    }

    /// Adds a free-form trait.
    pub fn insert<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Which of a profile's addresses goes into a trait snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailKind {
    Personal,
    Institutional,
}

impl EmailKind {
    /// The `email_type` reported alongside logins.
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailKind::Personal => "personal",
            EmailKind::Institutional => "institutional",
        }
    }
}

/// Everything known about a student.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub user_id: Identity,
    pub email_personal: String,
    pub email_institutional: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub program: Option<String>,
    pub semester: Option<String>,
    pub preferred_channel: Channel,
    pub consent: Consent,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Creates a profile for a personal address. The id is resolved from the
    /// address and the institutional address lives under `institution_domain`.
    pub fn new<S: Into<String>>(email_personal: S, institution_domain: &str) -> Self {
        let email_personal = email_personal.into();
        Self {
            user_id: identity::resolve(&email_personal),
            email_institutional: identity::institution_email(
                email_personal.trim(),
                institution_domain,
            ),
            email_personal,
            first_name: None,
            last_name: None,
            phone: None,
            program: None,
            semester: None,
            preferred_channel: Channel::default(),
            consent: Consent::default(),
            created_at: Utc::now(),
        }
    }

    /// First and last name joined, if either is known.
    pub fn full_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{first} {last}")),
            (Some(name), None) | (None, Some(name)) => Some(name.clone()),
            (None, None) => None,
        }
    }

    /// The address of the given kind.
    pub fn email(&self, kind: EmailKind) -> &str {
        match kind {
            EmailKind::Personal => &self.email_personal,
            EmailKind::Institutional => &self.email_institutional,
        }
    }

    /// A trait snapshot carrying exactly one of the profile's addresses.
    pub fn traits(&self, kind: EmailKind) -> Traits {
        Traits {
            email: Some(self.email(kind).to_string()),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            name: self.full_name(),
            phone: self.phone.clone(),
            program: self.program.clone(),
            semester: self.semester.clone(),
            preferred_channel: Some(self.preferred_channel),
            consent: Some(self.consent),
            created_at: Some(self.created_at),
            extra: Map::new(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_consent_defaults() {
        let consent = Consent::default();
        assert!(consent.allows(Channel::Email, Purpose::Transactional));
        assert!(consent.allows(Channel::Whatsapp, Purpose::Transactional));
        assert!(!consent.allows(Channel::Email, Purpose::Marketing));
        assert!(!consent.allows(Channel::Sms, Purpose::Transactional));
    }

    #[test]
    fn test_consent_set_opt_in() {
        let mut consent = Consent::default();
        assert!(consent.set_opt_in(Channel::Whatsapp, Purpose::Marketing, true));
        assert!(consent.allows(Channel::Whatsapp, Purpose::Marketing));
        assert!(!consent.set_opt_in(Channel::Sms, Purpose::Marketing, true));
    }

    #[test]
    fn test_consent_serializes_false_flags() {
        let value = serde_json::to_value(Consent::EMAIL_MARKETING).unwrap();
        assert_eq!(
            value,
            json!({
                "email_marketing_opt_in": true,
                "email_transactional_opt_in": false,
                "whatsapp_marketing_opt_in": false,
                "whatsapp_transactional_opt_in": false,
            })
        );
    }

    #[test]
    fn test_empty_traits_serialize_to_empty_object() {
        let value = serde_json::to_value(Traits::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_profile_traits_carry_one_email() {
        let mut profile = Profile::new("Jane.Doe@example.com", "student.iu.org");
        profile.first_name = Some("Jane".to_string());
        profile.last_name = Some("Doe".to_string());

        let value = serde_json::to_value(profile.traits(EmailKind::Institutional)).unwrap();
        let traits = value.as_object().unwrap();
        assert_eq!(traits["email"], json!("Jane.Doe@student.iu.org"));
        assert_eq!(traits["name"], json!("Jane Doe"));
        assert_eq!(traits["preferred_channel"], json!("email"));
        assert_eq!(traits["email_transactional_opt_in"], json!(true));
        let emails = traits
            .iter()
            .filter(|(_, value)| value.as_str().map_or(false, |v| v.contains('@')))
            .count();
        assert_eq!(emails, 1);
    }

    #[test]
    fn test_channel_round_trip() {
        for channel in [Channel::Email, Channel::Whatsapp, Channel::Sms] {
            assert_eq!(channel.as_str().parse::<Channel>().unwrap(), channel);
        }
        assert!(matches!(
            "pigeon".parse::<Channel>(),
            Err(Error::UnknownChannel(_))
        ));
    }
}
