//! The event sequences behind the demo's forms.
//!
//! Each function is what one form submission or click sends. Rendering and
//! storing the profile stay with the caller.
use crate::{
    emitter::Emitter,
    events::{
        ApplicationStarted, ApplicationSubmitted, ConsentUpdated, ContactPreferenceSet,
        EngagementEvent, EventRsvped, OnboardingStep, OnboardingStepCompleted, PageViewed,
        ProgramViewed, SessionStarted, SystemLogin,
    },
    profile::{Channel, Consent, EmailKind, Profile, Purpose, Traits},
    sink::Sink,
};

/// Login method reported for email/password logins.
pub static METHOD_EMAIL: &str = "email";

/// What the signup form collects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_personal: String,
    pub phone: Option<String>,
    pub program: String,
    pub semester: Option<String>,
    pub preferred_channel: Channel,
    pub email_marketing_opt_in: bool,
    pub whatsapp_marketing_opt_in: bool,
}

impl SignupForm {
    /// Builds the profile the form describes. Transactional messages are
    /// always opted in.
    pub fn into_profile(self, institution_domain: &str) -> Profile {
        let mut profile = Profile::new(self.email_personal, institution_domain);
        profile.first_name = self.first_name;
        profile.last_name = self.last_name;
        profile.phone = self.phone;
        profile.program = Some(self.program);
        profile.semester = self.semester;
        profile.preferred_channel = self.preferred_channel;
        profile.consent = Consent::default();
        profile
            .consent
            .set(Consent::EMAIL_MARKETING, self.email_marketing_opt_in);
        profile
            .consent
            .set(Consent::WHATSAPP_MARKETING, self.whatsapp_marketing_opt_in);
        profile
    }
}

/// What the consent settings form collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsentForm {
    pub email_marketing_opt_in: bool,
    pub whatsapp_marketing_opt_in: bool,
    pub preferred_channel: Channel,
}

/// Display name of a programme, or the id itself when it is not in the
/// catalogue.
pub fn program_name(program_id: &str) -> &str {
    match program_id {
        "business_mba" => "Master of Business Administration (MBA)",
        "business_marketing" => "Bachelor of Marketing",
        "cs_software" => "Bachelor of Software Engineering",
        "cs_data" => "Master of Data Science",
        "health_psychology" => "Bachelor of Psychology",
        "design_ux" => "Bachelor of UX/UI Design",
        _ => program_id,
    }
}

/// Display name of a programme category, or the category itself.
pub fn category_name(category: &str) -> &str {
    match category {
        "business" => "Business & Management",
        "tech" => "Computer Science & IT",
        "health" => "Health & Social Work",
        "design" => "Design & Architecture",
        _ => category,
    }
}

/// Where a page load happened, as the browser reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLoad {
    pub url: String,
    pub path: String,
    pub hash: String,
    pub title: String,
    /// Empty or missing for direct traffic.
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

/// A page of the site was loaded: records the page view under its site name,
/// then starts the tracking session.
pub fn page_loaded<S: Sink>(emitter: &mut Emitter<S>, load: &PageLoad) {
    let referrer = load
        .referrer
        .as_deref()
        .filter(|referrer| !referrer.is_empty())
        .unwrap_or("direct");
    let page = PageViewed::new(PageViewed::page_name(&load.path, &load.hash, &load.title))
        .with_title(&load.title)
        .with_url(&load.url)
        .with_path(&load.path)
        .with_referrer(referrer);
    emitter.page(&page);
    emitter.track(&SessionStarted::new(
        load.user_agent.clone(),
        load.referrer.clone(),
    ));
}

/// A new student signs up for a programme.
pub fn sign_up<S: Sink>(
    emitter: &mut Emitter<S>,
    form: SignupForm,
    institution_domain: &str,
) -> Profile {
    let profile = form.into_profile(institution_domain);
    let program = profile.program.clone().unwrap_or_default();
    let name = program_name(&program).to_string();

    emitter.track(&ApplicationStarted::new(&program).with_program_name(&name));
    emitter.log_in(
        &profile.user_id,
        profile.traits(EmailKind::Personal),
        METHOD_EMAIL,
    );
    emitter.track(&ApplicationSubmitted::new(&program).with_program_name(&name));

    let mut account_created = OnboardingStepCompleted::new(OnboardingStep::AccountCreated, true)
        .with_metadata("program", program.as_str());
    if let Some(semester) = &profile.semester {
        account_created = account_created.with_metadata("semester", semester.as_str());
    }
    emitter.track(&account_created);
    emitter.track(&OnboardingStepCompleted::new(
        OnboardingStep::ProfileCompleted,
        true,
    ));

    for channel in [Channel::Email, Channel::Whatsapp] {
        emitter.track(&ConsentUpdated::new(
            channel,
            Purpose::Marketing,
            profile.consent.allows(channel, Purpose::Marketing),
        ));
    }
    emitter.track(&ContactPreferenceSet::new(profile.preferred_channel));

    profile
}

/// A returning student logs in to myCampus.
pub fn log_in<S: Sink>(emitter: &mut Emitter<S>, profile: &Profile) {
    emitter.log_in(
        &profile.user_id,
        profile.traits(EmailKind::Personal),
        METHOD_EMAIL,
    );
    emitter.track(
        &OnboardingStepCompleted::new(OnboardingStep::MycampusLogin, true)
            .with_metadata("login_method", "email_password"),
    );
    emitter.track(
        &EngagementEvent::new("mycampus_login").with_detail("login_method", "email_password"),
    );
}

/// The consent form was saved. Only changed settings are tracked; the user
/// is identified again with the updated traits either way.
pub fn update_consent<S: Sink>(emitter: &mut Emitter<S>, profile: &mut Profile, form: ConsentForm) {
    let changes = [
        (Channel::Email, form.email_marketing_opt_in),
        (Channel::Whatsapp, form.whatsapp_marketing_opt_in),
    ];
    for (channel, value) in changes {
        if profile.consent.allows(channel, Purpose::Marketing) != value {
            profile.consent.set_opt_in(channel, Purpose::Marketing, value);
            emitter.track(&ConsentUpdated::new(channel, Purpose::Marketing, value));
        }
    }

    if profile.preferred_channel != form.preferred_channel {
        profile.preferred_channel = form.preferred_channel;
        emitter.track(&ContactPreferenceSet::new(form.preferred_channel));
    }

    emitter.identify(&profile.user_id, profile.traits(EmailKind::Personal));
}

/// The same student logs in to another institution system with the
/// institutional address. Same id, different single email: downstream
/// identity resolution merges the two.
pub fn link_institution_login<S: Sink>(emitter: &mut Emitter<S>, profile: &Profile, system: &str) {
    let traits = Traits::with_email(profile.email(EmailKind::Institutional))
        .insert("system", system)
        .insert("login_method", "sso");
    emitter.identify(&profile.user_id, traits);
    emitter.track(&SystemLogin {
        system: system.to_string(),
        email_type: EmailKind::Institutional.as_str().to_string(),
    });
}

/// A category card was opened.
pub fn view_program_category<S: Sink>(emitter: &mut Emitter<S>, category: &str) {
    emitter.track(
        &ProgramViewed::new(format!("category_{category}"), category_name(category))
            .with_category(category),
    );
    emitter.track(&EngagementEvent::new("category_browsed").with_detail("category", category));
}

/// RSVP to an information event. Only logged-in students can RSVP; returns
/// false and sends nothing otherwise.
pub fn rsvp<S: Sink>(emitter: &mut Emitter<S>, event: &EventRsvped) -> bool {
    if !emitter.session().is_logged_in() {
        return false;
    }
    emitter.track(event);
    true
}

/// The student logs out.
pub fn log_out<S: Sink>(emitter: &mut Emitter<S>) {
    emitter.reset();
}
