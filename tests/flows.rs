use campus_analytics::{
    flows::{self, SignupForm},
    identity::DEFAULT_INSTITUTION_DOMAIN,
    profile::Channel,
    sink::{Call, Recorder},
    Emitter,
};

fn form() -> SignupForm {
    SignupForm {
        first_name: Some("Max".to_string()),
        last_name: Some("Mustermann".to_string()),
        email_personal: "Max@uni.de".to_string(),
        phone: None,
        program: "cs_data".to_string(),
        semester: Some("2025_winter".to_string()),
        preferred_channel: Channel::Email,
        email_marketing_opt_in: true,
        whatsapp_marketing_opt_in: false,
    }
}

#[test]
fn test_signup_sequence() {
    let recorder = Recorder::default();
    let mut emitter = Emitter::new(recorder.clone());
    let profile = flows::sign_up(&mut emitter, form(), DEFAULT_INSTITUTION_DOMAIN);

    assert_eq!(profile.user_id.as_str(), "user_15cb5f65");
    let names: Vec<String> = recorder
        .calls()
        .iter()
        .filter_map(|call| call.event_name().map(str::to_string))
        .collect();
    assert_eq!(
        names,
        [
            "Application Started",
            "User Logged In",
            "Application Submitted",
            "Account Created",
            "Profile Completed",
            "Consent Updated",
            "Consent Updated",
            "Contact Preference Set",
        ]
    );

    let started = &recorder.tracked("Application Started")[0];
    assert!(!started.contains_key("user_id"));
    assert_eq!(started["program_name"], "Master of Data Science");
    let submitted = &recorder.tracked("Application Submitted")[0];
    assert_eq!(submitted["user_id"], "user_15cb5f65");
}

#[test]
fn test_institution_login_links_the_second_address() {
    let recorder = Recorder::default();
    let mut emitter = Emitter::new(recorder.clone());
    let profile = flows::sign_up(&mut emitter, form(), DEFAULT_INSTITUTION_DOMAIN);
    flows::link_institution_login(&mut emitter, &profile, "mycampus");

    let identifies: Vec<_> = recorder
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            Call::Identify { user_id, traits } => Some((user_id, traits)),
            _ => None,
        })
        .collect();
    assert_eq!(identifies.len(), 2);
    assert_eq!(identifies[0].0, identifies[1].0);
    assert_eq!(identifies[0].1["email"], "Max@uni.de");
    assert_eq!(identifies[1].1["email"], "Max@student.iu.org");
    assert_eq!(identifies[1].1["login_method"], "sso");

    let logins = recorder.tracked("System Login");
    assert_eq!(logins[0]["email_type"], "institutional");
}

#[test]
fn test_log_in_then_out() {
    let recorder = Recorder::default();
    let mut emitter = Emitter::new(recorder.clone());
    let profile = form().into_profile(DEFAULT_INSTITUTION_DOMAIN);

    flows::log_in(&mut emitter, &profile);
    assert_eq!(recorder.tracked("MyCampus Login").len(), 1);
    let engagement = &recorder.tracked("Engagement Event")[0];
    assert_eq!(engagement["event_type"], "mycampus_login");
    assert_eq!(engagement["session_id"], emitter.session().id());

    flows::log_out(&mut emitter);
    assert_eq!(recorder.tracked("User Logged Out").len(), 1);
    assert!(emitter.identity().is_none());
}
