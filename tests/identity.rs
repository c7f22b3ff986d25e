use campus_analytics::identity::{self, Identity};

#[test]
fn test_casing_and_whitespace_resolve_to_the_same_id() {
    let variants = [
        "jane.doe@example.com",
        "Jane.Doe@Example.com",
        "  JANE.DOE@EXAMPLE.COM\t",
        "jane.doe@example.com\n",
    ];
    let ids: Vec<Identity> = variants.iter().map(|email| identity::resolve(email)).collect();
    assert!(ids.iter().all(|id| id.as_str() == "user_4396f837"));
}

#[test]
fn test_known_ids() {
    let cases = [
        ("", "user_0"),
        ("a", "user_61"),
        ("a@b.com", "user_7dee0556"),
        ("john.smith@gmail.com", "user_31b5bf51"),
        ("max@uni.de", "user_15cb5f65"),
        ("x@student.iu.org", "user_31c20503"),
        ("ÉLISE@exämple.de", "user_db58216"),
        ("\u{feff}a@b.com", "user_7dee0556"),
        ("a@b.com\u{3000}", "user_7dee0556"),
        ("\u{85}a@b.com", "user_75ea5531"),
        ("a@b.com\u{200b}", "user_3fd2c575"),
    ];
    for (email, expected) in cases {
        assert_eq!(identity::resolve(email).as_str(), expected, "{email:?}");
    }
}

#[test]
fn test_ids_are_prefixed_lowercase_hex() {
    for email in ["bob@example.org", "alice@example.com", "zoë@example.net"] {
        let id = identity::resolve(email).into_inner();
        let digits = id.strip_prefix("user_").unwrap();
        assert!(!digits.is_empty() && digits.len() <= 8, "{id}");
        assert!(
            digits.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')),
            "{id}"
        );
    }
}

#[test]
fn test_personal_and_institutional_addresses_differ_but_ids_are_caller_chosen() {
    let personal = "Max@uni.de";
    let institutional = identity::institution_email(personal, identity::DEFAULT_INSTITUTION_DOMAIN);
    assert_eq!(institutional, "Max@student.iu.org");
    assert_ne!(identity::resolve(personal), identity::resolve(&institutional));
}
