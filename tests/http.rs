#![cfg(feature = "blocking")]
use campus_analytics::{events::ProgramViewed, identity, profile::Traits, Builder};
use httpmock::prelude::*;
use serde_json::json;

#[test]
fn test_blocking_emitter_posts_each_call() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start();
    let identify = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/identify")
            .header("authorization", "Basic d2s6")
            .json_body_partial(r#"{"userId": "user_7dee0556", "traits": {"email": "a@b.com"}}"#);
        then.status(200).json_body(json!({ "success": true }));
    });
    let track = server.mock(|when, then| {
        when.method(POST)
            .path("/v1/track")
            .json_body_partial(r#"{"event": "Program Viewed", "userId": "user_7dee0556"}"#);
        then.status(200).json_body(json!({ "success": true }));
    });

    let mut emitter = Builder::new()
        .no_env()
        .with_write_key("wk")
        .with_url(server.base_url())
        .build_blocking()?;
    emitter.identify(identity::resolve("a@b.com"), Traits::with_email("a@b.com"));
    emitter.track(&ProgramViewed::new("cs_data", "Master of Data Science"));

    identify.assert();
    track.assert();
    Ok(())
}

#[test]
fn test_rejected_calls_do_not_reach_the_caller() -> Result<(), Box<dyn std::error::Error>> {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path("/v1/track");
        then.status(503);
    });

    let mut emitter = Builder::new()
        .no_env()
        .with_write_key("wk")
        .with_url(server.base_url())
        .build_blocking()?;
    emitter.emit("Scroll Depth", serde_json::Map::new());
    emitter.emit("Scroll Depth", serde_json::Map::new());

    mock.assert_hits(2);
    Ok(())
}
