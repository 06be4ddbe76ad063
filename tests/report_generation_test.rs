use readiness::openai::ChatClient;
use readiness::report;
use readiness::session::Session;
use wiremock::matchers::{body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [{"message": {"role": "assistant", "content": text}}]
    })
}

#[tokio::test]
async fn generate_embeds_every_recorded_pair_in_one_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(serde_json::json!({"stream": false})))
        .and(body_string_contains("data_readiness"))
        .and(body_string_contains("Q1"))
        .and(body_string_contains("A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Your report.")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new("test-key").unwrap().with_base_url(server.uri());
    let mut session = Session::new();
    session.record_response("data_readiness", "Q1".into(), "A1".into());
    session.mark_complete();

    let text = report::generate(&client, session.responses()).await.unwrap();
    assert_eq!(text, "Your report.");
}

#[tokio::test]
async fn generate_covers_ad_hoc_buckets_too() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("unknown_area"))
        .and(body_string_contains("ad-hoc answer"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Report text")))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new("test-key").unwrap().with_base_url(server.uri());
    let mut session = Session::new();
    session.record_response("unknown_area", "Q".into(), "ad-hoc answer".into());
    session.mark_complete();

    let text = report::generate(&client, session.responses()).await.unwrap();
    assert_eq!(text, "Report text");
}

#[tokio::test]
async fn generate_reinvocation_requeries_the_api() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body("Fresh report")))
        .expect(2)
        .mount(&server)
        .await;

    let client = ChatClient::new("test-key").unwrap().with_base_url(server.uri());
    let mut session = Session::new();
    session.record_response("business_alignment", "Q".into(), "A".into());
    session.mark_complete();

    // No caching: each call produces one outbound request.
    report::generate(&client, session.responses()).await.unwrap();
    report::generate(&client, session.responses()).await.unwrap();
}

#[tokio::test]
async fn generate_surfaces_remote_failure_unretried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new("bad-key").unwrap().with_base_url(server.uri());
    let mut session = Session::new();
    session.record_response("data_readiness", "Q".into(), "A".into());
    session.mark_complete();

    let err = report::generate(&client, session.responses()).await.unwrap_err();
    assert!(err.to_string().contains("401"));
}
