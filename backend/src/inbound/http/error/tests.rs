//! Tests for HTTP error rendering.

use super::*;
use actix_web::body::to_bytes;
use actix_web::{App, test as actix_test, web};
use rstest::rstest;
use serde_json::{Value, json};

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

async fn render(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let trace = response
        .headers()
        .get(TRACE_ID_HEADER)
        .map(|value| value.to_str().expect("ascii header").to_owned());
    let bytes = to_bytes(response.into_body()).await.expect("body");
    (status, trace, serde_json::from_slice(&bytes).expect("json"))
}

#[rstest]
#[case(Error::invalid_request("Email and role are required"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("Authentication required"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("Admin access required"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("Verification not found"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("An application is already pending"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("Failed to send OTP email"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("pool exhausted"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_follows_the_error_code(#[case] error: Error, #[case] expected: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), expected);
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_details_and_trace() {
    let error = Error::invalid_request("Invalid OTP")
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "reason": "otp_mismatch", "attemptsRemaining": 4 }));

    let (status, trace, body) = render(&error).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(trace.as_deref(), Some(TRACE_ID));
    assert_eq!(body["message"], "Invalid OTP");
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["details"]["attemptsRemaining"], 4);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted() {
    let error = Error::internal("connection refused at 10.0.0.3")
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "sql": "select *" }));

    let (status, trace, body) = render(&error).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(trace.as_deref(), Some(TRACE_ID));
    assert_eq!(body["message"], GENERIC_FAILURE);
    assert_eq!(body["traceId"], TRACE_ID);
    assert!(body.get("details").is_none());
}

#[rstest]
#[actix_web::test]
async fn responses_without_a_trace_omit_the_header() {
    let (_, trace, body) = render(&Error::not_found("User not found")).await;
    assert!(trace.is_none());
    assert!(body.get("traceId").is_none());
}

#[test]
fn framework_errors_become_generic_internal_errors() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), GENERIC_FAILURE);
    assert!(err.details().is_none());
}

#[derive(serde::Deserialize)]
struct Named {
    #[expect(dead_code, reason = "only deserialisation is exercised")]
    name: String,
}

async fn accept_named(_body: web::Json<Named>) -> HttpResponse {
    HttpResponse::Ok().finish()
}

#[rstest]
#[case("{not json", "application/json", "Invalid JSON body")]
#[case("name=x", "text/plain", "Request body must be JSON")]
#[actix_web::test]
async fn malformed_bodies_render_as_invalid_request(
    #[case] body: &'static str,
    #[case] content_type: &'static str,
    #[case] expected_prefix: &str,
) {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route("/named", web::post().to(accept_named)),
    )
    .await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/named")
            .insert_header(("content-type", content_type))
            .set_payload(body)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert!(
        body["message"]
            .as_str()
            .is_some_and(|message| message.starts_with(expected_prefix)),
        "unexpected message: {body}"
    );
}
