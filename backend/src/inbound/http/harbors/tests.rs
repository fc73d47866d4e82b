//! End-to-end coverage of the harbor upsert endpoint against in-memory
//! repositories.

use std::sync::{Arc, Mutex};

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use actix_web::{App, web};
use async_trait::async_trait;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::response::{
    EncodeError, FlushError, INTERNAL_ERROR_BODY, ResponseBody, StreamingResponseController,
};
use super::*;
use crate::domain::ports::{HarborRepository, HarborRepositoryError, MockHarborRepository};
use crate::domain::{Coordinates, Harbor, Unloc};

const USLAX_BODY: &str = r#"{
    "USLAX": {
        "name": "Los Angeles",
        "city": "Los Angeles",
        "country": "USA",
        "alias": ["Port of LA", "LA Harbor"],
        "regions": ["West Coast"],
        "coordinates": [-118.2437, 34.0522],
        "province": "California",
        "timezone": "America/Los_Angeles",
        "unlocs": ["USLAX"],
        "code": "53001"
    }
}"#;

/// Records every write in order.
#[derive(Default)]
struct RecordingRepository {
    writes: Mutex<Vec<Harbor>>,
}

impl RecordingRepository {
    fn writes(&self) -> Vec<Harbor> {
        self.writes.lock().expect("writes lock").clone()
    }

    fn codes(&self) -> Vec<String> {
        self.writes()
            .iter()
            .map(|harbor| harbor.unloc.to_string())
            .collect()
    }
}

#[async_trait]
impl HarborRepository for RecordingRepository {
    async fn upsert_harbor(&self, harbor: &Harbor) -> Result<(), HarborRepositoryError> {
        self.writes.lock().expect("writes lock").push(harbor.clone());
        Ok(())
    }

    async fn find_by_unloc(&self, unloc: &Unloc) -> Result<Option<Harbor>, HarborRepositoryError> {
        Ok(self
            .writes()
            .into_iter()
            .rev()
            .find(|harbor| &harbor.unloc == unloc))
    }
}

struct FailingController;

impl ResponseController for FailingController {
    fn flush(
        &self,
        _head: &mut actix_web::HttpResponseBuilder,
    ) -> Result<(), FlushError> {
        Err(FlushError::new("error flushing response"))
    }
}

struct FailingEncoder;

impl ResponseEncoder for FailingEncoder {
    fn encode(&self, _body: &ResponseBody) -> Result<web::Bytes, EncodeError> {
        Err(EncodeError::new("encoder unavailable"))
    }
}

#[fixture]
fn repository() -> Arc<RecordingRepository> {
    Arc::new(RecordingRepository::default())
}

async fn post_batch(state: HttpState, body: &str) -> (StatusCode, Value) {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .service(web::scope("/api/v1").service(upsert_harbors)),
    )
    .await;
    let request = actix_test::TestRequest::post()
        .uri("/api/v1/harbors")
        .insert_header(("content-type", "application/json"))
        .set_payload(body.to_owned())
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    let status = response.status();
    let body: Value = actix_test::read_body_json(response).await;
    (status, body)
}

fn error_message(body: &Value) -> &str {
    body.get("error")
        .and_then(Value::as_str)
        .expect("error field is a string")
}

#[rstest]
#[actix_web::test]
async fn stores_harbor_with_exact_field_values(repository: Arc<RecordingRepository>) {
    let (status, body) = post_batch(HttpState::new(repository.clone()), USLAX_BODY).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "harbors upserted" }));

    let stored = repository
        .find_by_unloc(&Unloc::new("USLAX").expect("valid code"))
        .await
        .expect("lookup")
        .expect("USLAX stored");
    assert_eq!(stored.name, "Los Angeles");
    assert_eq!(stored.city, "Los Angeles");
    assert_eq!(stored.country, "USA");
    assert_eq!(stored.alias, vec!["Port of LA", "LA Harbor"]);
    assert_eq!(stored.regions, vec!["West Coast"]);
    assert_eq!(
        stored.coordinates,
        Some(Coordinates {
            longitude: -118.2437,
            latitude: 34.0522,
        })
    );
    assert_eq!(stored.province.as_deref(), Some("California"));
    assert_eq!(stored.timezone.as_deref(), Some("America/Los_Angeles"));
    assert_eq!(stored.unlocs, vec!["USLAX"]);
    assert_eq!(stored.code.as_deref(), Some("53001"));
}

#[rstest]
#[actix_web::test]
async fn reports_every_missing_field_in_order(repository: Arc<RecordingRepository>) {
    let (status, body) = post_batch(
        HttpState::new(repository.clone()),
        r#"{"USLAX": {"city": "Los Angeles"}}"#,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let violations: Value =
        serde_json::from_str(error_message(&body)).expect("violations are JSON");
    assert_eq!(
        violations,
        json!([
            { "field": "name", "error": "name is a required field" },
            { "field": "country", "error": "country is a required field" }
        ])
    );
    assert!(repository.writes().is_empty());
}

#[rstest]
#[case::array_envelope("[]", "invalid JSON: expected '{' at start")]
#[case::empty_body("", "invalid JSON: expected '{' at start")]
#[case::boolean_key(r#"{true: {"name": "x"}}"#, "invalid JSON key")]
#[case::numeric_key(r#"{1: {"name": "x"}}"#, "invalid JSON key")]
#[case::array_value(r#"{"USLAX": []}"#, "invalid JSON harbor structure")]
#[case::null_value(r#"{"USLAX": null}"#, "invalid JSON harbor structure")]
#[case::wrong_field_type(r#"{"USLAX": {"name": ["x"]}}"#, "invalid JSON harbor structure")]
#[actix_web::test]
async fn malformed_bodies_are_rejected_before_storage(
    repository: Arc<RecordingRepository>,
    #[case] body: &str,
    #[case] expected: &str,
) {
    let (status, response) = post_batch(HttpState::new(repository.clone()), body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&response), expected);
    assert!(repository.writes().is_empty());
}

#[rstest]
#[case::missing_close(
    r#"{"USLAX": {"name": "a", "city": "b", "country": "c"}"#,
    "invalid JSON: expected '}' at end"
)]
#[case::trailing_comma(
    r#"{"USLAX": {"name": "a", "city": "b", "country": "c"},}"#,
    "invalid JSON key"
)]
#[case::later_invalid_record(
    r#"{"USLAX": {"name": "a", "city": "b", "country": "c"}, "NLRTM": {"name": "d"}}"#,
    r#"[{"field":"city","error":"city is a required field"},{"field":"country","error":"country is a required field"}]"#
)]
#[actix_web::test]
async fn earlier_entries_stay_stored_when_a_later_step_fails(
    repository: Arc<RecordingRepository>,
    #[case] body: &str,
    #[case] expected: &str,
) {
    let (status, response) = post_batch(HttpState::new(repository.clone()), body).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&response), expected);
    assert_eq!(repository.codes(), vec!["USLAX"]);
}

#[actix_web::test]
async fn storage_failure_stops_the_batch() {
    let mut repository = MockHarborRepository::new();
    repository
        .expect_upsert_harbor()
        .times(1)
        .returning(|_| Err(HarborRepositoryError::query("connection reset")));
    let body = r#"{
        "USLAX": {"name": "a", "city": "b", "country": "c"},
        "NLRTM": {"name": "d", "city": "e", "country": "f"}
    }"#;

    let (status, response) = post_batch(HttpState::new(Arc::new(repository)), body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response, json!({ "error": "error upserting harbor" }));
}

#[rstest]
#[actix_web::test]
async fn flush_failure_returns_its_message(repository: Arc<RecordingRepository>) {
    let state = HttpState::new(repository.clone()).with_responder(JsonResponder::new(
        Arc::new(response::SerdeJsonEncoder),
        Arc::new(FailingController),
    ));

    let (status, body) = post_batch(state, USLAX_BODY).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "error flushing response" }));
    assert_eq!(repository.codes(), vec!["USLAX"]);
}

#[rstest]
#[actix_web::test]
async fn encoder_failure_yields_fixed_internal_error(repository: Arc<RecordingRepository>) {
    let state = HttpState::new(repository).with_responder(JsonResponder::new(
        Arc::new(FailingEncoder),
        Arc::new(StreamingResponseController),
    ));

    let (status, body) = post_batch(state, USLAX_BODY).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let expected: Value = serde_json::from_str(INTERNAL_ERROR_BODY).expect("fixed body is JSON");
    assert_eq!(body, expected);
}

#[rstest]
#[actix_web::test]
async fn repeated_batches_write_identical_harbors(repository: Arc<RecordingRepository>) {
    let state = HttpState::new(repository.clone());

    let (first, _) = post_batch(state.clone(), USLAX_BODY).await;
    let (second, _) = post_batch(state, USLAX_BODY).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
    let writes = repository.writes();
    assert_eq!(writes.len(), 2);
    assert_eq!(writes[0], writes[1]);
}

#[rstest]
#[actix_web::test]
async fn outer_key_wins_over_inner_identity_fields(repository: Arc<RecordingRepository>) {
    let body = r#"{"USLAX": {
        "name": "Los Angeles", "city": "Los Angeles", "country": "USA",
        "unloc": "XXXXX", "code": "NLRTM"
    }}"#;

    let (status, _) = post_batch(HttpState::new(repository.clone()), body).await;

    assert_eq!(status, StatusCode::OK);
    let writes = repository.writes();
    assert_eq!(repository.codes(), vec!["USLAX"]);
    assert_eq!(writes[0].code.as_deref(), Some("NLRTM"));
}

#[rstest]
#[case::single(r#"[1.5]"#)]
#[case::triple(r#"[1, 2, 3]"#)]
#[actix_web::test]
async fn non_pair_coordinates_are_stored_as_absent(
    repository: Arc<RecordingRepository>,
    #[case] coordinates: &str,
) {
    let body = format!(
        r#"{{"USLAX": {{"name": "Los Angeles", "city": "Los Angeles", "country": "USA", "coordinates": {coordinates}}}}}"#
    );

    let (status, body) = post_batch(HttpState::new(repository.clone()), &body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "harbors upserted" }));
    let writes = repository.writes();
    assert_eq!(writes.len(), 1);
    assert!(writes[0].coordinates.is_none());
}

#[rstest]
#[actix_web::test]
async fn empty_batch_succeeds_without_writes(repository: Arc<RecordingRepository>) {
    let (status, body) = post_batch(HttpState::new(repository.clone()), " { } ").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "harbors upserted" }));
    assert!(repository.writes().is_empty());
}

#[rstest]
#[actix_web::test]
async fn handler_reads_any_buffered_body(repository: Arc<RecordingRepository>) {
    let handler = HarborUpsertHandler::new(repository.clone());

    let response = handler.handle(USLAX_BODY.as_bytes()).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(repository.codes(), vec!["USLAX"]);
}
