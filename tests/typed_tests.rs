mod common;

use brrtbind::dispatcher::{Dispatcher, ResponseBody};
use brrtbind::error::BindingError;
use brrtbind::request::BindRequest;
use brrtbind::typed::{arg, FromArguments, TypedHandler, TypedRequest};
use brrtbind::{BoundArguments, ParameterLocation};
use chrono::{DateTime, Utc};
use common::manifests::{products_service, service_from_yaml};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Deserialize)]
struct TestObject {
    timestamp: DateTime<Utc>,
}

struct RecordEvent {
    event: TestObject,
}

impl FromArguments for RecordEvent {
    fn from_arguments(args: &BoundArguments) -> Result<Self, BindingError> {
        let event = args
            .body::<TestObject>()?
            .ok_or_else(|| BindingError::missing("test_object", ParameterLocation::Body))?;
        Ok(RecordEvent { event })
    }
}

#[derive(Serialize)]
struct Recorded {
    year: String,
    request_id: String,
}

struct RecordEventController;

impl TypedHandler for RecordEventController {
    type Request = RecordEvent;
    type Response = Recorded;

    fn handle(&self, req: TypedRequest<RecordEvent>) -> Recorded {
        Recorded {
            year: req.data.event.timestamp.format("%Y").to_string(),
            request_id: req.request_id.to_string(),
        }
    }
}

struct Estimate {
    start_latitude: f64,
    start_longitude: f64,
    max_lines: Option<i32>,
}

impl FromArguments for Estimate {
    fn from_arguments(args: &BoundArguments) -> Result<Self, BindingError> {
        Ok(Estimate {
            start_latitude: arg(args, "start_latitude", ParameterLocation::Path)?,
            start_longitude: arg(args, "start_longitude", ParameterLocation::Path)?,
            max_lines: arg(args, "max_lines", ParameterLocation::Query)?,
        })
    }
}

struct EstimateController;

impl TypedHandler for EstimateController {
    type Request = Estimate;
    type Response = serde_json::Value;

    fn handle(&self, req: TypedRequest<Estimate>) -> serde_json::Value {
        json!({
            "operation": req.operation_id.as_ref(),
            "from": [req.data.start_latitude, req.data.start_longitude],
            "max_lines": req.data.max_lines,
        })
    }
}

fn dispatcher() -> Dispatcher {
    let mut d = Dispatcher::new(products_service());
    d.register_typed("record_event", RecordEventController);
    d.register_typed("estimates_price", EstimateController);
    d
}

#[test]
fn test_typed_body_decodes_date_time() {
    let resp = dispatcher().dispatch(
        "record_event",
        BindRequest::new(Method::POST, "/events")
            .with_header("X-Request-Id", "01ARZ3NDEKTSV4RRFFQ69G5FAV")
            .with_body_bytes(br#"{"timestamp":"2020-01-01T00:00:00Z"}"#.to_vec()),
    );
    assert_eq!(resp.status, 200);
    assert_eq!(
        resp.body,
        ResponseBody::Json(json!({
            "year": "2020",
            "request_id": "01ARZ3NDEKTSV4RRFFQ69G5FAV",
        }))
    );
}

#[test]
fn test_typed_handler_not_called_on_schema_failure() {
    let resp = dispatcher().dispatch(
        "record_event",
        BindRequest::new(Method::POST, "/events").with_body_bytes(b"{}".to_vec()),
    );
    assert_eq!(resp.status, 400);
    let text = String::from_utf8(resp.body_bytes()).unwrap();
    assert!(text.starts_with("Failed to validate against schema: "), "{text}");
}

#[test]
fn test_typed_scalar_arguments() {
    let request = BindRequest::new(Method::GET, "/estimates/price/1.5/2/3/4")
        .with_path_param("start_latitude", "1.5")
        .with_path_param("start_longitude", "2")
        .with_path_param("end_latitude", "3")
        .with_path_param("end_longitude", "4");
    let resp = dispatcher().dispatch("estimates_price", request);
    assert_eq!(resp.status, 200);
    assert_eq!(
        resp.body,
        ResponseBody::Json(json!({
            "operation": "estimates_price",
            "from": [1.5, 2.0],
            "max_lines": null,
        }))
    );
}

struct WholeDegrees {
    latitude: i64,
}

impl FromArguments for WholeDegrees {
    fn from_arguments(args: &BoundArguments) -> Result<Self, BindingError> {
        Ok(WholeDegrees {
            latitude: arg(args, "latitude", ParameterLocation::Query)?,
        })
    }
}

struct WholeDegreesController;

impl TypedHandler for WholeDegreesController {
    type Request = WholeDegrees;
    type Response = i64;

    fn handle(&self, req: TypedRequest<WholeDegrees>) -> i64 {
        req.data.latitude
    }
}

#[test]
fn test_handler_kind_mismatch_is_a_server_error() {
    let service = service_from_yaml(
        r#"
operations:
  - operation_id: degrees
    method: GET
    path: /p
    parameters:
      - { name: latitude, in: query, required: true, type: number, format: double }
"#,
    );
    let mut d = Dispatcher::new(service);
    d.register_typed("degrees", WholeDegreesController);

    let resp = d.dispatch("degrees", BindRequest::new(Method::GET, "/p?latitude=37.5"));
    assert_eq!(resp.status, 500);
    assert_eq!(
        String::from_utf8(resp.body_bytes()).unwrap(),
        "Internal error: parameter 'latitude' in query is float64, handler expects int64"
    );

    let resp = d.dispatch("degrees", BindRequest::new(Method::GET, "/p"));
    assert_eq!(resp.status, 400);
    assert_eq!(
        String::from_utf8(resp.body_bytes()).unwrap(),
        "Parameter 'latitude' expected in query"
    );
}

#[test]
fn test_undeclared_parameter_is_a_server_error() {
    let args = BoundArguments::new(Default::default(), "products".into());
    let err = arg::<Option<String>>(&args, "nope", ParameterLocation::Header).unwrap_err();
    assert!(!err.is_client_error());
    assert_eq!(
        err.to_string(),
        "Internal error: operation 'products' does not declare parameter 'nope' in header"
    );
}
