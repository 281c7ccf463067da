mod common;

use brrtbind::request::{BindRequest, BodyStream, CancellationFlag};
use brrtbind::runtime_config::RuntimeConfig;
use brrtbind::spec::load_manifest;
use brrtbind::{BindingError, BindingService, BoundValue, ParamValue, ParameterLocation};
use common::manifests::{products_path, products_service, service_with_config};
use common::requests::bind;
use http::Method;
use serde_json::json;

#[test]
fn test_query_floats_bind_in_order() {
    let service = products_service();
    let args = bind(
        &service,
        "products",
        BindRequest::new(Method::GET, "/products?latitude=37.5&longitude=-122.4"),
    )
    .unwrap();
    let values: Vec<_> = args.iter().map(|a| a.value.clone()).collect();
    assert_eq!(
        values,
        vec![
            BoundValue::Present(ParamValue::F64(37.5)),
            BoundValue::Present(ParamValue::F64(-122.4)),
        ]
    );
}

#[test]
fn test_malformed_float_names_parameter() {
    let service = products_service();
    let err = bind(
        &service,
        "products",
        BindRequest::new(Method::GET, "/products?latitude=abc&longitude=-122.4"),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        BindingError::MalformedParameterValue { ref name, location: ParameterLocation::Query, .. }
            if name == "latitude"
    ));
    assert!(err.to_string().starts_with("Parameter 'latitude': "));
}

#[test]
fn test_same_name_in_query_and_path_stays_distinct() {
    let service = products_service();
    let args = bind(
        &service,
        "test_me",
        BindRequest::new(Method::GET, "/products/42?some_parameter=43")
            .with_path_param("some_parameter", "42"),
    )
    .unwrap();
    let values: Vec<_> = args
        .iter()
        .map(|a| (a.location, a.value.value().and_then(ParamValue::as_str).map(str::to_string)))
        .collect();
    assert_eq!(
        values,
        vec![
            (ParameterLocation::Query, Some("43".to_string())),
            (ParameterLocation::Path, Some("42".to_string())),
        ]
    );
}

#[test]
fn test_missing_path_variable_with_query_present() {
    let service = products_service();
    let err = bind(
        &service,
        "test_me",
        BindRequest::new(Method::GET, "/products/42?some_parameter=43"),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Parameter 'some_parameter' expected in path");
}

#[test]
fn test_path_parameters_and_optional_query() {
    let service = products_service();
    let request = BindRequest::new(Method::GET, "/estimates/price/1/2/3/4?max_lines=10")
        .with_path_param("start_latitude", "1")
        .with_path_param("start_longitude", "2")
        .with_path_param("end_latitude", "3")
        .with_path_param("end_longitude", "4.5");
    let args = bind(&service, "estimates_price", request).unwrap();
    assert_eq!(args.path("end_longitude"), Some(&ParamValue::F64(4.5)));
    assert_eq!(args.query("max_lines"), Some(&ParamValue::I32(10)));

    let request = BindRequest::new(Method::GET, "/estimates/price/1/2/3/4?max_lines=3000000000")
        .with_path_param("start_latitude", "1")
        .with_path_param("start_longitude", "2")
        .with_path_param("end_latitude", "3")
        .with_path_param("end_longitude", "4");
    let err = bind(&service, "estimates_price", request).unwrap_err();
    assert!(err.to_string().starts_with("Parameter 'max_lines': "));
}

#[test]
fn test_header_parameters() {
    let service = products_service();
    let args = bind(
        &service,
        "test_headers",
        BindRequest::new(Method::GET, "/headers")
            .with_header("some-parameter", "hello")
            .with_header("X-Some-Custom-Parameter", "9000000000"),
    )
    .unwrap();
    assert_eq!(args.header("Some-parameter").and_then(ParamValue::as_str), Some("hello"));
    assert_eq!(
        args.get("Some-optional", ParameterLocation::Header),
        Some(&BoundValue::Absent)
    );
    assert_eq!(args.header("X-Some-Custom-Parameter"), Some(&ParamValue::I64(9_000_000_000)));

    let err = bind(
        &service,
        "test_headers",
        BindRequest::new(Method::GET, "/headers").with_header("X-Some-Custom-Parameter", "1"),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Parameter 'Some-parameter' expected in header");
}

#[test]
fn test_referenced_parameters_are_optional_int32() {
    let service = products_service();
    let request = BindRequest::new(Method::GET, "/history?limit=5");
    let args = bind(&service, "history", request).unwrap();
    assert_eq!(args.get("offset", ParameterLocation::Query), Some(&BoundValue::Absent));
    assert_eq!(args.query("limit"), Some(&ParamValue::I32(5)));
}

#[test]
fn test_date_time_body() {
    let service = products_service();
    let err = bind(
        &service,
        "record_event",
        BindRequest::new(Method::POST, "/events").with_body_bytes(b"{}".to_vec()),
    )
    .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Failed to validate against schema: "));
    assert!(message.contains("timestamp"), "{message}");

    let err = bind(
        &service,
        "record_event",
        BindRequest::new(Method::POST, "/events")
            .with_body_bytes(br#"{"timestamp":"yesterday"}"#.to_vec()),
    )
    .unwrap_err();
    assert!(matches!(err, BindingError::SchemaValidationFailure { .. }));

    let args = bind(
        &service,
        "record_event",
        BindRequest::new(Method::POST, "/events")
            .with_body_bytes(br#"{"timestamp":"2020-01-01T00:00:00Z"}"#.to_vec()),
    )
    .unwrap();
    assert_eq!(
        args.body_value(),
        Some(&json!({"timestamp": "2020-01-01T00:00:00Z"}))
    );
}

#[test]
fn test_schema_errors_are_idempotent() {
    let service = products_service();
    let payload = br#"{"first_name": 7}"#;
    let first = bind(
        &service,
        "update_me",
        BindRequest::new(Method::PATCH, "/me").with_body_bytes(payload.to_vec()),
    )
    .unwrap_err()
    .to_string();
    let second = bind(
        &service,
        "update_me",
        BindRequest::new(Method::PATCH, "/me").with_body_bytes(payload.to_vec()),
    )
    .unwrap_err()
    .to_string();
    assert_eq!(first, second);
    assert!(first.contains(", "), "expected several violations: {first}");
}

#[test]
fn test_required_body_missing() {
    let service = products_service();
    let err = bind(&service, "update_me", BindRequest::new(Method::PATCH, "/me")).unwrap_err();
    assert_eq!(err, BindingError::missing("update_user", ParameterLocation::Body));
    assert_eq!(err.to_string(), "Parameter 'update_user' expected in body");
}

fn service_with_limit(limit: usize) -> BindingService {
    let manifest = load_manifest(products_path()).unwrap();
    BindingService::builder(manifest)
        .config(RuntimeConfig::default())
        .max_body_bytes(limit)
        .build()
        .unwrap()
}

#[test]
fn test_body_limit_boundary() {
    let payload = br#"{"timestamp":"2020-01-01T00:00:00Z"}"#.to_vec();

    let at_limit = service_with_limit(payload.len());
    assert!(bind(
        &at_limit,
        "record_event",
        BindRequest::new(Method::POST, "/events").with_body_bytes(payload.clone())
    )
    .is_ok());

    // Declared length over the bound is refused before reading.
    let under_limit = service_with_limit(payload.len() - 1);
    let err = bind(
        &under_limit,
        "record_event",
        BindRequest::new(Method::POST, "/events").with_body_bytes(payload.clone()),
    )
    .unwrap_err();
    assert_eq!(err, BindingError::BodyTooLarge { limit: payload.len() - 1 });

    // Without a declared length the read stops one byte past the bound.
    let stream = BodyStream::from_reader(std::io::Cursor::new(payload.clone()));
    let err = bind(
        &under_limit,
        "record_event",
        BindRequest::new(Method::POST, "/events").with_body(stream),
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        format!(
            "Body unreadable: request body too large (limit {} bytes)",
            payload.len() - 1
        )
    );
}

#[test]
fn test_manifest_limit_applies_by_default() {
    assert_eq!(products_service().max_body_bytes(), 1_048_576);
    let config = RuntimeConfig::default().with_max_body_bytes(64);
    let service = service_with_config(load_manifest(products_path()).unwrap(), config);
    // The manifest value wins over runtime config.
    assert_eq!(service.max_body_bytes(), 1_048_576);
}

#[test]
fn test_cancelled_request_is_unreadable() {
    let service = products_service();
    let flag = CancellationFlag::new();
    flag.cancel();
    let stream = BodyStream::from_bytes(b"{}".to_vec()).with_cancellation(flag);
    let err = bind(
        &service,
        "update_me",
        BindRequest::new(Method::PATCH, "/me").with_body(stream),
    )
    .unwrap_err();
    assert!(err.to_string().starts_with("Body unreadable: "));
}

#[test]
fn test_from_http_request() {
    let service = products_service();
    let req = http::Request::builder()
        .method(Method::PATCH)
        .uri("/me")
        .header("content-type", "application/json")
        .body(std::io::Cursor::new(
            br#"{"last_name":"Doe","email":"j@d.io","picture":"p.png"}"#.to_vec(),
        ))
        .unwrap();
    let request = BindRequest::from_http(req, std::iter::empty::<(&str, &str)>());
    let args = bind(&service, "update_me", request).unwrap();
    assert_eq!(args.body_value().unwrap()["last_name"], json!("Doe"));
}
