use brrtbind::request::BindRequest;
use brrtbind::service::BindingService;
use brrtbind::spec::{Manifest, OperationManifest, ParameterLocation, ParameterSpec, ParameterType};
use brrtbind::{BindingError, BoundValue, ParamValue};
use http::Method;
use proptest::prelude::*;
use std::sync::Arc;

#[derive(Debug, Clone)]
struct Param {
    location: ParameterLocation,
    required: bool,
    value: Option<i64>,
}

fn location() -> impl Strategy<Value = ParameterLocation> {
    prop_oneof![
        Just(ParameterLocation::Path),
        Just(ParameterLocation::Query),
        Just(ParameterLocation::Header),
    ]
}

fn params() -> impl Strategy<Value = Vec<Param>> {
    prop::collection::vec(
        (location(), any::<bool>(), prop::option::of(any::<i64>())).prop_map(
            |(location, required, value)| Param {
                location,
                required,
                value,
            },
        ),
        1..12,
    )
}

/// Parameter names are unique by index so every `(name, location)` pair is distinct.
fn name(i: usize) -> String {
    format!("p{i}")
}

fn service_and_request(params: &[Param]) -> (BindingService, Arc<OperationManifest>, BindRequest) {
    let path: String = params
        .iter()
        .enumerate()
        .filter(|(_, p)| p.location == ParameterLocation::Path)
        .map(|(i, _)| format!("/{{{}}}", name(i)))
        .collect();
    let mut op = OperationManifest::new("generated", Method::GET, &format!("/gen{path}"));
    for (i, p) in params.iter().enumerate() {
        let mut spec = ParameterSpec::new(name(i), p.location, ParameterType::Int64);
        if p.required {
            spec = spec.required();
        }
        op = op.with_parameter(spec);
    }
    let op = Arc::new(op);
    let manifest = Manifest {
        operations: vec![op.clone()],
        ..Manifest::default()
    };
    let service = BindingService::new(manifest).unwrap();

    let query: Vec<String> = params
        .iter()
        .enumerate()
        .filter(|(_, p)| p.location == ParameterLocation::Query)
        .filter_map(|(i, p)| p.value.map(|v| format!("{}={v}", name(i))))
        .collect();
    let mut request = BindRequest::new(Method::GET, &format!("/gen?{}", query.join("&")));
    for (i, p) in params.iter().enumerate() {
        match (p.location, p.value) {
            (ParameterLocation::Path, Some(v)) => {
                request = request.with_path_param(&name(i), v.to_string())
            }
            (ParameterLocation::Header, Some(v)) => {
                request = request.with_header(&name(i), v.to_string())
            }
            _ => {}
        }
    }
    (service, op, request)
}

proptest! {
    #[test]
    fn bound_arguments_follow_declaration_order(params in params()) {
        let (service, op, mut request) = service_and_request(&params);
        let first_missing = params
            .iter()
            .enumerate()
            .find(|(_, p)| p.required && p.value.is_none());

        match (service.bind(&op, &mut request), first_missing) {
            (Ok(args), None) => {
                prop_assert_eq!(args.len(), params.len());
                for (i, (arg, p)) in args.iter().zip(&params).enumerate() {
                    prop_assert_eq!(&arg.name, &name(i));
                    prop_assert_eq!(arg.location, p.location);
                    let expected = match p.value {
                        Some(v) => BoundValue::Present(ParamValue::I64(v)),
                        None => BoundValue::Absent,
                    };
                    prop_assert_eq!(&arg.value, &expected);
                }
            }
            (Err(err), Some((i, p))) => {
                prop_assert_eq!(err, BindingError::missing(&name(i), p.location));
            }
            (result, expected) => {
                prop_assert!(
                    false,
                    "unexpected outcome {:?} for first missing {:?}",
                    result.map(|a| a.len()),
                    expected
                );
            }
        }
    }

    #[test]
    fn int32_coercion_matches_range(v in any::<i64>()) {
        let op = Arc::new(
            OperationManifest::new("one", Method::GET, "/one").with_parameter(
                ParameterSpec::new("n", ParameterLocation::Query, ParameterType::Int32).required(),
            ),
        );
        let service = BindingService::new(Manifest {
            operations: vec![op.clone()],
            ..Manifest::default()
        })
        .unwrap();
        let mut request = BindRequest::new(Method::GET, &format!("/one?n={v}"));
        let result = service.bind(&op, &mut request);
        match i32::try_from(v) {
            Ok(expected) => {
                let args = result.unwrap();
                prop_assert_eq!(args.query("n"), Some(&ParamValue::I32(expected)));
            }
            Err(_) => {
                let err = result.unwrap_err();
                let is_malformed = matches!(err, BindingError::MalformedParameterValue { .. });
                prop_assert!(is_malformed);
            }
        }
    }
}
