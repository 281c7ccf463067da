use brrtbind::request::BindRequest;
use brrtbind::service::BindingService;
use brrtbind::spec::{load_manifest_from_str, DocumentFormat};
use criterion::{criterion_group, criterion_main, Criterion};
use http::Method;
use std::hint::black_box;

fn example_manifest() -> &'static str {
    r#"
schemas:
  Profile:
    type: object
    properties:
      first_name: { type: string }
      last_name: { type: string }
      email: { type: string }
    required: [last_name, email]
operations:
  - operation_id: products
    method: GET
    path: /products
    parameters:
      - { name: latitude, in: query, required: true, type: number, format: double }
      - { name: longitude, in: query, required: true, type: number, format: double }
  - operation_id: complex_many_params
    method: GET
    path: /complex/{a}/{b}/{c}/{d}
    parameters:
      - { name: a, in: path, required: true, type: integer }
      - { name: b, in: path, required: true, type: integer, format: int32 }
      - { name: c, in: path, required: true, type: string }
      - { name: d, in: path, required: true, type: boolean }
      - { name: X-Trace, in: header, type: string }
      - { name: page, in: query, type: integer, format: int32 }
  - operation_id: update_me
    method: PATCH
    path: /me
    parameters:
      - { name: update_user, in: body, required: true, schema: Profile }
"#
}

fn service() -> BindingService {
    let manifest = load_manifest_from_str(example_manifest(), DocumentFormat::Yaml)
        .expect("failed to load manifest");
    BindingService::new(manifest).expect("failed to build service")
}

fn bench_scalar_binding(c: &mut Criterion) {
    let service = service();
    let products = service.operation("products").unwrap().clone();
    let complex = service.operation("complex_many_params").unwrap().clone();

    c.bench_function("bind_query_floats", |b| {
        b.iter(|| {
            let mut req =
                BindRequest::new(Method::GET, "/products?latitude=37.5&longitude=-122.4");
            black_box(service.bind(&products, &mut req).unwrap());
        })
    });

    c.bench_function("bind_mixed_locations", |b| {
        b.iter(|| {
            let mut req = BindRequest::new(Method::GET, "/complex/1/2/three/true?page=9")
                .with_path_param("a", "1")
                .with_path_param("b", "2")
                .with_path_param("c", "three")
                .with_path_param("d", "true")
                .with_header("X-Trace", "abc");
            black_box(service.bind(&complex, &mut req).unwrap());
        })
    });
}

fn bench_body_binding(c: &mut Criterion) {
    let service = service();
    let update_me = service.operation("update_me").unwrap().clone();
    let payload = br#"{"first_name":"Jane","last_name":"Doe","email":"jane@example.com"}"#;

    c.bench_function("bind_schema_body", |b| {
        b.iter(|| {
            let mut req =
                BindRequest::new(Method::PATCH, "/me").with_body_bytes(payload.to_vec());
            black_box(service.bind(&update_me, &mut req).unwrap());
        })
    });

    c.bench_function("reject_schema_body", |b| {
        b.iter(|| {
            let mut req = BindRequest::new(Method::PATCH, "/me").with_body_bytes(b"{}".to_vec());
            black_box(service.bind(&update_me, &mut req).unwrap_err());
        })
    });
}

criterion_group!(benches, bench_scalar_binding, bench_body_binding);
criterion_main!(benches);
