use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use hyper::{Method, Uri};
use serde_json::json;
use snare_http::{Matcher, Mock, MockConfig, Request};

// The journal would grow with every iteration.
fn unrecorded_mock() -> Mock {
    Mock::with_config(MockConfig {
        record_requests: false,
        ..Default::default()
    })
}

fn register_expectations(mock: &Mock, count: usize) {
    for i in 0..count {
        mock.should_receive_request()
            .zero_or_more_times()
            .with_method("GET")
            .with_url(format!("http://localhost/api/v1/endpoint{i}"));
    }
}

fn bench_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("selection");

    for count in [10, 50, 100, 500].iter() {
        let mock = unrecorded_mock();
        register_expectations(&mock, *count);

        let first: Uri = "http://localhost/api/v1/endpoint0".parse().unwrap();
        let last: Uri = format!("http://localhost/api/v1/endpoint{}", count - 1)
            .parse()
            .unwrap();

        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::new("match_first", count), count, |b, _| {
            b.iter(|| {
                mock.intercept(black_box(Request::new(Method::GET, first.clone())))
                    .unwrap()
            })
        });
        group.bench_with_input(BenchmarkId::new("match_last", count), count, |b, _| {
            b.iter(|| {
                mock.intercept(black_box(Request::new(Method::GET, last.clone())))
                    .unwrap()
            })
        });
    }

    group.finish();
}

fn bench_body_matchers(c: &mut Criterion) {
    let mut group = c.benchmark_group("body_matchers");

    let body = json!({
        "user": {"id": 42, "name": "ada"},
        "items": [1, 2, 3],
        "note": null
    });
    let request = Request::new(Method::POST, "http://localhost/orders".parse().unwrap())
        .with_json(&body);

    let literal = unrecorded_mock();
    literal
        .should_receive_request()
        .zero_or_more_times()
        .with_json_body_params(body.clone());
    group.bench_function("json_literal", |b| {
        b.iter(|| literal.intercept(black_box(request.clone())).unwrap())
    });

    let contains = unrecorded_mock();
    contains
        .should_receive_request()
        .zero_or_more_times()
        .with_json_body_params(Matcher::contains(json!({"note": null})));
    group.bench_function("json_contains", |b| {
        b.iter(|| contains.intercept(black_box(request.clone())).unwrap())
    });

    let form = unrecorded_mock();
    form.should_receive_request()
        .zero_or_more_times()
        .with_form_params(json!({"user": "ada", "tags": ["a", "b"]}));
    let form_request = Request::new(Method::POST, "http://localhost/form".parse().unwrap())
        .with_form(&[("user", "ada"), ("tags[]", "a"), ("tags[]", "b")]);
    group.bench_function("form_literal", |b| {
        b.iter(|| form.intercept(black_box(form_request.clone())).unwrap())
    });

    group.finish();
}

criterion_group!(benches, bench_selection, bench_body_matchers);
criterion_main!(benches);
