//! App dispatch without HTTP: routing, params, query, error mapping.

use std::sync::Arc;

use serde_json::{json, Value};
use shapecheck_core::{App, CoreError, HttpModule, RequestContext, Response};

fn body(resp: &Response) -> Value {
    resp.json_value().unwrap()
}

#[test]
fn register_and_handle() {
    let mut app = App::new();
    app.register_route(
        "POST",
        "orders",
        Arc::new(|req: &RequestContext| {
            assert_eq!(req.body, b"{\"id\":\"x\"}");
            Response::ok(&json!({ "ok": true }))
        }),
    )
    .unwrap();
    let resp = app.handle(RequestContext::new("POST", "/orders").with_body(&b"{\"id\":\"x\"}"[..]));
    assert_eq!(resp.status_code, 200);
    assert_eq!(resp.content_type.as_deref(), Some("application/json"));
    assert_eq!(body(&resp), json!({ "ok": true }));
}

#[test]
fn not_found() {
    let app = App::new();
    let err = app.try_handle(RequestContext::new("GET", "/unknown")).unwrap_err();
    match err {
        CoreError::NotFound(msg) => assert_eq!(msg, "Cannot GET /unknown"),
        _ => panic!("expected NotFound"),
    }
    let resp = app.handle(RequestContext::new("GET", "/unknown"));
    assert_eq!(resp.status_code, 404);
    assert_eq!(body(&resp), json!({ "error": "Cannot GET /unknown" }));
}

#[test]
fn method_must_match() {
    let mut module = HttpModule::new("items", None).route(
        "",
        |_req: &RequestContext| Response::ok(&json!([])),
        &["GET"],
    );
    let mut app = App::new();
    app.register(&mut module).unwrap();
    assert_eq!(app.handle(RequestContext::new("get", "/items")).status_code, 200);
    assert_eq!(app.handle(RequestContext::new("DELETE", "/items")).status_code, 404);
}

#[test]
fn path_params_and_query() {
    let mut module = HttpModule::new("users", None)
        .route(
            ":id",
            |req: &RequestContext| Response::ok(&json!({ "id": req.param("id") })),
            &["GET"],
        )
        .route(
            ":id/orders",
            |req: &RequestContext| {
                Response::ok(&json!({ "id": req.param("id"), "sort": req.query_param("sort") }))
            },
            &["GET"],
        );
    let mut app = App::new();
    app.register(&mut module).unwrap();

    let resp = app.handle(RequestContext::new("GET", "/users/42/"));
    assert_eq!(body(&resp), json!({ "id": "42" }));

    let resp = app.handle(RequestContext::new("GET", "/users/7/orders?sort=amount%20desc&sort=x"));
    assert_eq!(body(&resp), json!({ "id": "7", "sort": "amount desc" }));

    assert_eq!(app.handle(RequestContext::new("GET", "/users")).status_code, 404);
}

#[test]
fn handler_errors_map_to_status_codes() {
    let mut module = HttpModule::new("errors", None)
        .route(
            "bad",
            |_req: &RequestContext| Err(CoreError::BadRequest("nope".into())),
            &["GET"],
        )
        .route(
            "json",
            |req: &RequestContext| Response::ok(&req.json_body()?),
            &["POST"],
        )
        .route(
            "boom",
            |_req: &RequestContext| Err(CoreError::Internal("boom".into())),
            &["GET"],
        );
    let mut app = App::new();
    app.register(&mut module).unwrap();

    let resp = app.handle(RequestContext::new("GET", "/errors/bad"));
    assert_eq!((resp.status_code, body(&resp)), (400, json!({ "error": "nope" })));

    let resp = app.handle(RequestContext::new("POST", "/errors/json").with_body("{not json"));
    assert_eq!(resp.status_code, 400);

    let resp = app.handle(RequestContext::new("POST", "/errors/json"));
    assert_eq!((resp.status_code, body(&resp)), (200, json!({})));

    assert_eq!(app.handle(RequestContext::new("GET", "/errors/boom")).status_code, 500);
}

#[test]
fn duplicate_routes_are_rejected() {
    let handler = |_req: &RequestContext| Response::ok(&json!(null));
    let mut app = App::new();
    app.register_route("GET", "/health", Arc::new(handler)).unwrap();
    let err = app.register_route("get", "health/", Arc::new(handler)).unwrap_err();
    assert!(matches!(err, CoreError::Internal(_)));
    assert_eq!(app.routes().len(), 1);
}

#[test]
fn module_prefix_defaults_to_name() {
    let module = HttpModule::new("orders", None);
    assert_eq!(module.prefix, "/orders");
    let module = HttpModule::new("health", Some("/"));
    assert_eq!(module.prefix, "/");
}

#[test]
fn query_strings_are_form_decoded() {
    let req = RequestContext::new("GET", "/orders?userId=%31&userId=2&note=a+b%26c&=skipped&flag");
    assert_eq!(req.query_param("userId"), Some("1"));
    assert_eq!(req.query_param("note"), Some("a b&c"));
    assert_eq!(req.query_param("flag"), Some(""));
    assert_eq!(req.query.len(), 3);
}

#[test]
fn payload_too_large_maps_to_413() {
    let resp = Response::from_error(&CoreError::PayloadTooLarge("too big".into()));
    assert_eq!((resp.status_code, body(&resp)), (413, json!({ "error": "too big" })));
}
