mod common;

use actix_web::{
    http::{StatusCode, header},
    test,
};
use common::{basic, bearer, content_type, empno, href};
use employee_directory::api::resource::JSON_UTF8;
use serde_json::{Value, json};

/// POSTs an employee as admin and returns the created resource.
macro_rules! create {
    ($app:expr, $ctx:expr, $body:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/employees")
            .insert_header(bearer(&$ctx.admin_token))
            .set_json($body)
            .to_request();
        let resp = test::call_service(&$app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        test::read_body_json::<Value, _>(resp).await
    }};
}

macro_rules! get {
    ($app:expr, $uri:expr) => {{
        let req = test::TestRequest::get().uri($uri).to_request();
        test::call_service(&$app, req).await
    }};
}

#[actix_web::test]
async fn create_returns_resource_with_links() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(&ctx.admin_token))
        .set_json(json!({
            "ename": "SMITH",
            "job": "CLERK",
            "hiredate": 345427200000i64,
            "sal": 800.0
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(content_type(&resp), JSON_UTF8);
    let location = resp
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .unwrap();

    let body: Value = test::read_body_json(resp).await;
    let id = empno(&body);
    assert_eq!(body["ename"], "SMITH");
    assert_eq!(body["job"], "CLERK");
    assert_eq!(body["hiredate"], 345427200000i64);
    assert_eq!(body["sal"], 800.0);
    assert!(body["comm"].is_null());

    let self_href = href(&body, "self");
    assert!(self_href.ends_with(&format!("/api/employees/{id}")));
    assert_eq!(location, self_href);
    assert_eq!(href(&body, "employee"), self_href);
    assert!(href(&body, "mgr").ends_with(&format!("/api/employees/{id}/mgr")));
    assert!(href(&body, "department").ends_with(&format!("/api/employees/{id}/department")));
}

#[actix_web::test]
async fn reads_are_public_and_writes_need_credentials() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let resp = get!(app, "/api/employees");
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .set_json(json!({ "ename": "anon" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let challenge = resp.headers().get(header::WWW_AUTHENTICATE).unwrap();
    assert!(challenge.to_str().unwrap().starts_with("Basic"));

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer("not-a-token"))
        .set_json(json!({ "ename": "anon" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(get!(app, "/api/employees")).await;
    assert_eq!(body["totalElements"], 0);
}

#[actix_web::test]
async fn basic_credentials_and_any_role_can_write() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(basic(common::CLERK.0, common::CLERK.1))
        .set_json(json!({ "ename": "via-basic" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(basic(common::CLERK.0, "wrong"))
        .set_json(json!({ "ename": "rejected" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::delete()
        .uri("/api/employees/1")
        .insert_header(bearer(&ctx.clerk_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn list_is_paged_and_filterable() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let mut ids = Vec::new();
    for name in ["ALLEN", "WARD", "JONES"] {
        let body = create!(app, ctx, json!({ "ename": name }));
        ids.push(empno(&body));
    }

    let resp = get!(app, "/api/employees?page=0&size=10");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(content_type(&resp), JSON_UTF8);
    let page: Value = test::read_body_json(resp).await;
    assert_eq!(page["content"].as_array().unwrap().len(), 3);
    assert_eq!(page["number"], 0);
    assert_eq!(page["size"], 10);
    assert_eq!(page["totalElements"], 3);
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["first"], true);
    assert_eq!(page["last"], true);

    let page: Value = test::read_body_json(get!(app, "/api/employees?page=1&size=2")).await;
    assert_eq!(page["numberOfElements"], 1);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["content"][0]["ename"], "JONES");

    let uri = format!("/api/employees?empno={}", ids[1]);
    let page: Value = test::read_body_json(get!(app, &uri)).await;
    assert_eq!(page["size"], 20);
    assert_eq!(page["numberOfElements"], 1);
    assert_eq!(page["content"][0]["ename"], "WARD");

    let page: Value = test::read_body_json(get!(app, "/api/employees?empno=9999")).await;
    assert_eq!(page["totalElements"], 0);
    assert_eq!(page["empty"], true);
}

#[actix_web::test]
async fn list_sorts_by_known_properties_only() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    for (name, sal) in [("BLAKE", 2850.0), ("ADAMS", 1100.0), ("CLARK", 2450.0)] {
        create!(app, ctx, json!({ "ename": name, "sal": sal }));
    }

    let page: Value = test::read_body_json(get!(app, "/api/employees?sort=ename")).await;
    let names: Vec<_> = page["content"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["ename"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["ADAMS", "BLAKE", "CLARK"]);

    let page: Value = test::read_body_json(get!(app, "/api/employees?sort=sal,desc")).await;
    assert_eq!(page["content"][0]["ename"], "BLAKE");
    assert_eq!(page["content"][2]["ename"], "ADAMS");

    let resp = get!(app, "/api/employees?sort=salary");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let resp = get!(app, "/api/employees?page=minus-one");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn put_replaces_and_patch_merges() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let body = create!(app, ctx, json!({ "ename": "test", "job": "test" }));
    let id = empno(&body);
    let uri = format!("/api/employees/{id}");

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&ctx.admin_token))
        .set_json(json!({ "ename": "changed" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["ename"], "changed");
    assert_eq!(body["job"], "test");

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&ctx.admin_token))
        .set_json(json!({}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["ename"], "changed");

    let req = test::TestRequest::patch()
        .uri(&uri)
        .insert_header(bearer(&ctx.admin_token))
        .set_json(json!({ "job": null }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(body["job"].is_null());
    assert_eq!(body["ename"], "changed");

    let req = test::TestRequest::put()
        .uri(&uri)
        .insert_header(bearer(&ctx.admin_token))
        .set_json(json!({ "ename": "replaced", "sal": 1.5 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(empno(&body), id);
    assert_eq!(body["ename"], "replaced");
    assert_eq!(body["sal"], 1.5);
    assert!(body["job"].is_null());

    let fetched: Value = test::read_body_json(get!(app, &uri)).await;
    assert_eq!(fetched["ename"], "replaced");
}

#[actix_web::test]
async fn delete_removes_the_employee() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let id = empno(&create!(app, ctx, json!({ "ename": "temp" })));
    let uri = format!("/api/employees/{id}");

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&ctx.admin_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    assert_eq!(get!(app, &uri).status(), StatusCode::NOT_FOUND);
    let filtered = format!("/api/employees?empno={id}");
    let page: Value = test::read_body_json(get!(app, &filtered)).await;
    assert_eq!(page["content"], json!([]));
    assert_eq!(page["numberOfElements"], 0);
    let page: Value = test::read_body_json(get!(app, "/api/employees")).await;
    assert_eq!(page["content"], json!([]));

    let req = test::TestRequest::delete()
        .uri(&uri)
        .insert_header(bearer(&ctx.admin_token))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn unknown_employee_is_not_found() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let resp = get!(app, "/api/employees/424242");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(content_type(&resp), JSON_UTF8);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);

    for method in [test::TestRequest::put(), test::TestRequest::patch()] {
        let req = method
            .uri("/api/employees/424242")
            .insert_header(bearer(&ctx.admin_token))
            .set_json(json!({ "ename": "ghost" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    assert_eq!(get!(app, "/api/employees/not-a-number").status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn malformed_body_is_a_bad_request() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(&ctx.admin_token))
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{\"ename\": ")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(&ctx.admin_token))
        .set_json(json!({ "ename": "x", "sal": "lots" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn nested_bodies_cascade() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let body = create!(
        app,
        ctx,
        json!({
            "ename": "JONES",
            "mgr": { "ename": "KING", "job": "PRESIDENT" },
            "department": { "name": "RESEARCH", "description": "Dallas" }
        })
    );
    let jones = empno(&body);

    assert!(href(&body, "mgr").ends_with(&format!("/api/employees/{jones}/mgr")));
    let uri = format!("/api/employees/{jones}/mgr");
    let resp = get!(app, &uri);
    assert_eq!(resp.status(), StatusCode::OK);
    let king: Value = test::read_body_json(resp).await;
    assert_eq!(king["ename"], "KING");
    let king_no = empno(&king);

    let uri = format!("/api/employees/{jones}/department");
    let dept: Value = test::read_body_json(get!(app, &uri)).await;
    assert_eq!(dept["name"], "RESEARCH");
    let dept_id = dept["id"].as_u64().unwrap();

    // reference by id and update the referenced manager in the same write
    let body = create!(
        app,
        ctx,
        json!({
            "ename": "SCOTT",
            "mgr": { "empno": king_no, "ename": "KING", "job": "CEO" },
            "department": { "id": dept_id }
        })
    );
    let scott = empno(&body);

    let uri = format!("/api/employees/{scott}/mgr");
    let king: Value = test::read_body_json(get!(app, &uri)).await;
    assert_eq!(empno(&king), king_no);
    assert_eq!(king["job"], "CEO");

    let page: Value = test::read_body_json(get!(app, "/api/departments")).await;
    assert_eq!(page["totalElements"], 1);
    let page: Value = test::read_body_json(get!(app, "/api/employees")).await;
    assert_eq!(page["totalElements"], 3);
}

#[actix_web::test]
async fn unknown_reference_rejects_the_whole_write() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let req = test::TestRequest::post()
        .uri("/api/employees")
        .insert_header(bearer(&ctx.admin_token))
        .set_json(json!({
            "ename": "orphan",
            "mgr": { "ename": "new boss" },
            "department": { "id": 77 }
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let page: Value = test::read_body_json(get!(app, "/api/employees")).await;
    assert_eq!(page["totalElements"], 0);
}

#[actix_web::test]
async fn management_cycles_are_rejected() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let boss = empno(&create!(app, ctx, json!({ "ename": "boss" })));
    let worker = empno(&create!(app, ctx, json!({ "ename": "worker", "mgr": { "empno": boss } })));

    let req = test::TestRequest::patch()
        .uri(&format!("/api/employees/{boss}"))
        .insert_header(bearer(&ctx.admin_token))
        .set_json(json!({ "mgr": { "empno": worker } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/employees/{boss}"))
        .insert_header(bearer(&ctx.admin_token))
        .set_json(json!({ "mgr": { "empno": boss } }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/api/employees/{boss}/mgr");
    assert_eq!(get!(app, &uri).status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn deleting_a_manager_keeps_subordinates() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let boss = empno(&create!(app, ctx, json!({ "ename": "boss" })));
    let worker = empno(&create!(app, ctx, json!({ "ename": "worker", "mgr": { "empno": boss } })));

    let req = test::TestRequest::delete()
        .uri(&format!("/api/employees/{boss}"))
        .insert_header(bearer(&ctx.admin_token))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let uri = format!("/api/employees/{worker}");
    let resp = get!(app, &uri);
    assert_eq!(resp.status(), StatusCode::OK);
    let uri = format!("/api/employees/{worker}/mgr");
    assert_eq!(get!(app, &uri).status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn trailing_slash_is_ignored() {
    let ctx = common::setup().await;
    let app = test::init_service(common::app(ctx.state.clone())).await;

    let id = empno(&create!(app, ctx, json!({ "ename": "slash" })));
    let uri = format!("/api/employees/{id}/");
    assert_eq!(get!(app, &uri).status(), StatusCode::OK);
    assert_eq!(get!(app, "/api/employees/").status(), StatusCode::OK);
}
