//! Integration tests for the label endpoints

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::{first_detail_code, TestContext};
use serde_json::json;

#[tokio::test]
async fn test_create_label_forces_owner() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .post("/api/labels/", &ctx.alice, json!({ "name": "  Work  " }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Work");
    assert_eq!(body["owner"], ctx.alice.id.to_string());
    assert!(body["id"].is_i64());
}

#[tokio::test]
async fn test_same_name_for_different_owners() {
    let ctx = TestContext::new().await.unwrap();

    let alice_work = ctx.create_label(&ctx.alice, "Work").await;
    let bob_work = ctx.create_label(&ctx.bob, "Work").await;

    assert_ne!(alice_work, bob_work);
}

#[tokio::test]
async fn test_duplicate_name_for_same_owner() {
    let ctx = TestContext::new().await.unwrap();
    ctx.create_label(&ctx.alice, "Work").await;

    let (status, body) = ctx
        .post("/api/labels/", &ctx.alice, json!({ "name": "Work" }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "name");
    assert_eq!(first_detail_code(&body), "duplicate_for_owner");

    // Exact, case-sensitive match only
    let (status, _) = ctx
        .post("/api/labels/", &ctx.alice, json!({ "name": "work" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_concurrent_duplicate_creates() {
    let ctx = TestContext::new().await.unwrap();

    let (first, second) = tokio::join!(
        ctx.post("/api/labels/", &ctx.alice, json!({ "name": "Race" })),
        ctx.post("/api/labels/", &ctx.alice, json!({ "name": "Race" })),
    );

    let mut statuses = [first.0, second.0];
    statuses.sort();
    assert_eq!(statuses, [StatusCode::CREATED, StatusCode::BAD_REQUEST]);
    assert_eq!(ctx.store.total_labels().await, 1);
}

#[tokio::test]
async fn test_name_length_and_emptiness() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .post("/api/labels/", &ctx.alice, json!({ "name": "a".repeat(256) }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_detail_code(&body), "too_long");

    let (status, _) = ctx
        .post("/api/labels/", &ctx.alice, json!({ "name": "a".repeat(255) }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    for body in [json!({ "name": "" }), json!({ "name": "   " }), json!({})] {
        let (status, response) = ctx.post("/api/labels/", &ctx.alice, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(first_detail_code(&response), "empty_field");
    }

    assert_eq!(ctx.store.total_labels().await, 1);
}

#[tokio::test]
async fn test_owner_in_payload() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx
        .post(
            "/api/labels/",
            &ctx.alice,
            json!({ "name": "Mine", "owner": ctx.alice.id }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["owner"], ctx.alice.id.to_string());

    let (status, body) = ctx
        .post(
            "/api/labels/",
            &ctx.alice,
            json!({ "name": "Theirs", "owner": ctx.bob.id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");
    assert_eq!(ctx.store.total_labels().await, 1);
}

#[tokio::test]
async fn test_cross_owner_access_is_404() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx.create_label(&ctx.alice, "Private").await;
    let uri = format!("/api/labels/{}/", id);

    let (status, body) = ctx.get(&uri, &ctx.bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.get("name").is_none());

    let (status, _) = ctx.put(&uri, &ctx.bob, json!({ "name": "Hijacked" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.patch(&uri, &ctx.bob, json!({ "name": "Hijacked" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&uri, &ctx.bob).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.get("/api/labels/", &ctx.bob).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = ctx.get(&uri, &ctx.alice).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Private");
}

#[tokio::test]
async fn test_rename_label() {
    let ctx = TestContext::new().await.unwrap();
    let work = ctx.create_label(&ctx.alice, "Work").await;
    ctx.create_label(&ctx.alice, "Home").await;
    let uri = format!("/api/labels/{}/", work);

    let (status, body) = ctx.put(&uri, &ctx.alice, json!({ "name": "Office" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Office");

    // Renaming to its own name is not a duplicate
    let (status, _) = ctx.patch(&uri, &ctx.alice, json!({ "name": "Office" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = ctx.patch(&uri, &ctx.alice, json!({ "name": "Home" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_detail_code(&body), "duplicate_for_owner");

    // PATCH without a name changes nothing
    let (status, body) = ctx.patch(&uri, &ctx.alice, json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Office");

    // PUT requires a name
    let (status, body) = ctx.put(&uri, &ctx.alice, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_detail_code(&body), "empty_field");
}

#[tokio::test]
async fn test_rename_with_foreign_owner_is_forbidden() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx.create_label(&ctx.alice, "Work").await;

    let (status, _) = ctx
        .patch(
            &format!("/api/labels/{}/", id),
            &ctx.alice,
            json!({ "name": "Moved", "owner": ctx.bob.id }),
        )
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_delete_label_detaches_from_tasks() {
    let ctx = TestContext::new().await.unwrap();
    let urgent = ctx.create_label(&ctx.alice, "Urgent").await;
    let task = ctx
        .create_task(&ctx.alice, json!({ "title": "Fix bug", "labels": [urgent] }))
        .await;
    assert_eq!(task["labels"][0]["name"], "Urgent");

    let label_uri = format!("/api/labels/{}/", urgent);
    let (status, body) = ctx.delete(&label_uri, &ctx.alice).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = ctx.get(&label_uri, &ctx.alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .get(&format!("/api/tasks/{}/", task["id"]), &ctx.alice)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Fix bug");
    assert_eq!(body["labels"], json!([]));
}

#[tokio::test]
async fn test_list_labels_ordered_and_filtered() {
    let ctx = TestContext::new().await.unwrap();
    for name in ["Work", "Home", "Homework", "Errands"] {
        ctx.create_label(&ctx.alice, name).await;
    }
    ctx.create_label(&ctx.bob, "Home").await;

    let (status, body) = ctx.get("/api/labels/", &ctx.alice).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|label| label["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Work", "Home", "Homework", "Errands"]);

    let (_, body) = ctx.get("/api/labels/?search=HOME", &ctx.alice).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = ctx.get("/api/labels/?limit=2&offset=1", &ctx.alice).await;
    let names: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|label| label["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Home", "Homework"]);
}

#[tokio::test]
async fn test_invalid_list_query_is_400() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.get("/api/labels/?limit=0", &ctx.alice).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "limit");

    let (status, body) = ctx.get("/api/labels/?limit=ten", &ctx.alice).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/labels/")
        .header(header::AUTHORIZATION, format!("Bearer {}", ctx.alice.token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = ctx.send_request(request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = ctx
        .post("/api/labels/", &ctx.alice, json!({ "name": 42 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_non_numeric_id_is_404() {
    let ctx = TestContext::new().await.unwrap();

    let (status, body) = ctx.get("/api/labels/abc/", &ctx.alice).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_non_uuid_owner_is_forbidden() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx.create_label(&ctx.alice, "Work").await;
    let uri = format!("/api/labels/{}/", id);

    for owner in [json!(2), json!("someone"), json!([])] {
        let (status, body) = ctx
            .post(
                "/api/labels/",
                &ctx.alice,
                json!({ "name": "Spoofed", "owner": owner }),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "owner {owner}");
        assert_eq!(body["error"], "forbidden");

        let (status, _) = ctx
            .put(&uri, &ctx.alice, json!({ "name": "Spoofed", "owner": owner }))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN, "owner {owner}");
    }

    let (status, _) = ctx
        .post(
            "/api/labels/",
            &ctx.alice,
            json!({ "name": "Home", "owner": null }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    assert_eq!(ctx.store.total_labels().await, 2);
    let (_, body) = ctx.get(&uri, &ctx.alice).await;
    assert_eq!(body["name"], "Work");
}

#[tokio::test]
async fn test_owner_mismatch_wins_over_missing_label() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx.create_label(&ctx.alice, "Work").await;
    let foreign = format!("/api/labels/{}/", id);

    let (status, body) = ctx
        .patch(
            &foreign,
            &ctx.bob,
            json!({ "name": "Taken", "owner": ctx.alice.id }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (status, _) = ctx
        .put("/api/labels/999/", &ctx.alice, json!({ "name": "Gone", "owner": ctx.bob.id }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .patch("/api/labels/999/", &ctx.alice, json!({ "owner": "someone" }))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = ctx.get(&foreign, &ctx.alice).await;
    assert_eq!(body["name"], "Work");
}

#[tokio::test]
async fn test_null_characters_in_name_are_rejected() {
    let ctx = TestContext::new().await.unwrap();
    let id = ctx.create_label(&ctx.alice, "Work").await;

    let (status, body) = ctx
        .post("/api/labels/", &ctx.alice, json!({ "name": "x\u{0}" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "name");
    assert_eq!(first_detail_code(&body), "null_character");

    let (status, body) = ctx
        .patch(
            &format!("/api/labels/{}/", id),
            &ctx.alice,
            json!({ "name": "W\u{0}rk" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(first_detail_code(&body), "null_character");

    let (status, _) = ctx.get("/api/labels/?search=a%00", &ctx.alice).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(ctx.store.total_labels().await, 1);
}
