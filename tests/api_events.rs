//! Integration tests per gli endpoints degli eventi
//!
//! Test per:
//! - POST/GET /api/events/event/
//! - GET/PATCH/DELETE /api/events/event/{id}/
//! - partecipazioni e marker

mod common;

#[cfg(test)]
mod event_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    // ============================================================
    // Test per POST /api/events/event/ - create_event
    // ============================================================

    #[sqlx::test]
    async fn test_create_event_success(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[bob.id]).await;

        let response = create_event(
            &server,
            &alice,
            json!({
                "title": "Cena",
                "start_time": "2030-05-01T19:00:00Z",
                "circle_ids": [circle_id],
            }),
        )
        .await;

        response.assert_status(StatusCode::CREATED);
        let event: Value = response.json();
        assert_eq!(event["title"], "Cena");
        assert_eq!(event["creator"], alice.id);
        assert_eq!(event["shareable_link"], true);
        assert_eq!(event["event_shared"], false);
        assert_eq!(event["participants_count"], 0);
        assert_eq!(event["circles"][0]["id"], circle_id);
        assert!(event.get("invitation_token").is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn test_create_event_end_before_start(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;

        let response = create_event(
            &server,
            &alice,
            json!({
                "title": "Cena",
                "start_time": "2030-05-01T19:00:00Z",
                "end_time": "2030-05-01T18:00:00Z",
            }),
        )
        .await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test]
    async fn test_create_event_with_foreign_circle(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let mallory = register(&server, "mallory").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;

        let response = create_event(
            &server,
            &mallory,
            json!({
                "title": "Intrusione",
                "start_time": "2030-05-01T19:00:00Z",
                "circle_ids": [circle_id],
            }),
        )
        .await;

        response.assert_status_forbidden();
        Ok(())
    }

    // ============================================================
    // Test per GET /api/events/event/ e /event/{id}/
    // ============================================================

    #[sqlx::test]
    async fn test_events_visible_to_circle_members_only(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let carol = register(&server, "carol").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[bob.id]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;

        let events: Vec<Value> = server
            .get("/api/events/event/")
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .await
            .json();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["id"], event_id.as_str());

        let events: Vec<Value> = server
            .get("/api/events/event/")
            .add_header(auth_header(), format!("Bearer {}", carol.token))
            .await
            .json();
        assert!(events.is_empty());

        server
            .get(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", carol.token))
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test]
    async fn test_get_unknown_event(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;

        server
            .get("/api/events/event/00000000-0000-0000-0000-000000000000/")
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .await
            .assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // Test per PATCH /api/events/event/{id}/ - update_event
    // ============================================================

    #[sqlx::test]
    async fn test_creator_cannot_change_dates_while_unshared(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;

        let response = server
            .patch(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "start_time": "2030-06-02T18:00:00Z" }))
            .await;

        response.assert_status_bad_request();

        // titolo e indirizzo restano modificabili dal creatore
        let response = server
            .patch(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "title": "Spritz" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["title"], "Spritz");
        Ok(())
    }

    #[sqlx::test]
    async fn test_sharing_and_dates_in_one_request_rejected(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[bob.id]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;

        for user in [&alice, &bob] {
            let response = server
                .patch(&format!("/api/events/event/{}/", event_id))
                .add_header(auth_header(), format!("Bearer {}", user.token))
                .json(&json!({
                    "event_shared": true,
                    "end_time": "2030-06-01T23:00:00Z",
                }))
                .await;
            response.assert_status_bad_request();
        }

        // in due richieste separate funziona
        server
            .patch(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "event_shared": true }))
            .await
            .assert_status_ok();
        let response = server
            .patch(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "end_time": "2030-06-01T23:00:00Z" }))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["end_time"], "2030-06-01T23:00:00Z");
        Ok(())
    }

    #[sqlx::test]
    async fn test_member_edits_shared_event_subset(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[bob.id]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, true).await;

        let response = server
            .patch(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .json(&json!({
                "title": "Rinominato",
                "description": "Porto il vino",
                "start_time": "2030-06-01T19:00:00Z",
            }))
            .await;

        response.assert_status_ok();
        let event: Value = response.json();
        // il titolo è riservato al creatore e viene scartato
        assert_eq!(event["title"], "Aperitivo");
        assert_eq!(event["description"], "Porto il vino");
        assert_eq!(event["start_time"], "2030-06-01T19:00:00Z");
        Ok(())
    }

    #[sqlx::test]
    async fn test_member_only_creator_fields_forbidden(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[bob.id]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, true).await;

        let response = server
            .patch(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .json(&json!({ "title": "Rinominato" }))
            .await;

        response.assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test]
    async fn test_member_cannot_edit_unshared_event(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[bob.id]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;

        let response = server
            .patch(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .json(&json!({ "description": "Porto il vino" }))
            .await;

        response.assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test]
    async fn test_stranger_mutations_forbidden(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let carol = register(&server, "carol").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;
        let url = format!("/api/events/event/{}/", event_id);

        server
            .patch(&url)
            .add_header(auth_header(), format!("Bearer {}", carol.token))
            .json(&json!({ "description": "hack" }))
            .await
            .assert_status_forbidden();
        server
            .delete(&url)
            .add_header(auth_header(), format!("Bearer {}", carol.token))
            .await
            .assert_status_forbidden();
        server
            .post(&format!("{}invite/", url))
            .add_header(auth_header(), format!("Bearer {}", carol.token))
            .await
            .assert_status_forbidden();
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_end_before_existing_start(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, true).await;

        let response = server
            .patch(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "end_time": "2030-05-01T00:00:00Z" }))
            .await;

        response.assert_status_bad_request();
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_clears_address_with_null(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let address_id = create_address(&server, &alice, "Via Roma 1").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;
        let url = format!("/api/events/event/{}/", event_id);

        let event: Value = server
            .patch(&url)
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "address_id": address_id }))
            .await
            .json();
        assert_eq!(event["address"]["id"], address_id);

        // un campo assente lascia l'indirizzo com'è
        let event: Value = server
            .patch(&url)
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "title": "Aperitivo lungo" }))
            .await
            .json();
        assert_eq!(event["address"]["id"], address_id);

        let response = server
            .patch(&url)
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "address_id": null }))
            .await;
        response.assert_status_ok();
        assert!(response.json::<Value>()["address"].is_null());
        Ok(())
    }

    #[sqlx::test]
    async fn test_event_address_must_belong_to_creator(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let bob_home = create_address(&server, &bob, "Via Segreta 7").await;

        create_event(
            &server,
            &alice,
            json!({
                "title": "Cena",
                "start_time": "2030-05-01T19:00:00Z",
                "address_id": bob_home,
            }),
        )
        .await
        .assert_status_bad_request();

        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;
        server
            .patch(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "address_id": bob_home }))
            .await
            .assert_status_bad_request();

        let event: Value = server
            .get(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .await
            .json();
        assert!(event["address"].is_null());
        Ok(())
    }

    // ============================================================
    // Test per DELETE /api/events/event/{id}/ - delete_event
    // ============================================================

    #[sqlx::test]
    async fn test_only_creator_deletes(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[bob.id]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, true).await;
        let url = format!("/api/events/event/{}/", event_id);

        server
            .delete(&url)
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .await
            .assert_status_forbidden();

        server
            .delete(&url)
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        server
            .get(&url)
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .await
            .assert_status_not_found();
        Ok(())
    }

    // ============================================================
    // Test per partecipazioni e marker
    // ============================================================

    #[sqlx::test]
    async fn test_toggle_participation(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[bob.id]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;
        let toggle = format!("/api/events/event/{}/toggle_participation/", event_id);

        let response = server
            .post(&toggle)
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["participating"], true);
        assert_eq!(body["participants_count"], 1);

        let participants: Vec<Value> = server
            .get(&format!("/api/events/event/{}/participants/", event_id))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .await
            .json();
        assert_eq!(participants.len(), 1);
        assert_eq!(participants[0]["username"], "bob");

        let body: Value = server
            .post(&toggle)
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .await
            .json();
        assert_eq!(body["participating"], false);
        assert_eq!(body["participants_count"], 0);
        Ok(())
    }

    #[sqlx::test]
    async fn test_markers_filter_by_category(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;

        let address: Value = server
            .post("/api/events/user/addresses/")
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({
                "address_line": "Via Roma 1",
                "city": "Torino",
                "latitude": 45.07,
                "longitude": 7.68,
            }))
            .await
            .json();

        let tags: Vec<Value> = server
            .get("/api/events/tags/")
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .await
            .json();
        let sport = tags
            .iter()
            .find(|t| t["name"] == "Sport")
            .and_then(|t| t["id"].as_i64())
            .expect("seeded Sport tag");
        let work = tags
            .iter()
            .find(|t| t["name"] == "Work")
            .and_then(|t| t["id"].as_i64())
            .expect("seeded Work tag");

        let response = server
            .post("/api/events/circles/")
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "name": "Calcetto", "category_ids": [sport] }))
            .await;
        let circle_id = response.json::<Value>()["id"].as_i64().unwrap();

        create_event(
            &server,
            &alice,
            json!({
                "title": "Partita",
                "start_time": "2030-05-01T19:00:00Z",
                "address_id": address["id"],
                "circle_ids": [circle_id],
            }),
        )
        .await
        .assert_status(StatusCode::CREATED);
        create_event(
            &server,
            &alice,
            json!({ "title": "Solo", "start_time": "2030-05-02T19:00:00Z" }),
        )
        .await
        .assert_status(StatusCode::CREATED);

        let markers: Value = server
            .post("/api/events/markers/")
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({}))
            .await
            .json();
        assert_eq!(markers["private_markers"].as_array().unwrap().len(), 2);

        let markers: Value = server
            .post("/api/events/markers/")
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "tags": [sport] }))
            .await
            .json();
        let private = markers["private_markers"].as_array().unwrap();
        assert_eq!(private.len(), 1);
        assert_eq!(private[0]["title"], "Partita");
        assert_eq!(private[0]["lat"], 45.07);

        let markers: Value = server
            .post("/api/events/markers/")
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "tags": [work] }))
            .await
            .json();
        assert!(markers["private_markers"].as_array().unwrap().is_empty());
        Ok(())
    }
}
