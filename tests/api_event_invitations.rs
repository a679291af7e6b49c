//! Integration tests per gli inviti via email e il token di condivisione
//!
//! Test per:
//! - GET/POST /api/events/invitations/
//! - GET/DELETE /api/events/invitations/{id}/
//! - POST /api/events/accept-invitation/ con il token di un invito email
//! - POST /api/events/event-share-token/

mod common;

#[cfg(test)]
mod event_invitation_tests {
    use super::common::*;
    use axum::http::StatusCode;
    use axum_test::{TestResponse, TestServer};
    use serde_json::{Value, json};
    use sqlx::SqlitePool;

    async fn invite(server: &TestServer, user: &TestUser, event_id: &str, email: &str) -> TestResponse {
        server
            .post("/api/events/invitations/")
            .add_header(auth_header(), format!("Bearer {}", user.token))
            .json(&json!({ "event": event_id, "email": email }))
            .await
    }

    async fn invitations_of(server: &TestServer, user: &TestUser) -> Vec<Value> {
        server
            .get("/api/events/invitations/")
            .add_header(auth_header(), format!("Bearer {}", user.token))
            .await
            .json()
    }

    // ============================================================
    // Creazione e lista
    // ============================================================

    #[sqlx::test]
    async fn test_create_invitation_sends_mail(pool: SqlitePool) -> sqlx::Result<()> {
        let (state, mailer) = create_test_state_with_mailer(pool, test_config());
        let server = create_test_server(state.clone());
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let carol = register(&server, "carol").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;

        let response = invite(&server, &alice, &event_id, "Bob@Example.com").await;
        response.assert_status(StatusCode::CREATED);
        let sent: Value = response.json();
        assert_eq!(sent["email"], "bob@example.com");
        assert_eq!(sent["event"], event_id.as_str());
        assert_eq!(sent["accepted"], false);
        let token = sent["token"].as_str().expect("token");
        assert_eq!(
            sent["invitation_link"],
            format!("{}/event/{}?invite={}", state.config.frontend_url, event_id, token)
        );

        let outbox = mailer.sent();
        assert_eq!(outbox.len(), 1);
        assert_eq!(outbox[0].to, "bob@example.com");
        assert!(outbox[0].subject.contains("Aperitivo"));
        assert!(outbox[0].body.contains(token));

        // il creatore e il destinatario vedono l'invito, gli altri no
        assert_eq!(invitations_of(&server, &alice).await.len(), 1);
        assert_eq!(invitations_of(&server, &bob).await.len(), 1);
        assert!(invitations_of(&server, &carol).await.is_empty());
        Ok(())
    }

    #[sqlx::test]
    async fn test_create_invitation_rules(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;

        // solo chi gestisce gli inviti dell'evento
        invite(&server, &bob, &event_id, "carol@example.com")
            .await
            .assert_status_forbidden();
        invite(&server, &alice, &event_id, "carol")
            .await
            .assert_status_bad_request();
        invite(&server, &alice, "00000000-0000-0000-0000-000000000000", "carol@example.com")
            .await
            .assert_status_not_found();

        invite(&server, &alice, &event_id, "carol@example.com")
            .await
            .assert_status(StatusCode::CREATED);
        invite(&server, &alice, &event_id, "carol@example.com")
            .await
            .assert_status(StatusCode::CONFLICT);
        Ok(())
    }

    // ============================================================
    // Accettazione
    // ============================================================

    #[sqlx::test]
    async fn test_accept_email_invitation(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let carol = register(&server, "carol").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;

        let sent: Value = invite(&server, &alice, &event_id, "bob@example.com")
            .await
            .json();
        let token = sent["token"].as_str().unwrap();

        // il token è personale
        server
            .post("/api/events/accept-invitation/")
            .add_header(auth_header(), format!("Bearer {}", carol.token))
            .json(&json!({ "event_id": event_id, "token": token }))
            .await
            .assert_status_forbidden();

        let body: Value = server
            .get("/api/events/verify-invitation/")
            .add_query_param("token", token)
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .await
            .json();
        assert_eq!(body["valid"], true);
        assert_eq!(body["event_id"], event_id.as_str());

        let response = server
            .post("/api/events/accept-invitation/")
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .json(&json!({ "event_id": event_id, "token": token }))
            .await;
        response.assert_status_ok();
        let accepted: Value = response.json();

        let circle: Value = server
            .get(&format!("/api/events/circles/{}/", accepted["circle_id"]))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .await
            .json();
        assert_eq!(circle["is_invitation_circle"], true);

        let event: Value = server
            .get(&format!("/api/events/event/{}/", event_id))
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .await
            .json();
        assert_eq!(event["participants_count"], 1);

        let updated: Value = server
            .get(&format!("/api/events/invitations/{}/", sent["id"]))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .await
            .json();
        assert_eq!(updated["accepted"], true);
        assert!(updated["accepted_at"].is_string());

        // l'invito per email non apre il link pubblico
        server
            .get(&format!("/api/events/public-event/{}/", event_id))
            .add_query_param("invite", token)
            .await
            .assert_status_forbidden();
        Ok(())
    }

    // ============================================================
    // Lettura ed eliminazione
    // ============================================================

    #[sqlx::test]
    async fn test_get_and_delete_invitation(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let carol = register(&server, "carol").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;

        let sent: Value = invite(&server, &alice, &event_id, "bob@example.com")
            .await
            .json();
        let url = format!("/api/events/invitations/{}/", sent["id"]);

        server
            .get(&url)
            .add_header(auth_header(), format!("Bearer {}", bob.token))
            .await
            .assert_status_ok();
        server
            .get(&url)
            .add_header(auth_header(), format!("Bearer {}", carol.token))
            .await
            .assert_status_not_found();

        // il destinatario non può eliminare l'invito
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
    // Token di condivisione
    // ============================================================

    #[sqlx::test]
    async fn test_share_token_reuses_live_link(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;
        let bob = register(&server, "bob").await;
        let circle_id = create_circle(&server, &alice, "Amici", &[]).await;
        let event_id = create_event_in_circle(&server, &alice, circle_id, false).await;

        let share = |user: &TestUser| {
            server
                .post("/api/events/event-share-token/")
                .add_header(auth_header(), bearer(&user.token))
                .json(&json!({ "event": event_id }))
        };

        share(&bob).await.assert_status_forbidden();

        let first: Value = share(&alice).await.json();
        let second: Value = share(&alice).await.json();
        assert_eq!(first["token"].as_str().map(str::len), Some(43));
        assert_eq!(first["token"], second["token"]);
        assert_eq!(first["circle_id"], second["circle_id"]);

        // dopo una rotazione viene restituito il nuovo token
        let rotated: Value = server
            .post(&format!("/api/events/event/{}/invite/", event_id))
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .await
            .json();
        let third: Value = share(&alice).await.json();
        assert_eq!(third["token"], rotated["token"]);
        assert_ne!(third["token"], first["token"]);
        Ok(())
    }

    #[sqlx::test]
    async fn test_share_token_requires_shareable_link(pool: SqlitePool) -> sqlx::Result<()> {
        let state = create_test_state(pool);
        let server = create_test_server(state);
        let alice = register(&server, "alice").await;

        let response = create_event(
            &server,
            &alice,
            json!({
                "title": "Privata",
                "start_time": "2030-05-01T19:00:00Z",
                "shareable_link": false,
            }),
        )
        .await;
        let event_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

        server
            .post("/api/events/event-share-token/")
            .add_header(auth_header(), format!("Bearer {}", alice.token))
            .json(&json!({ "event": event_id }))
            .await
            .assert_status_bad_request();
        Ok(())
    }
}
