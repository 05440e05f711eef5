use common::UserRole;
use serde_json::json;

use crate::common::{TestApp, routes};

mod announcements {
    use super::*;

    #[tokio::test]
    async fn posting_notifies_every_active_registrant() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;
        let alice = app.create_player("alice").await;
        let bob = app.create_player("bob").await;
        let carol = app.create_player("carol").await;
        app.register_for_event(&alice.token, event, None).await;
        app.register_for_event(&bob.token, event, None).await;
        let cancelled = app.register_for_event(&carol.token, event, None).await;
        app.delete_with_token(&routes::registration(cancelled), &carol.token)
            .await;

        let res = app
            .post_with_token(
                &routes::event_announcements(event),
                &json!({"title": "Doors open", "body": "Doors open at **9:00**."}),
                &org.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["author_id"], org.id);

        assert_eq!(app.wait_for_notifications(alice.id, "announcement", 1).await.len(), 1);
        assert_eq!(app.wait_for_notifications(bob.id, "announcement", 1).await.len(), 1);
        assert!(app.wait_for_notifications(carol.id, "announcement", 0).await.is_empty());
    }

    #[tokio::test]
    async fn players_cannot_post() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;
        let player = app.create_player("alice").await;

        let res = app
            .post_with_token(
                &routes::event_announcements(event),
                &json!({"title": "Fake", "body": "Not from staff."}),
                &player.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn blank_body_is_rejected() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;

        let res = app
            .post_with_token(
                &routes::event_announcements(event),
                &json!({"title": "Empty", "body": "   "}),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;
        let player = app.create_player("alice").await;
        for title in ["First", "Second"] {
            let res = app
                .post_with_token(
                    &routes::event_announcements(event),
                    &json!({"title": title, "body": "News."}),
                    &org.token,
                )
                .await;
            assert_eq!(res.status, 201);
        }

        let res = app
            .get_with_token(&routes::event_announcements(event), &player.token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body[0]["title"], "Second");
        assert_eq!(res.body[1]["title"], "First");
    }
}
