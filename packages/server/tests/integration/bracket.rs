use common::UserRole;
use serde_json::json;

use crate::common::{TestApp, routes};

async fn create_bracket(app: &TestApp, token: &str, event: i32) -> i32 {
    let res = app
        .post_with_token(
            routes::BRACKETS,
            &json!({"event_id": event, "name": "Main Stage", "format": "SINGLE_ELIMINATION"}),
            token,
        )
        .await;
    assert_eq!(res.status, 201, "create_bracket failed: {}", res.text);
    res.id()
}

mod bracket_management {
    use super::*;

    #[tokio::test]
    async fn owner_creates_a_pending_bracket() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;

        let id = create_bracket(&app, &org.token, event).await;
        let res = app.get_with_token(&routes::bracket(id), &org.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["status"], "PENDING");
        assert_eq!(res.body["format"], "SINGLE_ELIMINATION");
        assert_eq!(res.body["event_id"], event);
    }

    #[tokio::test]
    async fn other_organizers_and_players_are_denied() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let rival = app.create_user_with_role("rival", UserRole::Organizer).await;
        let player = app.create_player("alice").await;
        let event = app.create_event(&org.token, json!({})).await;
        let body = json!({"event_id": event, "name": "Side", "format": "ROUND_ROBIN"});

        let by_rival = app.post_with_token(routes::BRACKETS, &body, &rival.token).await;
        assert_eq!(by_rival.status, 403);

        let by_player = app.post_with_token(routes::BRACKETS, &body, &player.token).await;
        assert_eq!(by_player.status, 403);
    }

    #[tokio::test]
    async fn status_follows_the_bracket_lifecycle() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;
        let id = create_bracket(&app, &org.token, event).await;

        let skip = app
            .patch_with_token(&routes::bracket(id), &json!({"status": "COMPLETED"}), &org.token)
            .await;
        assert_eq!(skip.status, 400);

        let start = app
            .patch_with_token(&routes::bracket(id), &json!({"status": "IN_PROGRESS"}), &org.token)
            .await;
        assert_eq!(start.status, 200, "{}", start.text);

        let finish = app
            .patch_with_token(
                &routes::bracket(id),
                &json!({"status": "COMPLETED", "name": "Grand Final"}),
                &org.token,
            )
            .await;
        assert_eq!(finish.status, 200);
        assert_eq!(finish.body["status"], "COMPLETED");
        assert_eq!(finish.body["name"], "Grand Final");

        let reopen = app
            .patch_with_token(&routes::bracket(id), &json!({"status": "PENDING"}), &org.token)
            .await;
        assert_eq!(reopen.status, 400);
    }

    #[tokio::test]
    async fn unknown_format_is_rejected() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;

        let res = app
            .post_with_token(
                routes::BRACKETS,
                &json!({"event_id": event, "name": "Odd", "format": "SWISS"}),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn list_filters_by_event_and_hides_drafts() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let player = app.create_player("alice").await;
        let open = app.create_event(&org.token, json!({})).await;
        let draft = app.create_event(&org.token, json!({"status": "DRAFT"})).await;
        create_bracket(&app, &org.token, open).await;
        create_bracket(&app, &org.token, draft).await;

        let all = app.get_with_token(routes::BRACKETS, &player.token).await;
        assert_eq!(all.status, 200);
        assert_eq!(all.body.as_array().unwrap().len(), 1);

        let for_open = app
            .get_with_token(&format!("{}?event_id={open}", routes::BRACKETS), &org.token)
            .await;
        assert_eq!(for_open.body.as_array().unwrap().len(), 1);

        let for_draft = app
            .get_with_token(&format!("{}?event_id={draft}", routes::BRACKETS), &player.token)
            .await;
        assert_eq!(for_draft.status, 404);
    }

    #[tokio::test]
    async fn only_superadmin_deletes_brackets() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let root = app.create_user_with_role("root", UserRole::Superadmin).await;
        let event = app.create_event(&org.token, json!({})).await;
        let id = create_bracket(&app, &org.token, event).await;

        let by_org = app.delete_with_token(&routes::bracket(id), &org.token).await;
        assert_eq!(by_org.status, 403);

        let by_root = app.delete_with_token(&routes::bracket(id), &root.token).await;
        assert_eq!(by_root.status, 204);

        let rows = app.wait_for_audit("bracket.delete", 1).await;
        assert_eq!(rows[0].actor_id, Some(root.id));
    }
}
