use common::UserRole;
use serde_json::json;

use crate::common::{TestApp, routes};

mod users {
    use super::*;

    #[tokio::test]
    async fn staff_can_list_and_filter_users() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", UserRole::Admin).await;
        app.create_player("alice").await;
        app.create_player("alfred").await;
        app.create_user_with_role("org", UserRole::Organizer).await;

        let search = app
            .get_with_token(&format!("{}?search=AL", routes::ADMIN_USERS), &admin.token)
            .await;
        assert_eq!(search.status, 200, "{}", search.text);
        assert_eq!(search.body["pagination"]["total"], 2);
        assert!(search.body["data"][0].get("password").is_none());

        let organizers = app
            .get_with_token(&format!("{}?role=ORGANIZER", routes::ADMIN_USERS), &admin.token)
            .await;
        assert_eq!(organizers.body["pagination"]["total"], 1);
    }

    #[tokio::test]
    async fn players_and_organizers_cannot_list_users() {
        let app = TestApp::spawn().await;
        let player = app.create_player("alice").await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;

        assert_eq!(app.get_with_token(routes::ADMIN_USERS, &player.token).await.status, 403);
        assert_eq!(app.get_with_token(routes::ADMIN_USERS, &org.token).await.status, 403);
        assert_eq!(app.get_with_token(routes::ADMIN_ROLES, &player.token).await.status, 403);
    }

    #[tokio::test]
    async fn roles_endpoint_lists_every_role() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", UserRole::Admin).await;

        let res = app.get_with_token(routes::ADMIN_ROLES, &admin.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, json!(["PLAYER", "ORGANIZER", "ADMIN", "SUPERADMIN"]));
    }
}

mod role_changes {
    use super::*;

    #[tokio::test]
    async fn superadmin_promotes_and_the_user_is_notified() {
        let app = TestApp::spawn().await;
        let root = app.create_user_with_role("root", UserRole::Superadmin).await;
        let player = app.create_player("alice").await;

        let res = app
            .patch_with_token(
                &routes::admin_user_role(player.id),
                &json!({"role": "ORGANIZER"}),
                &root.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["role"], "ORGANIZER");

        let notes = app.wait_for_notifications(player.id, "user.role", 1).await;
        assert_eq!(notes.len(), 1);

        let audits = app.wait_for_audit("user.role", 1).await;
        assert_eq!(audits[0].before.as_ref().unwrap()["role"], "PLAYER");
        assert_eq!(audits[0].after.as_ref().unwrap()["role"], "ORGANIZER");
    }

    #[tokio::test]
    async fn admins_cannot_change_roles() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", UserRole::Admin).await;
        let player = app.create_player("alice").await;

        let res = app
            .patch_with_token(
                &routes::admin_user_role(player.id),
                &json!({"role": "ADMIN"}),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn superadmin_cannot_change_their_own_role() {
        let app = TestApp::spawn().await;
        let root = app.create_user_with_role("root", UserRole::Superadmin).await;

        let res = app
            .patch_with_token(
                &routes::admin_user_role(root.id),
                &json!({"role": "PLAYER"}),
                &root.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod audit_and_registrations {
    use super::*;

    #[tokio::test]
    async fn audit_log_is_filterable_and_staff_only() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", UserRole::Admin).await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;
        app.wait_for_audit("event.create", 1).await;

        let res = app
            .get_with_token(
                &format!("{}?entity=event&actor_id={}", routes::ADMIN_AUDIT_LOGS, org.id),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["action"], "event.create");
        assert_eq!(res.body["data"][0]["entity_id"], event);

        let denied = app.get_with_token(routes::ADMIN_AUDIT_LOGS, &org.token).await;
        assert_eq!(denied.status, 403);
    }

    #[tokio::test]
    async fn organizer_sees_registrations_of_their_own_event_only() {
        let app = TestApp::spawn().await;
        let owner = app.create_user_with_role("owner", UserRole::Organizer).await;
        let rival = app.create_user_with_role("rival", UserRole::Organizer).await;
        let event = app.create_event(&owner.token, json!({})).await;
        for name in ["alice", "bob"] {
            let p = app.create_player(name).await;
            app.register_for_event(&p.token, event, None).await;
        }

        let res = app
            .get_with_token(&routes::admin_event_registrations(event), &owner.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 2);

        let denied = app
            .get_with_token(&routes::admin_event_registrations(event), &rival.token)
            .await;
        assert_eq!(denied.status, 403);
    }
}
