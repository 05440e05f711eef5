use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod sign_up {
    use super::*;

    #[tokio::test]
    async fn new_user_registers_as_a_player() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "alice", "email": "alice@example.com", "password": PASSWORD}),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert!(res.body["id"].is_number());
        assert_eq!(res.body["username"], "alice");
        assert_eq!(res.body["role"], "PLAYER");
    }

    #[tokio::test]
    async fn cannot_register_with_an_already_taken_username() {
        let app = TestApp::spawn().await;
        let body = json!({"username": "alice", "email": "alice@example.com", "password": PASSWORD});

        let first = app.post_without_token(routes::REGISTER, &body).await;
        assert_eq!(first.status, 201, "First registration failed: {}", first.text);

        let res = app.post_without_token(routes::REGISTER, &body).await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "USERNAME_TAKEN");
    }

    #[tokio::test]
    async fn rejects_short_passwords_and_bad_usernames() {
        let app = TestApp::spawn().await;

        let short = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "alice", "email": "alice@example.com", "password": "short"}),
            )
            .await;
        assert_eq!(short.status, 400);
        assert_eq!(short.body["code"], "VALIDATION_ERROR");

        let spaces = app
            .post_without_token(
                routes::REGISTER,
                &json!({"username": "no spaces!", "email": "x@example.com", "password": PASSWORD}),
            )
            .await;
        assert_eq!(spaces.status, 400);
        assert_eq!(spaces.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn registration_is_audited() {
        let app = TestApp::spawn().await;
        let user = app.create_player("alice").await;

        let rows = app.wait_for_audit("user.register", 1).await;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].entity, "user");
        assert_eq!(rows[0].entity_id, Some(user.id));
        let after = rows[0].after.as_ref().expect("after snapshot");
        assert!(after.get("password").is_none(), "password hash leaked: {after}");
    }
}

mod sign_in {
    use super::*;

    #[tokio::test]
    async fn login_returns_a_token_that_identifies_the_user() {
        let app = TestApp::spawn().await;
        let user = app.create_player("alice").await;

        let me = app.get_with_token(routes::ME, &user.token).await;

        assert_eq!(me.status, 200);
        assert_eq!(me.body["id"], user.id);
        assert_eq!(me.body["username"], "alice");
        assert_eq!(me.body["email"], "alice@example.com");
        assert_eq!(me.body["role"], "PLAYER");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let app = TestApp::spawn().await;
        app.create_player("alice").await;

        let wrong = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "alice", "password": "not-the-password"}),
            )
            .await;
        let unknown = app
            .post_without_token(
                routes::LOGIN,
                &json!({"username": "nobody", "password": PASSWORD}),
            )
            .await;

        assert_eq!(wrong.status, 401);
        assert_eq!(wrong.body["code"], "INVALID_CREDENTIALS");
        assert_eq!(unknown.status, 401);
        assert_eq!(unknown.body, wrong.body);
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let app = TestApp::spawn().await;

        let missing = app.get_without_token(routes::ME).await;
        assert_eq!(missing.status, 401);
        assert_eq!(missing.body["code"], "TOKEN_MISSING");

        let garbage = app.get_with_token(routes::ME, "not-a-jwt").await;
        assert_eq!(garbage.status, 401);
        assert_eq!(garbage.body["code"], "TOKEN_INVALID");
    }
}
