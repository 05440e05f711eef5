use common::UserRole;
use serde_json::json;

use crate::common::{TestApp, routes};

mod seat_map_creation {
    use super::*;

    #[tokio::test]
    async fn creates_a_labelled_grid_with_vip_seats() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;

        let res = app
            .post_with_token(
                routes::SEAT_MAPS,
                &json!({
                    "name": "Main Hall",
                    "width": 3,
                    "height": 2,
                    "vip_seats": [{"row": 1, "col": 2}],
                }),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["created_by"], org.id);
        let seats = res.body["seats"].as_array().unwrap();
        assert_eq!(seats.len(), 6);
        let labels: Vec<&str> = seats.iter().map(|s| s["label"].as_str().unwrap()).collect();
        assert_eq!(labels, vec!["A1", "A2", "A3", "B1", "B2", "B3"]);
        assert_eq!(seats[5]["seat_type"], "VIP");
        assert!(seats[..5].iter().all(|s| s["seat_type"] == "REGULAR"));
        assert!(seats.iter().all(|s| s["status"] == "AVAILABLE"));
    }

    #[tokio::test]
    async fn rejects_out_of_range_dimensions_and_vip_positions() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;

        let too_wide = app
            .post_with_token(
                routes::SEAT_MAPS,
                &json!({"name": "Huge", "width": 101, "height": 1}),
                &org.token,
            )
            .await;
        assert_eq!(too_wide.status, 400);

        let stray_vip = app
            .post_with_token(
                routes::SEAT_MAPS,
                &json!({"name": "Small", "width": 2, "height": 2, "vip_seats": [{"row": 2, "col": 0}]}),
                &org.token,
            )
            .await;
        assert_eq!(stray_vip.status, 400);
        assert_eq!(stray_vip.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn players_cannot_create_seat_maps() {
        let app = TestApp::spawn().await;
        let player = app.create_player("alice").await;

        let res = app
            .post_with_token(
                routes::SEAT_MAPS,
                &json!({"name": "Mine", "width": 1, "height": 1}),
                &player.token,
            )
            .await;

        assert_eq!(res.status, 403);
    }
}

mod seat_map_deletion {
    use super::*;

    #[tokio::test]
    async fn map_in_use_cannot_be_deleted_and_keeps_its_seats() {
        let app = TestApp::spawn().await;
        let root = app.create_user_with_role("root", UserRole::Superadmin).await;
        let player = app.create_player("alice").await;
        let map = app.create_seat_map(&root.token, 2, 2).await;
        let event = app.create_event(&root.token, json!({"seat_map_id": map})).await;
        let seats = app.event_seat_ids(&root.token, event).await;
        app.register_for_event(&player.token, event, Some(seats[0])).await;

        let res = app.delete_with_token(&routes::seat_map(map), &root.token).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        let after = app.get_with_token(&routes::seat_map(map), &root.token).await;
        assert_eq!(after.status, 200);
        let seats = after.body["seats"].as_array().unwrap();
        assert_eq!(seats.len(), 4);
        assert_eq!(seats[0]["status"], "RESERVED");
    }

    #[tokio::test]
    async fn unused_map_is_deleted_with_its_seats() {
        let app = TestApp::spawn().await;
        let root = app.create_user_with_role("root", UserRole::Superadmin).await;
        let map = app.create_seat_map(&root.token, 2, 2).await;

        let res = app.delete_with_token(&routes::seat_map(map), &root.token).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let gone = app.get_with_token(&routes::seat_map(map), &root.token).await;
        assert_eq!(gone.status, 404);

        let rows = app.wait_for_audit("seat_map.delete", 1).await;
        assert_eq!(rows[0].entity_id, Some(map));
    }

    #[tokio::test]
    async fn only_superadmin_may_delete() {
        let app = TestApp::spawn().await;
        let admin = app.create_user_with_role("admin", UserRole::Admin).await;
        let map = app.create_seat_map(&admin.token, 1, 1).await;

        let res = app.delete_with_token(&routes::seat_map(map), &admin.token).await;

        assert_eq!(res.status, 403);
    }
}

mod event_seats {
    use super::*;

    #[tokio::test]
    async fn counts_reflect_reservations() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let player = app.create_player("alice").await;
        let map = app.create_seat_map(&org.token, 3, 1).await;
        let event = app.create_event(&org.token, json!({"seat_map_id": map})).await;
        let seats = app.event_seat_ids(&org.token, event).await;
        app.register_for_event(&player.token, event, Some(seats[1])).await;

        let res = app.get_with_token(&routes::event_seats(event), &player.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["seat_map_id"], map);
        assert_eq!(res.body["available"], 2);
        assert_eq!(res.body["reserved"], 1);
    }

    #[tokio::test]
    async fn unseated_event_has_no_seats() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;

        let res = app.get_with_token(&routes::event_seats(event), &org.token).await;

        assert_eq!(res.status, 404);
    }
}
