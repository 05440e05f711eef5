use common::UserRole;
use futures::future::join_all;
use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

/// Organizer plus an open event on a `width` x 1 seat map.
async fn seated_event(app: &TestApp, width: i32) -> (TestUser, i32, Vec<i32>) {
    let org = app.create_user_with_role("org", UserRole::Organizer).await;
    let map = app.create_seat_map(&org.token, width, 1).await;
    let event = app.create_event(&org.token, json!({"seat_map_id": map})).await;
    let seats = app.event_seat_ids(&org.token, event).await;
    (org, event, seats)
}

mod seat_claims {
    use super::*;

    #[tokio::test]
    async fn claiming_a_seat_reserves_it() {
        let app = TestApp::spawn().await;
        let (_, event, seats) = seated_event(&app, 2).await;
        let player = app.create_player("alice").await;

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({"event_id": event, "seat_id": seats[0]}),
                &player.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["status"], "PENDING");
        assert_eq!(res.body["seat_id"], seats[0]);
        assert_eq!(res.body["user_id"], player.id);

        let view = app.get_with_token(&routes::event_seats(event), &player.token).await;
        assert_eq!(view.body["reserved"], 1);
        assert_eq!(view.body["seats"][0]["status"], "RESERVED");
    }

    #[tokio::test]
    async fn a_reserved_seat_cannot_be_claimed_again() {
        let app = TestApp::spawn().await;
        let (_, event, seats) = seated_event(&app, 2).await;
        let alice = app.create_player("alice").await;
        let bob = app.create_player("bob").await;
        app.register_for_event(&alice.token, event, Some(seats[0])).await;

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({"event_id": event, "seat_id": seats[0]}),
                &bob.token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "SEAT_UNAVAILABLE");

        let mine = app.get_with_token(routes::REGISTRATIONS, &bob.token).await;
        assert_eq!(mine.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn concurrent_claims_on_one_seat_have_exactly_one_winner() {
        let app = TestApp::spawn().await;
        let (_, event, seats) = seated_event(&app, 1).await;
        let mut players = Vec::new();
        for i in 0..8 {
            players.push(app.create_player(&format!("player{i}")).await);
        }

        let body = json!({"event_id": event, "seat_id": seats[0]});
        let results = join_all(
            players
                .iter()
                .map(|p| app.post_with_token(routes::REGISTRATIONS, &body, &p.token)),
        )
        .await;

        let winners = results.iter().filter(|r| r.status == 201).count();
        assert_eq!(winners, 1, "{:?}", results.iter().map(|r| &r.text).collect::<Vec<_>>());
        for loser in results.iter().filter(|r| r.status != 201) {
            assert_eq!(loser.status, 409, "{}", loser.text);
            assert_eq!(loser.body["code"], "SEAT_UNAVAILABLE");
        }

        let view = app.get_with_token(&routes::event_seats(event), &players[0].token).await;
        assert_eq!(view.body["reserved"], 1);
    }

    #[tokio::test]
    async fn seat_from_another_map_is_unavailable() {
        let app = TestApp::spawn().await;
        let (org, event, _) = seated_event(&app, 1).await;
        let other_map = app.create_seat_map(&org.token, 1, 1).await;
        let other_seat = app
            .get_with_token(&routes::seat_map(other_map), &org.token)
            .await
            .body["seats"][0]["id"]
            .as_i64()
            .unwrap() as i32;
        let player = app.create_player("alice").await;

        let res = app
            .post_with_token(
                routes::REGISTRATIONS,
                &json!({"event_id": event, "seat_id": other_seat}),
                &player.token,
            )
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "SEAT_UNAVAILABLE");
    }
}

mod registration_rules {
    use super::*;

    #[tokio::test]
    async fn second_registration_for_the_same_event_is_rejected() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;
        let player = app.create_player("alice").await;
        app.register_for_event(&player.token, event, None).await;

        let res = app
            .post_with_token(routes::REGISTRATIONS, &json!({"event_id": event}), &player.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "DUPLICATE_REGISTRATION");
    }

    #[tokio::test]
    async fn event_capacity_is_enforced() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({"max_players": 1})).await;
        let alice = app.create_player("alice").await;
        let bob = app.create_player("bob").await;
        app.register_for_event(&alice.token, event, None).await;

        let res = app
            .post_with_token(routes::REGISTRATIONS, &json!({"event_id": event}), &bob.token)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CAPACITY_EXCEEDED");
    }

    #[tokio::test]
    async fn closed_and_draft_events_refuse_registrations() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let expired = app
            .create_event(
                &org.token,
                json!({"registration_start": "2020-01-01T00:00:00Z", "registration_end": "2020-06-01T00:00:00Z"}),
            )
            .await;
        let draft = app.create_event(&org.token, json!({"status": "DRAFT"})).await;
        let player = app.create_player("alice").await;

        let late = app
            .post_with_token(routes::REGISTRATIONS, &json!({"event_id": expired}), &player.token)
            .await;
        assert_eq!(late.status, 400);
        assert_eq!(late.body["code"], "REGISTRATION_CLOSED");

        let hidden = app
            .post_with_token(routes::REGISTRATIONS, &json!({"event_id": draft}), &player.token)
            .await;
        assert_eq!(hidden.status, 404);
    }

    #[tokio::test]
    async fn registration_is_audited_and_notified() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;
        let player = app.create_player("alice").await;
        let id = app.register_for_event(&player.token, event, None).await;

        let audits = app.wait_for_audit("registration.create", 1).await;
        assert_eq!(audits[0].actor_id, Some(player.id));
        assert_eq!(audits[0].entity_id, Some(id));

        let notes = app
            .wait_for_notifications(player.id, "registration.created", 1)
            .await;
        assert_eq!(notes.len(), 1);

        let listed = app.get_with_token(routes::NOTIFICATIONS, &player.token).await;
        assert_eq!(listed.status, 200);
        let note_id = listed.body["data"][0]["id"].as_i64().unwrap() as i32;
        assert_eq!(listed.body["data"][0]["read"], false);

        let read = app
            .patch_with_token(&routes::notification_read(note_id), &json!({}), &player.token)
            .await;
        assert_eq!(read.status, 200, "{}", read.text);
        assert_eq!(read.body["read"], true);

        let unread = app
            .get_with_token(&format!("{}?unread=true", routes::NOTIFICATIONS), &player.token)
            .await;
        assert_eq!(unread.body["pagination"]["total"], 0);
    }
}

mod registration_lifecycle {
    use super::*;

    #[tokio::test]
    async fn cancelling_releases_the_seat_for_someone_else() {
        let app = TestApp::spawn().await;
        let (_, event, seats) = seated_event(&app, 1).await;
        let alice = app.create_player("alice").await;
        let bob = app.create_player("bob").await;
        let reg = app.register_for_event(&alice.token, event, Some(seats[0])).await;

        let res = app.delete_with_token(&routes::registration(reg), &alice.token).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let mine = app.get_with_token(&routes::registration(reg), &alice.token).await;
        assert_eq!(mine.body["status"], "CANCELLED");

        app.register_for_event(&bob.token, event, Some(seats[0])).await;
    }

    #[tokio::test]
    async fn organizer_confirms_and_player_cannot() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;
        let player = app.create_player("alice").await;
        let reg = app.register_for_event(&player.token, event, None).await;

        let self_confirm = app
            .patch_with_token(&routes::registration(reg), &json!({"status": "CONFIRMED"}), &player.token)
            .await;
        assert_eq!(self_confirm.status, 403);

        let confirm = app
            .patch_with_token(&routes::registration(reg), &json!({"status": "CONFIRMED"}), &org.token)
            .await;
        assert_eq!(confirm.status, 200, "{}", confirm.text);
        assert_eq!(confirm.body["status"], "CONFIRMED");

        let notes = app
            .wait_for_notifications(player.id, "registration.status", 1)
            .await;
        assert_eq!(notes.len(), 1);

        let reject = app
            .patch_with_token(&routes::registration(reg), &json!({"status": "REJECTED"}), &org.token)
            .await;
        assert_eq!(reject.status, 400);
        assert_eq!(reject.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn other_players_cannot_see_a_registration() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;
        let alice = app.create_player("alice").await;
        let bob = app.create_player("bob").await;
        let reg = app.register_for_event(&alice.token, event, None).await;

        let peek = app.get_with_token(&routes::registration(reg), &bob.token).await;
        assert_eq!(peek.status, 404);

        let cancel = app.delete_with_token(&routes::registration(reg), &bob.token).await;
        assert_eq!(cancel.status, 404);

        let by_org = app.get_with_token(&routes::registration(reg), &org.token).await;
        assert_eq!(by_org.status, 200);
    }
}

mod registration_listing {
    use super::*;

    #[tokio::test]
    async fn managers_see_the_whole_event_players_see_their_own() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let event = app.create_event(&org.token, json!({})).await;
        let alice = app.create_player("alice").await;
        let bob = app.create_player("bob").await;
        app.register_for_event(&alice.token, event, None).await;
        app.register_for_event(&bob.token, event, None).await;

        let path = format!("{}?event_id={event}", routes::REGISTRATIONS);

        let by_org = app.get_with_token(&path, &org.token).await;
        assert_eq!(by_org.status, 200, "{}", by_org.text);
        assert_eq!(by_org.body["pagination"]["total"], 2);

        let by_alice = app.get_with_token(&path, &alice.token).await;
        assert_eq!(by_alice.body["pagination"]["total"], 1);
        assert_eq!(by_alice.body["data"][0]["user_id"], alice.id);
    }
}
