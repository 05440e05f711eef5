use common::UserRole;
use serde_json::{Value, json};

use crate::common::{TestApp, routes};

/// Full replacement body built from the event's current state.
async fn update_body(app: &TestApp, token: &str, event_id: i32) -> Value {
    let res = app.get_with_token(&routes::event(event_id), token).await;
    assert_eq!(res.status, 200, "get_event failed: {}", res.text);
    let e = res.body;
    json!({
        "title": e["title"],
        "description": e["description"],
        "seat_map_id": e["seat_map_id"],
        "max_teams": e["max_teams"],
        "max_players": e["max_players"],
        "team_size": e["team_size"],
        "registration_start": e["registration_start"],
        "registration_end": e["registration_end"],
        "event_start": e["event_start"],
        "event_end": e["event_end"],
    })
}

mod event_creation {
    use super::*;

    #[tokio::test]
    async fn organizer_creates_an_event_they_own() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;

        let id = app.create_event(&org.token, json!({})).await;
        let res = app.get_with_token(&routes::event(id), &org.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["organizer_id"], org.id);
        assert_eq!(res.body["status"], "REGISTRATION_OPEN");
        assert_eq!(res.body["team_count"], 0);
    }

    #[tokio::test]
    async fn players_cannot_create_events() {
        let app = TestApp::spawn().await;
        let player = app.create_player("alice").await;

        let res = app
            .post_with_token(
                routes::EVENTS,
                &json!({
                    "title": "Mine",
                    "max_teams": 2,
                    "max_players": 10,
                    "team_size": 5,
                    "registration_start": "2020-01-01T00:00:00Z",
                    "registration_end": "2099-01-01T00:00:00Z",
                    "event_start": "2099-02-01T00:00:00Z",
                    "event_end": "2099-02-02T00:00:00Z",
                }),
                &player.token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn rejects_inverted_windows_and_late_initial_status() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let base = json!({
            "title": "Bad",
            "max_teams": 2,
            "max_players": 10,
            "team_size": 5,
            "registration_start": "2099-01-01T00:00:00Z",
            "registration_end": "2020-01-01T00:00:00Z",
            "event_start": "2099-02-01T00:00:00Z",
            "event_end": "2099-02-02T00:00:00Z",
        });

        let inverted = app.post_with_token(routes::EVENTS, &base, &org.token).await;
        assert_eq!(inverted.status, 400);
        assert_eq!(inverted.body["code"], "VALIDATION_ERROR");

        let mut late = base.clone();
        late["registration_start"] = json!("2020-01-01T00:00:00Z");
        late["registration_end"] = json!("2099-01-01T00:00:00Z");
        late["status"] = json!("IN_PROGRESS");
        let res = app.post_with_token(routes::EVENTS, &late, &org.token).await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn unknown_seat_map_is_rejected() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;

        let res = app
            .post_with_token(
                routes::EVENTS,
                &json!({
                    "title": "Seated",
                    "seat_map_id": 9999,
                    "max_teams": 2,
                    "max_players": 10,
                    "team_size": 5,
                    "registration_start": "2020-01-01T00:00:00Z",
                    "registration_end": "2099-01-01T00:00:00Z",
                    "event_start": "2099-02-01T00:00:00Z",
                    "event_end": "2099-02-02T00:00:00Z",
                }),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod event_visibility {
    use super::*;

    #[tokio::test]
    async fn drafts_are_hidden_from_other_players() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let player = app.create_player("alice").await;
        let draft = app.create_event(&org.token, json!({"status": "DRAFT", "title": "Secret"})).await;
        app.create_event(&org.token, json!({"title": "Public"})).await;

        let get = app.get_with_token(&routes::event(draft), &player.token).await;
        assert_eq!(get.status, 404);

        let list = app.get_with_token(routes::EVENTS, &player.token).await;
        assert_eq!(list.status, 200);
        let titles: Vec<&str> = list.body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Public"]);

        let own = app.get_with_token(routes::EVENTS, &org.token).await;
        assert_eq!(own.body["pagination"]["total"], 2);
    }

    #[tokio::test]
    async fn search_sort_and_paging_compose() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        for title in ["Gamma Cup", "alpha cup", "Beta Cup", "Unrelated"] {
            app.create_event(&org.token, json!({"title": title})).await;
        }

        let res = app
            .get_with_token(
                &format!("{}?search=CUP&sort_by=title&sort_order=asc&per_page=2", routes::EVENTS),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 2);
    }

    #[tokio::test]
    async fn absurd_page_numbers_return_an_empty_page() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        app.create_event(&org.token, json!({})).await;

        let res = app
            .get_with_token(
                &format!("{}?page=1844674407370955161&per_page=100", routes::EVENTS),
                &org.token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["total"], 1);
        assert!(res.body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_sort_column_is_rejected() {
        let app = TestApp::spawn().await;
        let player = app.create_player("alice").await;

        let res = app
            .get_with_token(&format!("{}?sort_by=organizer_id", routes::EVENTS), &player.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod event_update {
    use super::*;

    #[tokio::test]
    async fn only_the_owning_organizer_or_staff_may_edit() {
        let app = TestApp::spawn().await;
        let owner = app.create_user_with_role("owner", UserRole::Organizer).await;
        let rival = app.create_user_with_role("rival", UserRole::Organizer).await;
        let admin = app.create_user_with_role("admin", UserRole::Admin).await;
        let id = app.create_event(&owner.token, json!({})).await;

        let mut body = update_body(&app, &owner.token, id).await;
        body["title"] = json!("Renamed");

        let denied = app.put_with_token(&routes::event(id), &body, &rival.token).await;
        assert_eq!(denied.status, 403);

        let by_owner = app.put_with_token(&routes::event(id), &body, &owner.token).await;
        assert_eq!(by_owner.status, 200, "{}", by_owner.text);
        assert_eq!(by_owner.body["title"], "Renamed");

        body["title"] = json!("Renamed Again");
        let by_admin = app.put_with_token(&routes::event(id), &body, &admin.token).await;
        assert_eq!(by_admin.status, 200);

        let rows = app.wait_for_audit("event.update", 2).await;
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.before.is_some() && r.after.is_some()));
    }

    #[tokio::test]
    async fn status_moves_only_along_the_lifecycle() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let id = app.create_event(&org.token, json!({"status": "DRAFT"})).await;
        let mut body = update_body(&app, &org.token, id).await;

        body["status"] = json!("IN_PROGRESS");
        let skip = app.put_with_token(&routes::event(id), &body, &org.token).await;
        assert_eq!(skip.status, 400);

        body["status"] = json!("PUBLISHED");
        let ok = app.put_with_token(&routes::event(id), &body, &org.token).await;
        assert_eq!(ok.status, 200);
        assert_eq!(ok.body["status"], "PUBLISHED");
    }

    #[tokio::test]
    async fn cancelling_notifies_active_registrants() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let player = app.create_player("alice").await;
        let id = app.create_event(&org.token, json!({})).await;
        app.register_for_event(&player.token, id, None).await;

        let mut body = update_body(&app, &org.token, id).await;
        body["status"] = json!("CANCELLED");
        let res = app.put_with_token(&routes::event(id), &body, &org.token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let notes = app.wait_for_notifications(player.id, "event.cancelled", 1).await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].entity_id, Some(id));
    }

    #[tokio::test]
    async fn max_teams_cannot_drop_below_existing_teams() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let player = app.create_player("alice").await;
        let id = app.create_event(&org.token, json!({"max_teams": 2})).await;
        app.register_for_event(&player.token, id, None).await;
        let team = app
            .post_with_token(routes::TEAMS, &json!({"event_id": id, "name": "Owls"}), &player.token)
            .await;
        assert_eq!(team.status, 201, "{}", team.text);

        let mut body = update_body(&app, &org.token, id).await;
        body["max_teams"] = json!(0);
        let res = app.put_with_token(&routes::event(id), &body, &org.token).await;

        assert_eq!(res.status, 400);
    }
}

mod capacity_shrink {
    use super::*;

    #[tokio::test]
    async fn team_size_cannot_drop_below_the_largest_roster() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let id = app.create_event(&org.token, json!({"team_size": 5})).await;
        let mut players = Vec::new();
        for i in 0..3 {
            let p = app.create_player(&format!("p{i}")).await;
            app.register_for_event(&p.token, id, None).await;
            players.push(p);
        }
        let team = app
            .post_with_token(routes::TEAMS, &json!({"event_id": id, "name": "Owls"}), &players[0].token)
            .await;
        assert_eq!(team.status, 201, "{}", team.text);
        for p in &players[1..] {
            let res = app
                .post_with_token(&routes::team_members(team.id()), &json!({}), &p.token)
                .await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let mut body = update_body(&app, &org.token, id).await;
        body["team_size"] = json!(2);
        let shrink = app.put_with_token(&routes::event(id), &body, &org.token).await;
        assert_eq!(shrink.status, 409, "{}", shrink.text);
        assert_eq!(shrink.body["code"], "CONFLICT");

        body["team_size"] = json!(3);
        let fits = app.put_with_token(&routes::event(id), &body, &org.token).await;
        assert_eq!(fits.status, 200, "{}", fits.text);
        assert_eq!(fits.body["team_size"], 3);

        let detail = app.get_with_token(&routes::team(team.id()), &org.token).await;
        assert_eq!(detail.body["members"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn max_players_cannot_drop_below_active_registrations() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let id = app.create_event(&org.token, json!({"max_players": 10})).await;
        for name in ["alice", "bob"] {
            let p = app.create_player(name).await;
            app.register_for_event(&p.token, id, None).await;
        }

        let mut body = update_body(&app, &org.token, id).await;
        body["max_players"] = json!(1);
        let res = app.put_with_token(&routes::event(id), &body, &org.token).await;
        assert_eq!(res.status, 409);
        assert_eq!(res.body["code"], "CONFLICT");

        body["max_players"] = json!(2);
        let ok = app.put_with_token(&routes::event(id), &body, &org.token).await;
        assert_eq!(ok.status, 200, "{}", ok.text);
    }

    #[tokio::test]
    async fn cancelled_events_freeze_team_rosters() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let id = app.create_event(&org.token, json!({})).await;
        let alice = app.create_player("alice").await;
        let bob = app.create_player("bob").await;
        app.register_for_event(&alice.token, id, None).await;
        app.register_for_event(&bob.token, id, None).await;
        let team = app
            .post_with_token(routes::TEAMS, &json!({"event_id": id, "name": "Owls"}), &alice.token)
            .await;
        assert_eq!(team.status, 201, "{}", team.text);

        let mut body = update_body(&app, &org.token, id).await;
        body["status"] = json!("CANCELLED");
        let cancel = app.put_with_token(&routes::event(id), &body, &org.token).await;
        assert_eq!(cancel.status, 200, "{}", cancel.text);

        let join = app
            .post_with_token(&routes::team_members(team.id()), &json!({}), &bob.token)
            .await;
        assert_eq!(join.status, 409);
        assert_eq!(join.body["code"], "CONFLICT");

        let new_team = app
            .post_with_token(routes::TEAMS, &json!({"event_id": id, "name": "Larks"}), &org.token)
            .await;
        assert_eq!(new_team.status, 409);
        assert_eq!(new_team.body["code"], "CONFLICT");
    }
}

mod event_deletion {
    use super::*;

    #[tokio::test]
    async fn superadmin_delete_cascades_and_frees_seats() {
        let app = TestApp::spawn().await;
        let root = app.create_user_with_role("root", UserRole::Superadmin).await;
        let player = app.create_player("alice").await;
        let map = app.create_seat_map(&root.token, 2, 1).await;
        let id = app.create_event(&root.token, json!({"seat_map_id": map})).await;
        let seats = app.event_seat_ids(&root.token, id).await;
        app.register_for_event(&player.token, id, Some(seats[0])).await;

        let res = app.delete_with_token(&routes::event(id), &root.token).await;
        assert_eq!(res.status, 204, "{}", res.text);

        let gone = app.get_with_token(&routes::event(id), &root.token).await;
        assert_eq!(gone.status, 404);

        let mine = app.get_with_token(routes::REGISTRATIONS, &player.token).await;
        assert_eq!(mine.body["pagination"]["total"], 0);

        let map_res = app.get_with_token(&routes::seat_map(map), &root.token).await;
        assert!(
            map_res.body["seats"]
                .as_array()
                .unwrap()
                .iter()
                .all(|s| s["status"] == "AVAILABLE"),
            "{}",
            map_res.text
        );
    }

    #[tokio::test]
    async fn organizers_cannot_delete_even_their_own_events() {
        let app = TestApp::spawn().await;
        let org = app.create_user_with_role("org", UserRole::Organizer).await;
        let id = app.create_event(&org.token, json!({})).await;

        let res = app.delete_with_token(&routes::event(id), &org.token).await;

        assert_eq!(res.status, 403);
    }
}
