use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{
    admin, announcement, auth, bracket, event, notification, registration, seat_map, team,
};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/events", event_routes())
        .nest("/seat-maps", seat_map_routes())
        .nest("/registrations", registration_routes())
        .nest("/teams", team_routes())
        .nest("/brackets", bracket_routes())
        .nest("/notifications", notification_routes())
        .nest("/admin", admin_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(auth::register))
        .routes(routes!(auth::login))
        .routes(routes!(auth::me))
}

fn event_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(event::list_events, event::create_event))
        .routes(routes!(
            event::get_event,
            event::update_event,
            event::delete_event
        ))
        .routes(routes!(event::list_event_seats))
        .nest("/{id}/announcements", announcement_routes())
}

fn announcement_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(
        announcement::list_announcements,
        announcement::create_announcement
    ))
}

fn seat_map_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(seat_map::list_seat_maps, seat_map::create_seat_map))
        .routes(routes!(seat_map::get_seat_map, seat_map::delete_seat_map))
}

fn registration_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            registration::list_my_registrations,
            registration::create_registration
        ))
        .routes(routes!(
            registration::get_registration,
            registration::update_registration,
            registration::cancel_registration
        ))
}

fn team_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(team::list_teams, team::create_team))
        .routes(routes!(team::get_team, team::delete_team))
        .routes(routes!(team::add_member))
        .routes(routes!(team::update_member, team::remove_member))
}

fn bracket_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(bracket::list_brackets, bracket::create_bracket))
        .routes(routes!(
            bracket::get_bracket,
            bracket::update_bracket,
            bracket::delete_bracket
        ))
}

fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(notification::list_notifications))
        .routes(routes!(notification::mark_read))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(admin::list_users))
        .routes(routes!(admin::update_user_role))
        .routes(routes!(admin::list_audit_logs))
        .routes(routes!(admin::list_event_registrations))
        .routes(routes!(admin::list_roles))
}
