use common::UserRole;
use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::*;
use tracing::{info, warn};

use crate::booking::seats::ACTIVE_SEAT_INDEX;
use crate::config::BootstrapAdmin;
use crate::entity::{registration, seat, team, team_member, user};
use crate::utils::hash;

/// Create the configured SUPERADMIN account if its username is free.
///
/// An existing account with that username is left untouched.
pub async fn seed_bootstrap_admin(
    db: &DatabaseConnection,
    admin: &BootstrapAdmin,
) -> Result<(), DbErr> {
    let exists = user::Entity::find()
        .filter(user::Column::Username.eq(&admin.username))
        .count(db)
        .await?
        > 0;
    if exists {
        return Ok(());
    }

    let password = hash::hash_password(&admin.password)
        .map_err(|e| DbErr::Custom(format!("Password hash error: {e}")))?;

    let model = user::ActiveModel {
        username: Set(admin.username.clone()),
        email: Set(admin.email.clone()),
        display_name: Set(None),
        password: Set(password),
        role: Set(UserRole::Superadmin),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = user::Entity::insert(model)
        .on_conflict(
            sea_orm::sea_query::OnConflict::column(user::Column::Username)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(db)
        .await;

    match result {
        Ok(_) => info!(username = %admin.username, "Seeded bootstrap superadmin"),
        Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e),
    }
    Ok(())
}

async fn create_index(db: &DatabaseConnection, stmt: IndexCreateStatement) -> Result<(), DbErr> {
    let sql = stmt.to_string(PostgresQueryBuilder);
    db.execute_unprepared(&sql).await?;
    Ok(())
}

/// Ensure the composite and partial unique indexes exist.
///
/// Schema sync only creates single-column indexes. These back the booking
/// invariants, so failing to create one aborts startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_index(
        db,
        Index::create()
            .if_not_exists()
            .unique()
            .name("uq_registration_user_event")
            .table(registration::Entity)
            .col(registration::Column::UserId)
            .col(registration::Column::EventId)
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .if_not_exists()
            .unique()
            .name("uq_seat_map_row_col")
            .table(seat::Entity)
            .col(seat::Column::SeatMapId)
            .col(seat::Column::Row)
            .col(seat::Column::Col)
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .if_not_exists()
            .unique()
            .name("uq_team_event_name")
            .table(team::Entity)
            .col(team::Column::EventId)
            .col(team::Column::Name)
            .to_owned(),
    )
    .await?;

    create_index(
        db,
        Index::create()
            .if_not_exists()
            .unique()
            .name("uq_team_member_event_user")
            .table(team_member::Entity)
            .col(team_member::Column::EventId)
            .col(team_member::Column::UserId)
            .to_owned(),
    )
    .await?;

    // A seat can back at most one live registration.
    let partial = format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {ACTIVE_SEAT_INDEX} ON registration (seat_id) \
         WHERE seat_id IS NOT NULL AND status IN ('PENDING', 'CONFIRMED')"
    );
    db.execute_unprepared(&partial).await?;

    // Non-unique; speeds up the admin audit browser.
    let stmt = Index::create()
        .if_not_exists()
        .name("idx_audit_log_entity_created")
        .table(crate::entity::audit_log::Entity)
        .col(crate::entity::audit_log::Column::Entity)
        .col(crate::entity::audit_log::Column::CreatedAt)
        .to_string(PostgresQueryBuilder);
    if let Err(e) = db.execute_unprepared(&stmt).await {
        warn!("Failed to create index idx_audit_log_entity_created: {}", e);
    }

    info!("Ensured booking indexes exist");
    Ok(())
}
