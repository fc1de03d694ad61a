use diesel::prelude::*;
use uuid::Uuid;

use vizinho_shared::clients::db::DbPool;
use vizinho_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{NewNotification, Notification};
use crate::schema::notifications;

fn get_conn(
    pool: &DbPool,
) -> AppResult<diesel::r2d2::PooledConnection<diesel::r2d2::ConnectionManager<PgConnection>>> {
    pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })
}

pub fn create_notification(
    pool: &DbPool,
    user_id: Uuid,
    notification_type: &str,
    title: &str,
    message: Option<String>,
    data: Option<serde_json::Value>,
) -> AppResult<Notification> {
    let mut conn = get_conn(pool)?;

    let notification = diesel::insert_into(notifications::table)
        .values(&NewNotification {
            user_id,
            notification_type: notification_type.to_string(),
            title: title.to_string(),
            message,
            data,
        })
        .get_result::<Notification>(&mut conn)?;

    tracing::debug!(
        notification_id = %notification.id,
        user_id = %user_id,
        notification_type = %notification_type,
        "notification created"
    );

    Ok(notification)
}

pub fn list_notifications(
    pool: &DbPool,
    user_id: Uuid,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<Notification>, i64)> {
    let mut conn = get_conn(pool)?;

    let base = move || {
        let mut query = notifications::table
            .filter(notifications::user_id.eq(user_id))
            .into_boxed();
        if unread_only {
            query = query.filter(notifications::read.eq(false));
        }
        query
    };

    let total: i64 = base().count().get_result(&mut conn)?;

    let items = base()
        .order(notifications::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load::<Notification>(&mut conn)?;

    Ok((items, total))
}

pub fn count_unread(pool: &DbPool, user_id: Uuid) -> AppResult<i64> {
    let mut conn = get_conn(pool)?;

    let count: i64 = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::read.eq(false))
        .count()
        .get_result(&mut conn)?;

    Ok(count)
}

pub fn mark_all_read(pool: &DbPool, user_id: Uuid) -> AppResult<usize> {
    let mut conn = get_conn(pool)?;

    let updated = diesel::update(
        notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::read.eq(false)),
    )
    .set(notifications::read.eq(true))
    .execute(&mut conn)?;

    Ok(updated)
}

/// Mark a single notification as read, scoped to the owning user.
pub fn mark_read(pool: &DbPool, notification_id: Uuid, user_id: Uuid) -> AppResult<Notification> {
    let mut conn = get_conn(pool)?;

    let notification = diesel::update(
        notifications::table
            .filter(notifications::id.eq(notification_id))
            .filter(notifications::user_id.eq(user_id)),
    )
    .set(notifications::read.eq(true))
    .get_result::<Notification>(&mut conn)
    .map_err(|e| match e {
        diesel::result::Error::NotFound => {
            AppError::new(ErrorCode::NotificationNotFound, "notification not found")
        }
        other => AppError::Database(other),
    })?;

    Ok(notification)
}
