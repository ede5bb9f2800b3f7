use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::OptionalExtension;
use uuid::Uuid;

use fable_types::{Notification, NotificationKind, Page};

use crate::db::DbPool;

const NOTIFICATION_COLUMNS: &str =
    "n.id, n.recipient_id, n.sender_id, u.username, n.kind, n.message, n.link, n.is_read, n.created_at";

/// Input for a single notification row; the repository assigns id and
/// timestamp at insert time.
pub struct NewNotification {
    pub recipient_id: Uuid,
    pub sender_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub link: Option<String>,
}

pub struct NotificationRepository {
    pool: DbPool,
}

fn notification_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Notification> {
    let kind: String = row.get(4)?;
    Ok(Notification {
        id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
        recipient_id: Uuid::parse_str(&row.get::<_, String>(1)?).unwrap(),
        sender_id: row
            .get::<_, Option<String>>(2)?
            .map(|s| Uuid::parse_str(&s).unwrap()),
        sender_username: row.get(3)?,
        kind: NotificationKind::parse(&kind).unwrap(),
        message: row.get(5)?,
        link: row.get(6)?,
        is_read: row.get(7)?,
        created_at: row.get::<_, String>(8)?.parse::<DateTime<Utc>>().unwrap(),
    })
}

impl NotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Insert one notification row
    pub fn create(&self, new: &NewNotification) -> Result<Notification> {
        let conn = self.pool.get()?;
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        conn.execute(
            "INSERT INTO notifications (id, recipient_id, sender_id, kind, message, link, is_read, created_at)
             VALUES (?, ?, ?, ?, ?, ?, 0, ?)",
            (
                id.to_string(),
                new.recipient_id.to_string(),
                new.sender_id.map(|s| s.to_string()),
                new.kind.as_str(),
                &new.message,
                &new.link,
                created_at.to_rfc3339(),
            ),
        )
        .context("Failed to create notification")?;

        let sender_username = match new.sender_id {
            Some(sender_id) => conn
                .query_row(
                    "SELECT username FROM users WHERE id = ?",
                    [sender_id.to_string()],
                    |row| row.get(0),
                )
                .optional()?,
            None => None,
        };

        Ok(Notification {
            id,
            recipient_id: new.recipient_id,
            sender_id: new.sender_id,
            sender_username,
            kind: new.kind,
            message: new.message.clone(),
            link: new.link.clone(),
            is_read: false,
            created_at,
        })
    }

    pub fn get_by_id(&self, notification_id: &Uuid) -> Result<Option<Notification>> {
        let conn = self.pool.get()?;
        let notification = conn
            .query_row(
                &format!(
                    "SELECT {NOTIFICATION_COLUMNS} FROM notifications n
                     LEFT JOIN users u ON n.sender_id = u.id
                     WHERE n.id = ?"
                ),
                [notification_id.to_string()],
                notification_from_row,
            )
            .optional()?;
        Ok(notification)
    }

    /// One page of a user's notifications, newest first. When `unread_only`
    /// is set, read rows are excluded from both the page and the total.
    pub fn page_for_recipient(
        &self,
        recipient_id: &Uuid,
        unread_only: bool,
        page: i64,
        per_page: i64,
    ) -> Result<Page<Notification>> {
        let conn = self.pool.get()?;
        let filter = if unread_only { " AND n.is_read = 0" } else { "" };

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM notifications n WHERE n.recipient_id = ?{filter}"),
            [recipient_id.to_string()],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications n
             LEFT JOIN users u ON n.sender_id = u.id
             WHERE n.recipient_id = ?{filter}
             ORDER BY n.created_at DESC
             LIMIT ? OFFSET ?"
        ))?;
        let items = stmt
            .query_map(
                rusqlite::params![
                    recipient_id.to_string(),
                    per_page,
                    Page::<Notification>::offset(page, per_page)
                ],
                notification_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, total, page, per_page))
    }

    /// Number of unread notifications for a user
    pub fn unread_count(&self, recipient_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = ? AND is_read = 0",
            [recipient_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Mark a single notification read. Returns affected rows.
    pub fn mark_read(&self, notification_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE id = ?",
                [notification_id.to_string()],
            )
            .context("Failed to mark notification read")?;
        Ok(rows)
    }

    /// Mark everything for a user read. Returns affected rows.
    pub fn mark_all_read(&self, recipient_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "UPDATE notifications SET is_read = 1 WHERE recipient_id = ? AND is_read = 0",
                [recipient_id.to_string()],
            )
            .context("Failed to mark notifications read")?;
        Ok(rows)
    }

    pub fn delete(&self, notification_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM notifications WHERE id = ?",
                [notification_id.to_string()],
            )
            .context("Failed to delete notification")?;
        Ok(rows)
    }

    pub fn delete_all_for_recipient(&self, recipient_id: &Uuid) -> Result<usize> {
        let conn = self.pool.get()?;
        let rows = conn
            .execute(
                "DELETE FROM notifications WHERE recipient_id = ?",
                [recipient_id.to_string()],
            )
            .context("Failed to delete notifications")?;
        Ok(rows)
    }
}
