//! Contact message repository.

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::ContactMessageRecord;
use super::pool::{DbError, SqlitePool};
use super::{format_datetime, parse_datetime};
use crate::models::ContactMessage;
use crate::schema::contact_messages;

impl From<ContactMessageRecord> for ContactMessage {
    fn from(record: ContactMessageRecord) -> Self {
        ContactMessage {
            id: record.id,
            name: record.name,
            email: record.email,
            subject: record.subject,
            message: record.message,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

#[derive(Clone)]
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, message: &ContactMessage) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;

        diesel::insert_into(contact_messages::table)
            .values(ContactMessageRecord {
                id: message.id.clone(),
                name: message.name.clone(),
                email: message.email.clone(),
                subject: message.subject.clone(),
                message: message.message.clone(),
                created_at: format_datetime(&message.created_at),
            })
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    /// Most recent messages first.
    pub async fn recent(&self, limit: i64) -> Result<Vec<ContactMessage>, DbError> {
        let mut conn = self.pool.get().await?;

        contact_messages::table
            .order(contact_messages::created_at.desc())
            .limit(limit)
            .load::<ContactMessageRecord>(&mut conn)
            .await
            .map(|records| records.into_iter().map(ContactMessage::from).collect())
    }
}
