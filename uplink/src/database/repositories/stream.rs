//! Tracked stream repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uplink_platforms::Platform;

use crate::Result;
use crate::database::models::TrackedStream;
use crate::database::time::{datetime_to_ms, now_ms};

/// Tracked stream repository trait.
#[async_trait]
pub trait StreamRepository: Send + Sync {
    /// Every tracked stream, in insertion order.
    async fn list_streams(&self) -> Result<Vec<TrackedStream>>;

    /// One guild's tracked streams, in insertion order.
    async fn list_guild_streams(&self, guild_id: &str) -> Result<Vec<TrackedStream>>;

    async fn get_stream(
        &self,
        guild_id: &str,
        platform: Platform,
        channel_name: &str,
    ) -> Result<Option<TrackedStream>>;

    /// Insert the record, or on conflict refresh `announce_channel_id` and
    /// `custom_message` from the set fields of `stream` while preserving the
    /// existing announcement state.
    async fn upsert_stream(&self, stream: &TrackedStream) -> Result<()>;

    /// Partial update of destination and/or message; unset arguments leave
    /// the stored value alone. Returns false when the tuple is not tracked.
    async fn update_stream_details(
        &self,
        guild_id: &str,
        platform: Platform,
        channel_name: &str,
        announce_channel_id: Option<&str>,
        custom_message: Option<&str>,
    ) -> Result<bool>;

    async fn set_last_announced(
        &self,
        guild_id: &str,
        platform: Platform,
        channel_name: &str,
        announced_at: DateTime<Utc>,
    ) -> Result<()>;

    async fn clear_last_announced(
        &self,
        guild_id: &str,
        platform: Platform,
        channel_name: &str,
    ) -> Result<()>;

    /// Returns false when the tuple was not tracked.
    async fn delete_stream(
        &self,
        guild_id: &str,
        platform: Platform,
        channel_name: &str,
    ) -> Result<bool>;

    /// Drop every record of a guild; returns the number removed.
    async fn delete_guild_streams(&self, guild_id: &str) -> Result<u64>;
}

/// SQLx implementation of StreamRepository.
pub struct SqlxStreamRepository {
    pool: SqlitePool,
}

impl SqlxStreamRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StreamRepository for SqlxStreamRepository {
    async fn list_streams(&self) -> Result<Vec<TrackedStream>> {
        // rowid order is insertion order for this table.
        let streams =
            sqlx::query_as::<_, TrackedStream>("SELECT * FROM tracked_streams ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;
        Ok(streams)
    }

    async fn list_guild_streams(&self, guild_id: &str) -> Result<Vec<TrackedStream>> {
        let streams = sqlx::query_as::<_, TrackedStream>(
            "SELECT * FROM tracked_streams WHERE guild_id = ? ORDER BY rowid",
        )
        .bind(guild_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(streams)
    }

    async fn get_stream(
        &self,
        guild_id: &str,
        platform: Platform,
        channel_name: &str,
    ) -> Result<Option<TrackedStream>> {
        let stream = sqlx::query_as::<_, TrackedStream>(
            "SELECT * FROM tracked_streams WHERE guild_id = ? AND platform = ? AND channel_name = ?",
        )
        .bind(guild_id)
        .bind(platform.as_str())
        .bind(channel_name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(stream)
    }

    async fn upsert_stream(&self, stream: &TrackedStream) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO tracked_streams (
                guild_id, platform, channel_name, announce_channel_id,
                custom_message, last_announced_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (guild_id, platform, channel_name) DO UPDATE SET
                announce_channel_id =
                    COALESCE(excluded.announce_channel_id, tracked_streams.announce_channel_id),
                custom_message =
                    COALESCE(excluded.custom_message, tracked_streams.custom_message),
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&stream.guild_id)
        .bind(&stream.platform)
        .bind(&stream.channel_name)
        .bind(&stream.announce_channel_id)
        .bind(&stream.custom_message)
        .bind(stream.last_announced_at)
        .bind(stream.created_at)
        .bind(stream.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_stream_details(
        &self,
        guild_id: &str,
        platform: Platform,
        channel_name: &str,
        announce_channel_id: Option<&str>,
        custom_message: Option<&str>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tracked_streams SET
                announce_channel_id = COALESCE(?, announce_channel_id),
                custom_message = COALESCE(?, custom_message),
                updated_at = ?
            WHERE guild_id = ? AND platform = ? AND channel_name = ?
            "#,
        )
        .bind(announce_channel_id)
        .bind(custom_message)
        .bind(now_ms())
        .bind(guild_id)
        .bind(platform.as_str())
        .bind(channel_name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_last_announced(
        &self,
        guild_id: &str,
        platform: Platform,
        channel_name: &str,
        announced_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tracked_streams SET last_announced_at = ?, updated_at = ?
            WHERE guild_id = ? AND platform = ? AND channel_name = ?
            "#,
        )
        .bind(datetime_to_ms(announced_at))
        .bind(now_ms())
        .bind(guild_id)
        .bind(platform.as_str())
        .bind(channel_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_last_announced(
        &self,
        guild_id: &str,
        platform: Platform,
        channel_name: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE tracked_streams SET last_announced_at = NULL, updated_at = ?
            WHERE guild_id = ? AND platform = ? AND channel_name = ?
            "#,
        )
        .bind(now_ms())
        .bind(guild_id)
        .bind(platform.as_str())
        .bind(channel_name)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_stream(
        &self,
        guild_id: &str,
        platform: Platform,
        channel_name: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            "DELETE FROM tracked_streams WHERE guild_id = ? AND platform = ? AND channel_name = ?",
        )
        .bind(guild_id)
        .bind(platform.as_str())
        .bind(channel_name)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_guild_streams(&self, guild_id: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tracked_streams WHERE guild_id = ?")
            .bind(guild_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
