use crate::store::{Channel, Store, StoreError};
use rusqlite::params;

impl Store {
    /// Insert the channel or replace its title/link if the id is known.
    pub fn upsert_channel(&self, channel: &Channel) -> Result<(), StoreError> {
        self.db()
            .prepare("INSERT OR REPLACE INTO Channels VALUES (?, ?, ?)")?
            .execute(params![
                channel.channel_id,
                channel.title,
                channel.invite_link,
            ])?;
        info!("Channel added: {}", channel.title);
        Ok(())
    }

    pub fn all_channels(&self) -> Result<Vec<Channel>, StoreError> {
        let mut stmt = self
            .db()
            .prepare("SELECT channel_id, title, invite_link FROM Channels")?;
        let rows = stmt.query_map(params![], |row| {
            Ok(Channel {
                channel_id: row.get(0)?,
                title: row.get(1)?,
                invite_link: row.get(2)?,
            })
        })?;
        let mut channels = Vec::new();
        for row in rows {
            channels.push(row?);
        }
        Ok(channels)
    }

    pub fn delete_channel(&self, channel_id: i64) -> Result<(), StoreError> {
        let affected = self
            .db()
            .prepare("DELETE FROM Channels WHERE channel_id = ?")?
            .execute(params![channel_id])?;
        match affected {
            0 => Err(StoreError::NoSuchChannel(channel_id)),
            _ => {
                info!("Channel deleted: {}", channel_id);
                Ok(())
            }
        }
    }
}
