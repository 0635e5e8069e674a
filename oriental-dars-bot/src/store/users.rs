use crate::store::{
    now_stamp, today_bounds, AdminEntry, Store, StoreError, StoredUser, UserProfile, UserStats,
};
use rusqlite::{params, OptionalExtension};

impl Store {
    /// Insert the user on first contact, or refresh the profile and
    /// last-active time of a known one. Returns `true` for a new user.
    pub fn register_user(&self, profile: &UserProfile) -> Result<bool, StoreError> {
        let txn = self.db().unchecked_transaction()?;
        let known: Option<i64> = txn
            .prepare("SELECT id FROM Users WHERE telegram_id = ?")?
            .query_row(params![profile.telegram_id], |row| row.get(0))
            .optional()?;

        let now = now_stamp();
        match known {
            None => {
                txn.prepare(concat!(
                    "INSERT INTO Users(telegram_id, username, first_name, last_name,\n",
                    "                  created_at, last_active)\n",
                    "VALUES(?, ?, ?, ?, ?, ?)",
                ))?
                .execute(params![
                    profile.telegram_id,
                    profile.username,
                    profile.first_name,
                    profile.last_name,
                    now,
                    now,
                ])?;
                txn.commit()?;
                Ok(true)
            }
            Some(_) => {
                txn.prepare(concat!(
                    "UPDATE Users SET username = ?, first_name = ?, last_name = ?,\n",
                    "                 last_active = ?\n",
                    "WHERE telegram_id = ?",
                ))?
                .execute(params![
                    profile.username,
                    profile.first_name,
                    profile.last_name,
                    now,
                    profile.telegram_id,
                ])?;
                txn.commit()?;
                Ok(false)
            }
        }
    }

    pub fn user_by_telegram_id(&self, telegram_id: i64) -> Result<Option<StoredUser>, StoreError> {
        let user = self
            .db()
            .prepare(concat!(
                "SELECT telegram_id, username, first_name, last_name, faculty,\n",
                "       is_blocked, is_admin, created_at, last_active, total_downloads\n",
                "FROM Users WHERE telegram_id = ?",
            ))?
            .query_row(params![telegram_id], |row| {
                Ok(StoredUser {
                    telegram_id: row.get(0)?,
                    username: row.get(1)?,
                    first_name: row.get(2)?,
                    last_name: row.get(3)?,
                    faculty: row.get(4)?,
                    is_blocked: row.get(5)?,
                    is_admin: row.get(6)?,
                    created_at: row.get(7)?,
                    last_active: row.get(8)?,
                    total_downloads: row.get(9)?,
                })
            })
            .optional()?;
        Ok(user)
    }

    /// Refresh the last-active stamp. A no-op for unknown users.
    pub fn touch_last_active(&self, telegram_id: i64) -> Result<(), StoreError> {
        self.db()
            .prepare("UPDATE Users SET last_active = ? WHERE telegram_id = ?")?
            .execute(params![now_stamp(), telegram_id])?;
        Ok(())
    }

    pub fn set_faculty(&self, telegram_id: i64, faculty: &str) -> Result<(), StoreError> {
        self.db()
            .prepare("UPDATE Users SET faculty = ? WHERE telegram_id = ?")?
            .execute(params![faculty, telegram_id])?;
        Ok(())
    }

    pub fn user_faculty(&self, telegram_id: i64) -> Result<Option<String>, StoreError> {
        Ok(self
            .user_by_telegram_id(telegram_id)?
            .and_then(|user| user.faculty))
    }

    pub fn is_admin(&self, telegram_id: i64) -> Result<bool, StoreError> {
        Ok(self
            .user_by_telegram_id(telegram_id)?
            .map(|user| user.is_admin)
            .unwrap_or(false))
    }

    pub fn grant_admin(&self, telegram_id: i64) -> Result<(), StoreError> {
        let affected = self
            .db()
            .prepare("UPDATE Users SET is_admin = 1 WHERE telegram_id = ?")?
            .execute(params![telegram_id])?;
        match affected {
            0 => Err(StoreError::NoSuchUser(telegram_id)),
            _ => Ok(()),
        }
    }

    pub fn revoke_admin(&self, telegram_id: i64) -> Result<(), StoreError> {
        let affected = self
            .db()
            .prepare("UPDATE Users SET is_admin = 0 WHERE telegram_id = ?")?
            .execute(params![telegram_id])?;
        match affected {
            0 => Err(StoreError::NoSuchUser(telegram_id)),
            _ => Ok(()),
        }
    }

    pub fn list_admins(&self) -> Result<Vec<AdminEntry>, StoreError> {
        let mut stmt = self.db().prepare(concat!(
            "SELECT telegram_id, username, first_name\n",
            "FROM Users WHERE is_admin = 1 ORDER BY telegram_id",
        ))?;
        let rows = stmt.query_map(params![], |row| {
            Ok(AdminEntry {
                telegram_id: row.get(0)?,
                username: row.get(1)?,
                first_name: row.get(2)?,
            })
        })?;
        let mut admins = Vec::new();
        for row in rows {
            admins.push(row?);
        }
        Ok(admins)
    }

    pub fn increment_user_downloads(&self, telegram_id: i64) -> Result<(), StoreError> {
        self.db()
            .prepare(concat!(
                "UPDATE Users SET total_downloads = total_downloads + 1\n",
                "WHERE telegram_id = ?",
            ))?
            .execute(params![telegram_id])?;
        Ok(())
    }

    pub fn user_stats(&self) -> Result<UserStats, StoreError> {
        let (today, tomorrow) = today_bounds();
        let count = |sql: &str, params: &[&dyn rusqlite::ToSql]| -> Result<i64, StoreError> {
            Ok(self.db().prepare(sql)?.query_row(params, |row| row.get(0))?)
        };

        let total = count("SELECT COUNT(*) FROM Users WHERE is_blocked = 0", &[])?;
        let new_today = count(
            "SELECT COUNT(*) FROM Users WHERE created_at >= ? AND created_at < ?",
            &[&today, &tomorrow],
        )?;
        let active_today = count(
            concat!(
                "SELECT COUNT(*) FROM Users\n",
                "WHERE last_active >= ? AND last_active < ? AND is_blocked = 0",
            ),
            &[&today, &tomorrow],
        )?;
        Ok(UserStats {
            total,
            new_today,
            active_today,
        })
    }

    /// Telegram ids of every non-blocked user, for broadcasts.
    pub fn active_user_ids(&self) -> Result<Vec<i64>, StoreError> {
        let mut stmt = self
            .db()
            .prepare("SELECT telegram_id FROM Users WHERE is_blocked = 0")?;
        let rows = stmt.query_map(params![], |row| row.get(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }
}
