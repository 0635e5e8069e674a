use crate::store::{
    constraints, Faculty, FacultyLesson, Lesson, LessonSummary, NewLesson, RecentLesson, Store,
    StoreError,
};
use rusqlite::{params, OptionalExtension, Transaction};

impl Store {
    pub fn add_faculty(&self, name: &str) -> Result<Faculty, StoreError> {
        self.db()
            .prepare("INSERT INTO Fakultet(name) VALUES(?)")?
            .execute(params![name])
            .map_err(constraints![
                unique => (|| StoreError::DuplicateFacultyName(name.to_owned())),
                fk => ?,
            ])?;
        info!("Faculty added: {}", name);
        Ok(Faculty {
            id: self.db().last_insert_rowid(),
            name: name.to_owned(),
        })
    }

    /// Insert every missing faculty from the default list. Returns how many
    /// rows were actually created.
    pub fn seed_faculties(&self, names: &[&str]) -> Result<usize, StoreError> {
        let txn = self.db().unchecked_transaction()?;
        let mut created = 0;
        for name in names {
            created += txn
                .prepare("INSERT OR IGNORE INTO Fakultet(name) VALUES(?)")?
                .execute(params![name])?;
        }
        txn.commit()?;
        Ok(created)
    }

    pub fn all_faculties(&self) -> Result<Vec<Faculty>, StoreError> {
        let mut stmt = self
            .db()
            .prepare("SELECT id, name FROM Fakultet ORDER BY name")?;
        let rows = stmt.query_map(params![], |row| {
            Ok(Faculty {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;
        let mut faculties = Vec::new();
        for row in rows {
            faculties.push(row?);
        }
        Ok(faculties)
    }

    pub fn faculty_by_id(&self, id: i64) -> Result<Option<Faculty>, StoreError> {
        let faculty = self
            .db()
            .prepare("SELECT id, name FROM Fakultet WHERE id = ?")?
            .query_row(params![id], |row| {
                Ok(Faculty {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?;
        Ok(faculty)
    }

    pub fn faculty_by_name(&self, name: &str) -> Result<Option<Faculty>, StoreError> {
        let faculty = self
            .db()
            .prepare("SELECT id, name FROM Fakultet WHERE name = ?")?
            .query_row(params![name], |row| {
                Ok(Faculty {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })
            .optional()?;
        Ok(faculty)
    }

    /// Topics and lessons of the faculty go with it (`ON DELETE CASCADE`).
    pub fn delete_faculty(&self, id: i64) -> Result<(), StoreError> {
        let affected = self
            .db()
            .prepare("DELETE FROM Fakultet WHERE id = ?")?
            .execute(params![id])?;
        match affected {
            0 => Err(StoreError::NoSuchFaculty(id)),
            _ => {
                info!("Faculty deleted: {}", id);
                Ok(())
            }
        }
    }

    pub fn add_lesson(&self, new: &NewLesson) -> Result<(), StoreError> {
        let txn = self.db().unchecked_transaction()?;
        let mavzu_id = match new.topic {
            Some(ref topic) => Some(get_or_create_topic(&txn, new.faculty_id, topic)?),
            None => None,
        };
        txn.prepare(concat!(
            "INSERT INTO Lesson(fakultet_id, mavzu_id, code, title, file_id,\n",
            "                   file_name, file_size)\n",
            "VALUES(?, ?, ?, ?, ?, ?, ?)",
        ))?
        .execute(params![
            new.faculty_id,
            mavzu_id,
            new.code,
            new.title,
            new.file_id,
            new.file_name,
            new.file_size,
        ])
        .map_err(constraints![
            unique => (|| StoreError::DuplicateLessonCode(new.code.clone())),
            fk => (|| StoreError::NoSuchFaculty(new.faculty_id)),
        ])?;
        txn.commit()?;
        info!("Lesson added: {} - {}", new.code, new.title);
        Ok(())
    }

    /// Every lesson of the faculty with its topic name (null for
    /// uncategorized ones).
    pub fn faculty_lessons(&self, faculty_id: i64) -> Result<Vec<FacultyLesson>, StoreError> {
        let mut stmt = self.db().prepare(concat!(
            "SELECT m.name, l.code, l.title, l.count_download\n",
            "FROM Lesson l\n",
            "LEFT JOIN Mavzu m ON l.mavzu_id = m.id\n",
            "WHERE l.fakultet_id = ?\n",
            "ORDER BY m.name, l.title",
        ))?;
        let rows = stmt.query_map(params![faculty_id], |row| {
            Ok(FacultyLesson {
                topic: row.get(0)?,
                lesson: LessonSummary {
                    code: row.get(1)?,
                    title: row.get(2)?,
                    downloads: row.get(3)?,
                },
            })
        })?;
        let mut lessons = Vec::new();
        for row in rows {
            lessons.push(row?);
        }
        Ok(lessons)
    }

    /// Lessons of one topic; `None` selects the uncategorized bucket.
    pub fn topic_lessons(
        &self,
        faculty_id: i64,
        topic: Option<&str>,
    ) -> Result<Vec<LessonSummary>, StoreError> {
        let mut lessons = Vec::new();
        match topic {
            Some(topic) => {
                let mut stmt = self.db().prepare(concat!(
                    "SELECT l.code, l.title, l.count_download\n",
                    "FROM Lesson l\n",
                    "JOIN Mavzu m ON l.mavzu_id = m.id\n",
                    "WHERE l.fakultet_id = ? AND m.name = ?\n",
                    "ORDER BY l.title",
                ))?;
                let rows = stmt.query_map(params![faculty_id, topic], map_summary)?;
                for row in rows {
                    lessons.push(row?);
                }
            }
            None => {
                let mut stmt = self.db().prepare(concat!(
                    "SELECT l.code, l.title, l.count_download\n",
                    "FROM Lesson l\n",
                    "WHERE l.fakultet_id = ? AND l.mavzu_id IS NULL\n",
                    "ORDER BY l.title",
                ))?;
                let rows = stmt.query_map(params![faculty_id], map_summary)?;
                for row in rows {
                    lessons.push(row?);
                }
            }
        }
        Ok(lessons)
    }

    pub fn lesson_by_code(&self, code: &str) -> Result<Option<Lesson>, StoreError> {
        let lesson = self
            .db()
            .prepare(concat!(
                "SELECT id, fakultet_id, mavzu_id, code, title, file_id,\n",
                "       file_name, file_size, created_at, count_download\n",
                "FROM Lesson WHERE code = ?",
            ))?
            .query_row(params![code], |row| {
                Ok(Lesson {
                    id: row.get(0)?,
                    faculty_id: row.get(1)?,
                    topic_id: row.get(2)?,
                    code: row.get(3)?,
                    title: row.get(4)?,
                    file_id: row.get(5)?,
                    file_name: row.get(6)?,
                    file_size: row.get(7)?,
                    created_at: row.get(8)?,
                    downloads: row.get(9)?,
                })
            })
            .optional()?;
        Ok(lesson)
    }

    pub fn delete_lesson(&self, code: &str) -> Result<(), StoreError> {
        let affected = self
            .db()
            .prepare("DELETE FROM Lesson WHERE code = ?")?
            .execute(params![code])?;
        match affected {
            0 => Err(StoreError::NoSuchLesson(code.to_owned())),
            _ => {
                info!("Lesson deleted: {}", code);
                Ok(())
            }
        }
    }

    pub fn bump_lesson_downloads(&self, code: &str) -> Result<(), StoreError> {
        let affected = self
            .db()
            .prepare(concat!(
                "UPDATE Lesson SET count_download = count_download + 1\n",
                "WHERE code = ?",
            ))?
            .execute(params![code])?;
        match affected {
            0 => Err(StoreError::NoSuchLesson(code.to_owned())),
            _ => Ok(()),
        }
    }

    pub fn recent_lessons(&self, limit: i64) -> Result<Vec<RecentLesson>, StoreError> {
        let mut stmt = self.db().prepare(concat!(
            "SELECT code, title, created_at, length(file_id)\n",
            "FROM Lesson ORDER BY created_at DESC LIMIT ?",
        ))?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(RecentLesson {
                code: row.get(0)?,
                title: row.get(1)?,
                created_at: row.get(2)?,
                file_id_len: row.get(3)?,
            })
        })?;
        let mut lessons = Vec::new();
        for row in rows {
            lessons.push(row?);
        }
        Ok(lessons)
    }
}

fn map_summary(row: &rusqlite::Row<'_>) -> rusqlite::Result<LessonSummary> {
    Ok(LessonSummary {
        code: row.get(0)?,
        title: row.get(1)?,
        downloads: row.get(2)?,
    })
}

/// Topics come into existence with the first lesson that names them.
fn get_or_create_topic(
    txn: &Transaction<'_>,
    faculty_id: i64,
    name: &str,
) -> Result<i64, StoreError> {
    let existing: Option<i64> = txn
        .prepare("SELECT id FROM Mavzu WHERE fakultet_id = ? AND name = ?")?
        .query_row(params![faculty_id, name], |row| row.get(0))
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }

    txn.prepare("INSERT INTO Mavzu(fakultet_id, name) VALUES(?, ?)")?
        .execute(params![faculty_id, name])
        .map_err(constraints![
            unique => ?,
            fk => (|| StoreError::NoSuchFaculty(faculty_id)),
        ])?;
    Ok(txn.last_insert_rowid())
}
