//! SQLite storage backend

use super::traits::{
    ChapterRemoval, CodexSnapshot, EntityFilter, ManuscriptStore, OpenStore, Restoration,
    StorageError, StorageResult,
};
use crate::model::{
    Chapter, ChapterId, CodexEntity, Content, EntityId, EntityType, Project, ProjectId,
    Relationship, RelationshipId, RelationshipKey, UserId, Version, VersionId, VersionSummary,
};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const CHAPTER_COLUMNS: &str = "id, project_id, title, order_index, content_json, word_count, \
     is_complete, notes, created_at, updated_at";
const VERSION_COLUMNS: &str = "id, project_id, chapter_id, content_json, word_count, description, created_at";
const ENTITY_COLUMNS: &str = "id, project_id, entity_type, name, description, attributes_json, \
     images_json, tags_json, created_at, updated_at";
const RELATIONSHIP_COLUMNS: &str = "id, project_id, source_id, target_id, relationship_type, \
     description, strength, created_at, updated_at";

/// SQLite-backed manuscript store
///
/// One database file holds projects, chapters, versions, entities and
/// relationships. Cascades are carried by foreign keys; compound mutations
/// run inside IMMEDIATE transactions so another connection on the same file
/// cannot interleave with them. Thread-safe via internal mutex on the
/// connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS chapters (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                title TEXT NOT NULL,
                order_index INTEGER NOT NULL,
                content_json TEXT,
                word_count INTEGER NOT NULL DEFAULT 0,
                is_complete INTEGER NOT NULL DEFAULT 0,
                notes TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            -- Dense 1..N ordering per project; renumbering goes through
            -- negative temporaries so this never trips mid-update
            CREATE UNIQUE INDEX IF NOT EXISTS idx_chapters_order
                ON chapters(project_id, order_index);

            CREATE TABLE IF NOT EXISTS versions (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                chapter_id TEXT NOT NULL,
                content_json TEXT,
                word_count INTEGER NOT NULL,
                description TEXT NOT NULL,
                created_at TEXT NOT NULL,
                FOREIGN KEY (chapter_id) REFERENCES chapters(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_versions_chapter
                ON versions(chapter_id, created_at);

            CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                entity_type TEXT NOT NULL,
                name TEXT NOT NULL,
                description TEXT,
                attributes_json TEXT NOT NULL,
                images_json TEXT NOT NULL,
                tags_json TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_entities_type
                ON entities(project_id, entity_type);

            CREATE TABLE IF NOT EXISTS relationships (
                id TEXT PRIMARY KEY,
                project_id TEXT NOT NULL,
                source_id TEXT NOT NULL,
                target_id TEXT NOT NULL,
                relationship_type TEXT NOT NULL,
                description TEXT,
                strength INTEGER NOT NULL CHECK (strength BETWEEN 1 AND 10),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (project_id) REFERENCES projects(id) ON DELETE CASCADE,
                FOREIGN KEY (source_id) REFERENCES entities(id) ON DELETE CASCADE,
                FOREIGN KEY (target_id) REFERENCES entities(id) ON DELETE CASCADE
            );

            CREATE UNIQUE INDEX IF NOT EXISTS idx_relationships_key
                ON relationships(project_id, source_id, target_id, relationship_type);
            CREATE INDEX IF NOT EXISTS idx_relationships_source
                ON relationships(source_id);
            CREATE INDEX IF NOT EXISTS idx_relationships_target
                ON relationships(target_id);

            PRAGMA foreign_keys = ON;

            -- Readers see the last committed state while a write transaction is open
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    // === Row conversion ===

    fn read_chapter(row: &Row<'_>) -> rusqlite::Result<ChapterRow> {
        Ok(ChapterRow {
            id: row.get(0)?,
            project_id: row.get(1)?,
            title: row.get(2)?,
            order_index: row.get(3)?,
            content_json: row.get(4)?,
            word_count: row.get(5)?,
            is_complete: row.get(6)?,
            notes: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn read_version(row: &Row<'_>) -> rusqlite::Result<VersionRow> {
        Ok(VersionRow {
            id: row.get(0)?,
            project_id: row.get(1)?,
            chapter_id: row.get(2)?,
            content_json: row.get(3)?,
            word_count: row.get(4)?,
            description: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn read_entity(row: &Row<'_>) -> rusqlite::Result<EntityRow> {
        Ok(EntityRow {
            id: row.get(0)?,
            project_id: row.get(1)?,
            entity_type: row.get(2)?,
            name: row.get(3)?,
            description: row.get(4)?,
            attributes_json: row.get(5)?,
            images_json: row.get(6)?,
            tags_json: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn read_relationship(row: &Row<'_>) -> rusqlite::Result<RelationshipRow> {
        Ok(RelationshipRow {
            id: row.get(0)?,
            project_id: row.get(1)?,
            source_id: row.get(2)?,
            target_id: row.get(3)?,
            relationship_type: row.get(4)?,
            description: row.get(5)?,
            strength: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    // === Statement helpers shared by single and compound operations ===

    fn select_chapter(conn: &Connection, id: &ChapterId) -> StorageResult<Option<Chapter>> {
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = ?1");
        conn.query_row(&sql, params![id.as_str()], Self::read_chapter)
            .optional()?
            .map(ChapterRow::into_chapter)
            .transpose()
    }

    fn write_chapter_fields(conn: &Connection, chapter: &Chapter) -> StorageResult<usize> {
        let content_json = encode_content(chapter.content.as_ref())?;
        let rows = conn.execute(
            r#"
            UPDATE chapters SET
                title = ?2,
                content_json = ?3,
                word_count = ?4,
                is_complete = ?5,
                notes = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                chapter.id.as_str(),
                chapter.title,
                content_json,
                chapter.word_count,
                chapter.is_complete,
                chapter.notes,
                encode_time(&chapter.updated_at),
            ],
        )?;
        Ok(rows)
    }

    fn select_version(conn: &Connection, id: &VersionId) -> StorageResult<Option<Version>> {
        let sql = format!("SELECT {VERSION_COLUMNS} FROM versions WHERE id = ?1");
        conn.query_row(&sql, params![id.as_str()], Self::read_version)
            .optional()?
            .map(VersionRow::into_version)
            .transpose()
    }

    fn write_version(conn: &Connection, version: &Version) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO versions (id, project_id, chapter_id, content_json, word_count, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                version.id.as_str(),
                version.project_id.as_str(),
                version.chapter_id.as_str(),
                encode_content(version.content.as_ref())?,
                version.word_count,
                version.description,
                encode_time(&version.created_at),
            ],
        )?;
        Ok(())
    }

    fn write_relationship(conn: &Connection, relationship: &Relationship) -> StorageResult<()> {
        conn.execute(
            r#"
            INSERT INTO relationships (id, project_id, source_id, target_id, relationship_type,
                                       description, strength, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                relationship.id.as_str(),
                relationship.project_id.as_str(),
                relationship.source_id.as_str(),
                relationship.target_id.as_str(),
                relationship.relationship_type,
                relationship.description,
                relationship.strength,
                encode_time(&relationship.created_at),
                encode_time(&relationship.updated_at),
            ],
        )?;
        Ok(())
    }

    fn select_entities(
        conn: &Connection,
        project_id: &ProjectId,
        filter: &EntityFilter,
    ) -> StorageResult<Vec<CodexEntity>> {
        let mut sql = format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE project_id = ?");
        let mut params_vec: Vec<String> = vec![project_id.as_str().to_string()];

        if let Some(types) = &filter.types {
            if types.is_empty() {
                return Ok(Vec::new());
            }
            let placeholders: Vec<&str> = types.iter().map(|_| "?").collect();
            sql.push_str(&format!(" AND entity_type IN ({})", placeholders.join(",")));
            params_vec.extend(types.iter().map(|t| t.as_str().to_string()));
        }
        sql.push_str(" ORDER BY created_at, rowid");

        let mut stmt = conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
        let rows = stmt
            .query_map(params_refs.as_slice(), Self::read_entity)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(EntityRow::into_entity).collect()
    }

    fn select_relationships(
        conn: &Connection,
        where_clause: &str,
        key: &str,
    ) -> StorageResult<Vec<Relationship>> {
        let sql = format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE {where_clause} ORDER BY created_at, rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![key], Self::read_relationship)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RelationshipRow::into_relationship).collect()
    }
}

impl OpenStore for SqliteStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl ManuscriptStore for SqliteStore {
    // === Projects ===

    fn save_project(&self, project: &Project) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO projects (id, owner_id, title, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                owner_id = excluded.owner_id,
                title = excluded.title
            "#,
            params![
                project.id.as_str(),
                project.owner_id.as_str(),
                project.title,
                encode_time(&project.created_at),
            ],
        )?;
        Ok(())
    }

    fn load_project(&self, id: &ProjectId) -> StorageResult<Option<Project>> {
        let conn = self.conn()?;
        let row: Option<(String, String, String, String)> = conn
            .query_row(
                "SELECT id, owner_id, title, created_at FROM projects WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        match row {
            Some((id, owner_id, title, created_at)) => Ok(Some(Project {
                id: ProjectId::from_string(id),
                owner_id: UserId::from_string(owner_id),
                title,
                created_at: decode_time(&created_at)?,
            })),
            None => Ok(None),
        }
    }

    fn delete_project(&self, id: &ProjectId) -> StorageResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM projects WHERE id = ?1", params![id.as_str()])?;
        Ok(rows > 0)
    }

    // === Chapters ===

    fn append_chapter(&self, chapter: &Chapter) -> StorageResult<Chapter> {
        let mut conn = self.conn()?;
        // IMMEDIATE takes the write lock before the MAX read, so two appends
        // can never compute the same next index.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let next: u32 = tx.query_row(
            "SELECT COALESCE(MAX(order_index), 0) + 1 FROM chapters WHERE project_id = ?1",
            params![chapter.project_id.as_str()],
            |row| row.get(0),
        )?;

        let mut placed = chapter.clone();
        placed.order_index = next;

        tx.execute(
            r#"
            INSERT INTO chapters (id, project_id, title, order_index, content_json, word_count,
                                  is_complete, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                placed.id.as_str(),
                placed.project_id.as_str(),
                placed.title,
                placed.order_index,
                encode_content(placed.content.as_ref())?,
                placed.word_count,
                placed.is_complete,
                placed.notes,
                encode_time(&placed.created_at),
                encode_time(&placed.updated_at),
            ],
        )?;

        tx.commit()?;
        Ok(placed)
    }

    fn load_chapter(&self, id: &ChapterId) -> StorageResult<Option<Chapter>> {
        let conn = self.conn()?;
        Self::select_chapter(&conn, id)
    }

    fn list_chapters(&self, project_id: &ProjectId) -> StorageResult<Vec<Chapter>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE project_id = ?1 ORDER BY order_index");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![project_id.as_str()], Self::read_chapter)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ChapterRow::into_chapter).collect()
    }

    fn update_chapter(&self, chapter: &Chapter) -> StorageResult<bool> {
        let conn = self.conn()?;
        Ok(Self::write_chapter_fields(&conn, chapter)? > 0)
    }

    fn delete_chapter(&self, id: &ChapterId) -> StorageResult<Option<ChapterRemoval>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let placement: Option<(String, u32)> = tx
            .query_row(
                "SELECT project_id, order_index FROM chapters WHERE id = ?1",
                params![id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((project_id, order_index)) = placement else {
            return Ok(None);
        };

        // Versions go with the chapter via ON DELETE CASCADE
        tx.execute("DELETE FROM chapters WHERE id = ?1", params![id.as_str()])?;

        // Set-based shift: park the shifted rows at negative indices, then
        // flip them back, so the unique index never sees two equal values.
        let renumbered = tx.execute(
            "UPDATE chapters SET order_index = -(order_index - 1) WHERE project_id = ?1 AND order_index > ?2",
            params![project_id, order_index],
        )?;
        tx.execute(
            "UPDATE chapters SET order_index = -order_index WHERE project_id = ?1 AND order_index < 0",
            params![project_id],
        )?;

        tx.commit()?;
        Ok(Some(ChapterRemoval {
            order_index,
            renumbered,
        }))
    }

    fn reorder_chapters(&self, project_id: &ProjectId, order: &[ChapterId]) -> StorageResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut moved: HashSet<&str> = HashSet::new();
        {
            let mut stmt = tx.prepare(
                "UPDATE chapters SET order_index = ?1 WHERE id = ?2 AND project_id = ?3",
            )?;
            for (position, id) in order.iter().enumerate() {
                let parked = -(position as i64 + 1);
                if stmt.execute(params![parked, id.as_str(), project_id.as_str()])? > 0 {
                    moved.insert(id.as_str());
                }
            }
        }

        // An omitted chapter still holding a claimed index fails here and
        // the whole reorder rolls back.
        tx.execute(
            "UPDATE chapters SET order_index = -order_index WHERE project_id = ?1 AND order_index < 0",
            params![project_id.as_str()],
        )?;

        tx.commit()?;
        Ok(moved.len())
    }

    // === Versions ===

    fn insert_version(&self, version: &Version) -> StorageResult<()> {
        let conn = self.conn()?;
        Self::write_version(&conn, version)
    }

    fn load_version(&self, id: &VersionId) -> StorageResult<Option<Version>> {
        let conn = self.conn()?;
        Self::select_version(&conn, id)
    }

    fn list_versions(&self, chapter_id: &ChapterId) -> StorageResult<Vec<VersionSummary>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {VERSION_COLUMNS} FROM versions WHERE chapter_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![chapter_id.as_str()], Self::read_version)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter()
            .map(|row| row.into_version().map(|v| v.summary()))
            .collect()
    }

    fn restore_version(&self, id: &VersionId, safety_description: &str) -> StorageResult<Option<Restoration>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(target) = Self::select_version(&tx, id)? else {
            return Ok(None);
        };
        let Some(mut chapter) = Self::select_chapter(&tx, &target.chapter_id)? else {
            return Ok(None);
        };

        let safety_snapshot = Version::capture(&chapter, Some(safety_description.to_string()));
        Self::write_version(&tx, &safety_snapshot)?;

        chapter.content = target.content;
        chapter.word_count = target.word_count;
        chapter.updated_at = Utc::now();
        Self::write_chapter_fields(&tx, &chapter)?;

        tx.commit()?;
        Ok(Some(Restoration {
            chapter,
            safety_snapshot,
        }))
    }

    // === Entities ===

    fn save_entity(&self, entity: &CodexEntity) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO entities (id, project_id, entity_type, name, description, attributes_json,
                                  images_json, tags_json, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                attributes_json = excluded.attributes_json,
                images_json = excluded.images_json,
                tags_json = excluded.tags_json,
                updated_at = excluded.updated_at
            "#,
            params![
                entity.id.as_str(),
                entity.project_id.as_str(),
                entity.entity_type.as_str(),
                entity.name,
                entity.description,
                serde_json::to_string(&entity.attributes)?,
                serde_json::to_string(&entity.images)?,
                serde_json::to_string(&entity.tags)?,
                encode_time(&entity.created_at),
                encode_time(&entity.updated_at),
            ],
        )?;
        Ok(())
    }

    fn load_entity(&self, id: &EntityId) -> StorageResult<Option<CodexEntity>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE id = ?1");
        conn.query_row(&sql, params![id.as_str()], Self::read_entity)
            .optional()?
            .map(EntityRow::into_entity)
            .transpose()
    }

    fn find_entities(&self, project_id: &ProjectId, filter: &EntityFilter) -> StorageResult<Vec<CodexEntity>> {
        let conn = self.conn()?;
        Self::select_entities(&conn, project_id, filter)
    }

    fn delete_entity(&self, id: &EntityId) -> StorageResult<Option<usize>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let edges = tx.execute(
            "DELETE FROM relationships WHERE source_id = ?1 OR target_id = ?1",
            params![id.as_str()],
        )?;
        let rows = tx.execute("DELETE FROM entities WHERE id = ?1", params![id.as_str()])?;
        if rows == 0 {
            // Nothing to commit; dropping the transaction rolls back
            return Ok(None);
        }

        tx.commit()?;
        Ok(Some(edges))
    }

    // === Relationships ===

    fn insert_relationships(&self, relationships: &[Relationship]) -> StorageResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        for relationship in relationships {
            Self::write_relationship(&tx, relationship)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn load_relationship(&self, id: &RelationshipId) -> StorageResult<Option<Relationship>> {
        let conn = self.conn()?;
        let sql = format!("SELECT {RELATIONSHIP_COLUMNS} FROM relationships WHERE id = ?1");
        conn.query_row(&sql, params![id.as_str()], Self::read_relationship)
            .optional()?
            .map(RelationshipRow::into_relationship)
            .transpose()
    }

    fn find_relationship(&self, key: RelationshipKey<'_>) -> StorageResult<Option<Relationship>> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {RELATIONSHIP_COLUMNS} FROM relationships
             WHERE project_id = ?1 AND source_id = ?2 AND target_id = ?3 AND relationship_type = ?4"
        );
        conn.query_row(
            &sql,
            params![
                key.project_id.as_str(),
                key.source_id.as_str(),
                key.target_id.as_str(),
                key.relationship_type,
            ],
            Self::read_relationship,
        )
        .optional()?
        .map(RelationshipRow::into_relationship)
        .transpose()
    }

    fn update_relationship(&self, relationship: &Relationship) -> StorageResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            r#"
            UPDATE relationships SET
                relationship_type = ?2,
                description = ?3,
                strength = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                relationship.id.as_str(),
                relationship.relationship_type,
                relationship.description,
                relationship.strength,
                encode_time(&relationship.updated_at),
            ],
        )?;
        Ok(rows > 0)
    }

    fn delete_relationship(&self, id: &RelationshipId) -> StorageResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute("DELETE FROM relationships WHERE id = ?1", params![id.as_str()])?;
        Ok(rows > 0)
    }

    fn relationships_for_entity(&self, entity_id: &EntityId) -> StorageResult<Vec<Relationship>> {
        let conn = self.conn()?;
        Self::select_relationships(&conn, "source_id = ?1 OR target_id = ?1", entity_id.as_str())
    }

    fn list_relationships(&self, project_id: &ProjectId) -> StorageResult<Vec<Relationship>> {
        let conn = self.conn()?;
        Self::select_relationships(&conn, "project_id = ?1", project_id.as_str())
    }

    fn load_codex(&self, project_id: &ProjectId, filter: &EntityFilter) -> StorageResult<CodexSnapshot> {
        let mut conn = self.conn()?;
        // Both reads come from one snapshot
        let tx = conn.transaction()?;

        let entities = Self::select_entities(&tx, project_id, filter)?;
        let selected: HashSet<&EntityId> = entities.iter().map(|e| &e.id).collect();
        let relationships = Self::select_relationships(&tx, "project_id = ?1", project_id.as_str())?
            .into_iter()
            .filter(|r| selected.contains(&r.source_id) && selected.contains(&r.target_id))
            .collect();

        tx.commit()?;
        Ok(CodexSnapshot {
            entities,
            relationships,
        })
    }
}

// === Raw rows ===

struct ChapterRow {
    id: String,
    project_id: String,
    title: String,
    order_index: u32,
    content_json: Option<String>,
    word_count: u32,
    is_complete: bool,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ChapterRow {
    fn into_chapter(self) -> StorageResult<Chapter> {
        Ok(Chapter {
            id: ChapterId::from_string(self.id),
            project_id: ProjectId::from_string(self.project_id),
            title: self.title,
            order_index: self.order_index,
            content: decode_content(self.content_json.as_deref())?,
            word_count: self.word_count,
            is_complete: self.is_complete,
            notes: self.notes,
            created_at: decode_time(&self.created_at)?,
            updated_at: decode_time(&self.updated_at)?,
        })
    }
}

struct VersionRow {
    id: String,
    project_id: String,
    chapter_id: String,
    content_json: Option<String>,
    word_count: u32,
    description: String,
    created_at: String,
}

impl VersionRow {
    fn into_version(self) -> StorageResult<Version> {
        Ok(Version {
            id: VersionId::from_string(self.id),
            project_id: ProjectId::from_string(self.project_id),
            chapter_id: ChapterId::from_string(self.chapter_id),
            content: decode_content(self.content_json.as_deref())?,
            word_count: self.word_count,
            description: self.description,
            created_at: decode_time(&self.created_at)?,
        })
    }
}

struct EntityRow {
    id: String,
    project_id: String,
    entity_type: String,
    name: String,
    description: Option<String>,
    attributes_json: String,
    images_json: String,
    tags_json: String,
    created_at: String,
    updated_at: String,
}

impl EntityRow {
    fn into_entity(self) -> StorageResult<CodexEntity> {
        let entity_type: EntityType = self.entity_type.parse().map_err(StorageError::Corrupt)?;
        Ok(CodexEntity {
            id: EntityId::from_string(self.id),
            project_id: ProjectId::from_string(self.project_id),
            entity_type,
            name: self.name,
            description: self.description,
            attributes: serde_json::from_str(&self.attributes_json)?,
            images: serde_json::from_str(&self.images_json)?,
            tags: serde_json::from_str(&self.tags_json)?,
            created_at: decode_time(&self.created_at)?,
            updated_at: decode_time(&self.updated_at)?,
        })
    }
}

struct RelationshipRow {
    id: String,
    project_id: String,
    source_id: String,
    target_id: String,
    relationship_type: String,
    description: Option<String>,
    strength: u8,
    created_at: String,
    updated_at: String,
}

impl RelationshipRow {
    fn into_relationship(self) -> StorageResult<Relationship> {
        Ok(Relationship {
            id: RelationshipId::from_string(self.id),
            project_id: ProjectId::from_string(self.project_id),
            source_id: EntityId::from_string(self.source_id),
            target_id: EntityId::from_string(self.target_id),
            relationship_type: self.relationship_type,
            description: self.description,
            strength: self.strength,
            created_at: decode_time(&self.created_at)?,
            updated_at: decode_time(&self.updated_at)?,
        })
    }
}

// Fixed-width nanosecond timestamps: lossless, and lexical order matches time order
fn encode_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_time(raw: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::DateParse(e.to_string()))
}

fn encode_content(content: Option<&Content>) -> StorageResult<Option<String>> {
    content.map(serde_json::to_string).transpose().map_err(StorageError::from)
}

fn decode_content(raw: Option<&str>) -> StorageResult<Option<Content>> {
    raw.map(serde_json::from_str::<Content>).transpose().map_err(StorageError::from)
}
