//! SurrealDB schema migrations and initialization
//!
//! This module provides initialization functions to set up all tables
//! with proper constraints and indexes.

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// Initialize all gradewire tables in SurrealDB
///
/// This should be called once on first connection to set up the schema.
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> StorageResult<()> {
    info!("Initializing gradewire SurrealDB schema");

    init_metadata_table(db).await?;
    init_suites_table(db).await?;
    init_gradebook_table(db).await?;
    init_courses_table(db).await?;

    info!("Gradewire schema initialization complete");
    Ok(())
}

/// Initialize `homework_metadata` table
///
/// One row per homework; full-replace on update, never deleted.
async fn init_metadata_table(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("Initializing homework_metadata table");

    let sql = r#"
        DEFINE TABLE homework_metadata AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update FULL
                FOR delete NONE;

        -- One metadata row per homework
        DEFINE INDEX idx_metadata_homework_id ON TABLE homework_metadata COLUMNS homework_id UNIQUE;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?;
    Ok(())
}

/// Initialize `test_suites` table
///
/// One row per homework holding the codec-encoded suite blob.
async fn init_suites_table(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("Initializing test_suites table");

    let sql = r#"
        DEFINE TABLE test_suites AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update FULL
                FOR delete NONE;

        -- One suite row per homework (full replace is the unit of change)
        DEFINE INDEX idx_suites_homework_id ON TABLE test_suites COLUMNS homework_id UNIQUE;

        -- Index digest for version lookups
        DEFINE INDEX idx_suites_digest ON TABLE test_suites COLUMNS digest;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?;
    Ok(())
}

/// Initialize `gradebook` table
///
/// One row per (homework, student, test case); the composite unique index
/// is what gives upserts their per-key last-write-wins semantics.
async fn init_gradebook_table(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("Initializing gradebook table");

    let sql = r#"
        DEFINE TABLE gradebook AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update FULL
                FOR delete FULL;

        -- Composite unique index: at most one live record per submission key
        DEFINE INDEX idx_gradebook_key ON TABLE gradebook COLUMNS homework_id, student_submission_id UNIQUE;

        -- Index homework_id for per-homework scans
        DEFINE INDEX idx_gradebook_homework_id ON TABLE gradebook COLUMNS homework_id;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?;
    Ok(())
}

/// Initialize `courses` table
async fn init_courses_table(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("Initializing courses table");

    let sql = r#"
        DEFINE TABLE courses AS
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR read FULL
                FOR update FULL
                FOR delete NONE;

        DEFINE INDEX idx_courses_secret_key ON TABLE courses COLUMNS secret_key UNIQUE;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    // Schema creation against a live backend is covered by the
    // trait-contract suite in oxidized-gradebook/tests/.
}
