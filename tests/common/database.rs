//! Test database setup and management
#![allow(dead_code)]

use broadsheet::orm::{comments, posts, users};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema, Statement,
};
use std::sync::Once;

static INIT_LOGGING: Once = Once::new();

fn init_logging() {
    INIT_LOGGING.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

/// Connect to a fresh in-memory SQLite database with the comment schema.
///
/// Each test gets its own database. The pool is capped at one connection so
/// the in-memory database stays alive for the lifetime of the handle.
pub async fn setup_test_database() -> Result<DatabaseConnection, DbErr> {
    init_logging();

    let mut options = ConnectOptions::new("sqlite::memory:".to_owned());
    options.max_connections(1);
    let db = Database::connect(options).await?;

    create_tables(&db).await?;
    Ok(db)
}

/// Create the tables from the entity definitions, plus the indexes the
/// production migrations carry.
async fn create_tables(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    // Parents first; comments carries foreign keys to both.
    db.execute(backend.build(&schema.create_table_from_entity(users::Entity)))
        .await?;
    db.execute(backend.build(&schema.create_table_from_entity(posts::Entity)))
        .await?;
    db.execute(backend.build(&schema.create_table_from_entity(comments::Entity)))
        .await?;

    for ddl in [
        "CREATE INDEX idx_comments_status_created_at ON comments (status, created_at)",
        "CREATE INDEX idx_comments_post_id_status ON comments (post_id, status)",
        "CREATE INDEX idx_comments_author_id_created_at ON comments (author_id, created_at)",
        "CREATE INDEX idx_comments_ip_address ON comments (ip_address)",
        "CREATE INDEX idx_comments_deleted_at ON comments (deleted_at)",
        "CREATE INDEX idx_comments_approved_at ON comments (approved_at)",
    ] {
        db.execute(Statement::from_string(backend, ddl.to_owned()))
            .await?;
    }

    Ok(())
}
