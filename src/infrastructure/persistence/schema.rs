//! SQLite schema, created idempotently on startup

/// Entity tables. Every table carries the same bookkeeping columns:
/// `created_at`, `updated_at` and the soft-delete tombstone `deleted_at`.
const ENTITY_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        website TEXT,
        target_group TEXT,
        description TEXT,
        date_founded TEXT,
        date_registered TEXT,
        tin_number TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS locations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        address TEXT NOT NULL,
        longitude REAL,
        latitude REAL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ecosystems (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        start_date TEXT,
        end_date TEXT,
        free_or_paid TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        start_date TEXT,
        end_date TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sectors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted_at TEXT
    )
    "#,
];

/// Pivot tables. One row per linked pair; the pair is unique.
const PIVOT_TABLES: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS organization_roles (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL REFERENCES organizations(id),
        role_id INTEGER NOT NULL REFERENCES roles(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (organization_id, role_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organization_sectors (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL REFERENCES organizations(id),
        sector_id INTEGER NOT NULL REFERENCES sectors(id),
        description TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (organization_id, sector_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organization_locations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL REFERENCES organizations(id),
        location_id INTEGER NOT NULL REFERENCES locations(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (organization_id, location_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organization_stages (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL REFERENCES organizations(id),
        stage_id INTEGER NOT NULL REFERENCES stages(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (organization_id, stage_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organization_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL REFERENCES organizations(id),
        event_id INTEGER NOT NULL REFERENCES events(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (organization_id, event_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS organization_projects (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        organization_id INTEGER NOT NULL REFERENCES organizations(id),
        project_id INTEGER NOT NULL REFERENCES projects(id),
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (organization_id, project_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS ecosystem_organizations (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        ecosystem_id INTEGER NOT NULL REFERENCES ecosystems(id),
        organization_id INTEGER NOT NULL REFERENCES organizations(id),
        status TEXT NOT NULL DEFAULT 'active',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (ecosystem_id, organization_id)
    )
    "#,
];

/// All DDL statements in dependency order
pub fn statements() -> impl Iterator<Item = &'static str> {
    ENTITY_TABLES.iter().chain(PIVOT_TABLES.iter()).copied()
}
