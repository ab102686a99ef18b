//! SQL schemas for the two Accolade databases.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Relational database: reference rows and the directory tables they join
/// against. Idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const REFERENCE_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Directory tables. Owned by the account and directory subsystems; this
-- crate only reads them, apart from the provisioning helpers.
CREATE TABLE IF NOT EXISTS roles (
    role_id  TEXT PRIMARY KEY,
    name     TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    role_id     TEXT NOT NULL REFERENCES roles(role_id),
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS advisors (
    advisor_id       TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL UNIQUE REFERENCES users(user_id),
    employee_number  TEXT NOT NULL,
    department       TEXT
);

CREATE TABLE IF NOT EXISTS students (
    student_id      TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL UNIQUE REFERENCES users(user_id),
    student_number  TEXT NOT NULL,
    program         TEXT,
    advisor_id      TEXT REFERENCES advisors(advisor_id)
);

-- One row per content document. `status` is authoritative and is only
-- changed by conditional UPDATEs guarded on its current value.
CREATE TABLE IF NOT EXISTS achievement_references (
    reference_id    TEXT PRIMARY KEY,
    student_id      TEXT NOT NULL REFERENCES students(student_id),
    content_id      TEXT NOT NULL,   -- pointer into the document store
    status          TEXT NOT NULL
                    CHECK (status IN ('draft', 'submitted', 'verified', 'rejected', 'deleted')),
    submitted_at    TEXT,
    verified_at     TEXT,
    verified_by     TEXT,
    rejection_note  TEXT,
    created_at      TEXT NOT NULL,   -- fixed-width RFC 3339, sortable as text
    updated_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS references_student_idx ON achievement_references(student_id);
CREATE INDEX IF NOT EXISTS references_status_idx  ON achievement_references(status);
CREATE INDEX IF NOT EXISTS references_created_idx ON achievement_references(created_at);
CREATE INDEX IF NOT EXISTS students_advisor_idx   ON students(advisor_id);

PRAGMA user_version = 1;
";

/// Document database: one JSON body per achievement.
pub const CONTENT_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS documents (
    content_id  TEXT PRIMARY KEY,   -- 24 lowercase hex characters
    student_id  TEXT NOT NULL,
    category    TEXT NOT NULL,
    body_json   TEXT NOT NULL,      -- the full serialised Achievement
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS documents_student_idx ON documents(student_id);

PRAGMA user_version = 1;
";
