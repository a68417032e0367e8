//! SQL schema for the Docket SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Companies are never deleted: historical documents keep referring to them.
CREATE TABLE IF NOT EXISTS companies (
    company_id  TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    tax_id      TEXT NOT NULL,
    country     TEXT NOT NULL,
    address     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS employees (
    employee_id     TEXT PRIMARY KEY,
    personal_id     TEXT NOT NULL,
    name            TEXT NOT NULL,
    surname         TEXT,
    active          INTEGER NOT NULL DEFAULT 1,
    country         TEXT NOT NULL,
    start_date      TEXT NOT NULL,   -- YYYY-MM-DD
    end_date        TEXT,
    job             TEXT NOT NULL,
    department      TEXT NOT NULL,
    additional_info TEXT,
    company_id      TEXT NOT NULL REFERENCES companies(company_id)
);

CREATE TABLE IF NOT EXISTS logins (
    email         TEXT PRIMARY KEY,  -- lowercased
    employee_id   TEXT NOT NULL UNIQUE REFERENCES employees(employee_id),
    password_hash TEXT NOT NULL      -- argon2 PHC string
);

-- Directed edge contractor -> subcontractor; one per ordered pair.
CREATE TABLE IF NOT EXISTS relationships (
    contractor_id    TEXT NOT NULL REFERENCES companies(company_id),
    subcontractor_id TEXT NOT NULL REFERENCES companies(company_id),
    start_date       TEXT NOT NULL,
    end_date         TEXT,
    additional_info  TEXT,
    PRIMARY KEY (contractor_id, subcontractor_id),
    CHECK (contractor_id != subcontractor_id),
    CHECK (end_date IS NULL OR end_date >= start_date)
);

CREATE TABLE IF NOT EXISTS documents (
    document_id      TEXT PRIMARY KEY,
    validation_state TEXT NOT NULL DEFAULT 'VA'
                     CHECK (validation_state IN ('VA', 'OK', 'ER', 'EX')),
    contractor_id    TEXT NOT NULL,
    subcontractor_id TEXT NOT NULL,
    name             TEXT NOT NULL,
    date             TEXT NOT NULL,
    expiration_date  TEXT,
    validation_date  TEXT,
    employee_id      TEXT REFERENCES employees(employee_id),
    additional_info  TEXT,
    file_handle      TEXT,
    file_name        TEXT,
    FOREIGN KEY (contractor_id, subcontractor_id)
        REFERENCES relationships(contractor_id, subcontractor_id),
    CHECK ((validation_date IS NOT NULL) = (validation_state IN ('OK', 'ER'))),
    CHECK (expiration_date IS NULL OR expiration_date >= date),
    CHECK ((file_handle IS NULL) = (file_name IS NULL))
);

CREATE INDEX IF NOT EXISTS employees_company_idx    ON employees(company_id);
CREATE INDEX IF NOT EXISTS relationships_sub_idx    ON relationships(subcontractor_id);
CREATE INDEX IF NOT EXISTS documents_pair_idx       ON documents(contractor_id, subcontractor_id);
CREATE INDEX IF NOT EXISTS documents_sub_idx        ON documents(subcontractor_id);
CREATE INDEX IF NOT EXISTS documents_employee_idx   ON documents(employee_id);
CREATE INDEX IF NOT EXISTS documents_expiration_idx ON documents(expiration_date);

PRAGMA user_version = 1;
";
