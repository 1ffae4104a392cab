//! SQL schema for the Ashiato SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id           TEXT PRIMARY KEY,
    username          TEXT NOT NULL UNIQUE,
    email             TEXT NOT NULL UNIQUE,
    password_hash     TEXT NOT NULL,
    profile_image_url TEXT,
    bio               TEXT NOT NULL DEFAULT '',
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL
);

-- Owner ids are opaque; pins and friendships do not reference `users`.
CREATE TABLE IF NOT EXISTS pins (
    pin_id          TEXT PRIMARY KEY,
    owner_id        TEXT NOT NULL,
    latitude        REAL NOT NULL CHECK (latitude  BETWEEN -90  AND 90),
    longitude       REAL NOT NULL CHECK (longitude BETWEEN -180 AND 180),
    content_text    TEXT NOT NULL,
    media_url       TEXT,
    privacy_setting TEXT NOT NULL,                  -- 'public' | 'friends'
    status          TEXT NOT NULL DEFAULT 'active', -- 'active' | 'removed'
    created_at      TEXT NOT NULL                   -- fixed-width RFC 3339, sortable
);

-- One row per unordered pair; the smaller id is always user_a_id.
CREATE TABLE IF NOT EXISTS friendships (
    user_a_id      TEXT NOT NULL,
    user_b_id      TEXT NOT NULL,
    status         TEXT NOT NULL,   -- 'pending' | 'accepted' | 'blocked'
    action_user_id TEXT NOT NULL,
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    PRIMARY KEY (user_a_id, user_b_id),
    CHECK (user_a_id < user_b_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id   TEXT PRIMARY KEY,
    pin_id       TEXT NOT NULL REFERENCES pins(pin_id),
    user_id      TEXT NOT NULL,
    content_text TEXT NOT NULL,
    created_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS pins_owner_recent_idx ON pins(owner_id, created_at, pin_id);
CREATE INDEX IF NOT EXISTS pins_location_idx     ON pins(latitude, longitude);
CREATE INDEX IF NOT EXISTS friendships_b_idx     ON friendships(user_b_id);
CREATE INDEX IF NOT EXISTS comments_pin_idx      ON comments(pin_id, created_at);

PRAGMA user_version = 1;
";
