// ==========================================
// 模联会议注册系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout,减少并发分配时的偶发 busy 错误
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// 表:
/// - conference / country / committee / school: 基础数据
/// - assignment: (committee, country) 席位, school_id 可空
/// - country_preference: 学校国家偏好, (school_id, country_id) 唯一
/// - allocation_run: 自动分配审计日志
/// - config_kv: 分配参数覆写
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS conference (
            session INTEGER PRIMARY KEY,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            reg_open TEXT NOT NULL,
            early_reg_close TEXT NOT NULL,
            reg_close TEXT NOT NULL,
            min_attendance INTEGER NOT NULL DEFAULT 0,
            max_attendance INTEGER NOT NULL DEFAULT 0,
            open_reg INTEGER NOT NULL DEFAULT 1,
            waitlist_reg INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS country (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            special INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS committee (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            full_name TEXT NOT NULL,
            delegation_size INTEGER NOT NULL DEFAULT 2,
            special INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS school (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            max_delegation_size INTEGER NOT NULL DEFAULT 0,
            waitlist INTEGER NOT NULL DEFAULT 0,
            registered_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS assignment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            committee_id INTEGER NOT NULL REFERENCES committee(id),
            country_id INTEGER NOT NULL REFERENCES country(id),
            school_id INTEGER REFERENCES school(id),
            UNIQUE(committee_id, country_id)
        );
        CREATE INDEX IF NOT EXISTS idx_assignment_school ON assignment(school_id);

        CREATE TABLE IF NOT EXISTS country_preference (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            school_id INTEGER NOT NULL REFERENCES school(id) ON DELETE CASCADE,
            country_id INTEGER NOT NULL REFERENCES country(id),
            rank INTEGER NOT NULL,
            UNIQUE(school_id, country_id)
        );

        CREATE TABLE IF NOT EXISTS allocation_run (
            run_id TEXT PRIMARY KEY,
            school_id INTEGER NOT NULL REFERENCES school(id),
            seed INTEGER NOT NULL,
            trigger TEXT NOT NULL,
            started_at TEXT NOT NULL,
            finished_at TEXT NOT NULL,
            spots_before INTEGER NOT NULL,
            spots_after INTEGER NOT NULL,
            bindings INTEGER NOT NULL,
            outcome TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_allocation_run_school ON allocation_run(school_id);

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
