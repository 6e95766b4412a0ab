// ==========================================
// 模联会议注册系统 - 分配运行日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// ==========================================

use crate::domain::{AllocationRun, SchoolId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const TS_FMT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub struct AllocationRunRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationRunRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入分配运行日志
    ///
    /// # 返回
    /// - `Ok(run_id)`: 成功插入
    pub fn insert(&self, run: &AllocationRun) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO allocation_run (
                run_id, school_id, seed, trigger, started_at, finished_at,
                spots_before, spots_after, bindings, outcome
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                run.run_id,
                run.school_id,
                // SQLite 只有 i64,按位保存种子
                run.seed as i64,
                run.trigger,
                run.started_at.format(TS_FMT).to_string(),
                run.finished_at.format(TS_FMT).to_string(),
                run.spots_before,
                run.spots_after,
                run.bindings,
                run.outcome,
            ],
        )?;
        Ok(run.run_id.clone())
    }

    /// 某学校的分配运行日志（最新在前）
    pub fn list_by_school(&self, school_id: SchoolId) -> RepositoryResult<Vec<AllocationRun>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT run_id, school_id, seed, trigger, started_at, finished_at,
                   spots_before, spots_after, bindings, outcome
            FROM allocation_run
            WHERE school_id = ?1
            ORDER BY started_at DESC
            "#,
        )?;
        let runs = stmt
            .query_map(params![school_id], map_run)?
            .collect::<SqliteResult<Vec<AllocationRun>>>()?;
        Ok(runs)
    }
}

fn parse_ts(row: &Row<'_>, idx: usize) -> SqliteResult<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, TS_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_run(row: &Row<'_>) -> SqliteResult<AllocationRun> {
    Ok(AllocationRun {
        run_id: row.get(0)?,
        school_id: row.get(1)?,
        seed: row.get::<_, i64>(2)? as u64,
        trigger: row.get(3)?,
        started_at: parse_ts(row, 4)?,
        finished_at: parse_ts(row, 5)?,
        spots_before: row.get(6)?,
        spots_after: row.get(7)?,
        bindings: row.get(8)?,
        outcome: row.get(9)?,
    })
}
