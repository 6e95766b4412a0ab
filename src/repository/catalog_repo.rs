// ==========================================
// 模联会议注册系统 - 参考数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: conference / country / committee 表的读写
// ==========================================

use crate::domain::{Committee, Conference, ConferenceCatalog, Country};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

const DATE_FMT: &str = "%Y-%m-%d";

// ==========================================
// CatalogRepository - 参考数据仓储
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 国家
    // ==========================================

    /// 插入或更新国家
    pub fn upsert_country(&self, country: &Country) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO country (id, name, special) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET name = ?2, special = ?3
            "#,
            params![country.id, country.name, country.special],
        )?;
        Ok(())
    }

    /// 列出全部国家（按 id 排序）
    pub fn list_countries(&self) -> RepositoryResult<Vec<Country>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name, special FROM country ORDER BY id")?;
        let countries = stmt
            .query_map([], |row| {
                Ok(Country {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    special: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<Country>>>()?;
        Ok(countries)
    }

    // ==========================================
    // 委员会
    // ==========================================

    /// 插入或更新委员会
    pub fn upsert_committee(&self, committee: &Committee) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO committee (id, name, full_name, delegation_size, special)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = ?2, full_name = ?3, delegation_size = ?4, special = ?5
            "#,
            params![
                committee.id,
                committee.name,
                committee.full_name,
                committee.delegation_size,
                committee.special,
            ],
        )?;
        Ok(())
    }

    /// 列出全部委员会（按 id 排序）
    pub fn list_committees(&self) -> RepositoryResult<Vec<Committee>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, full_name, delegation_size, special FROM committee ORDER BY id",
        )?;
        let committees = stmt
            .query_map([], |row| {
                Ok(Committee {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    full_name: row.get(2)?,
                    delegation_size: row.get(3)?,
                    special: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<Committee>>>()?;
        Ok(committees)
    }

    /// 加载全部参考数据
    pub fn load_catalog(&self) -> RepositoryResult<ConferenceCatalog> {
        Ok(ConferenceCatalog::new(
            self.list_countries()?,
            self.list_committees()?,
        ))
    }

    // ==========================================
    // 会议届次
    // ==========================================

    /// 插入或更新会议届次
    pub fn upsert_conference(&self, conference: &Conference) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO conference (
                session, start_date, end_date, reg_open, early_reg_close, reg_close,
                min_attendance, max_attendance, open_reg, waitlist_reg
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                conference.session,
                conference.start_date.format(DATE_FMT).to_string(),
                conference.end_date.format(DATE_FMT).to_string(),
                conference.reg_open.format(DATE_FMT).to_string(),
                conference.early_reg_close.format(DATE_FMT).to_string(),
                conference.reg_close.format(DATE_FMT).to_string(),
                conference.min_attendance,
                conference.max_attendance,
                conference.open_reg,
                conference.waitlist_reg,
            ],
        )?;
        Ok(())
    }

    /// 最新一届会议（按开幕日期）
    pub fn find_latest_conference(&self) -> RepositoryResult<Option<Conference>> {
        let conn = self.get_conn()?;
        let conference = conn
            .query_row(
                r#"
                SELECT session, start_date, end_date, reg_open, early_reg_close, reg_close,
                       min_attendance, max_attendance, open_reg, waitlist_reg
                FROM conference
                ORDER BY start_date DESC
                LIMIT 1
                "#,
                [],
                map_conference,
            )
            .optional()?;
        Ok(conference)
    }
}

fn parse_date(row: &Row<'_>, idx: usize) -> SqliteResult<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, DATE_FMT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn map_conference(row: &Row<'_>) -> SqliteResult<Conference> {
    Ok(Conference {
        session: row.get(0)?,
        start_date: parse_date(row, 1)?,
        end_date: parse_date(row, 2)?,
        reg_open: parse_date(row, 3)?,
        early_reg_close: parse_date(row, 4)?,
        reg_close: parse_date(row, 5)?,
        min_attendance: row.get(6)?,
        max_attendance: row.get(7)?,
        open_reg: row.get(8)?,
        waitlist_reg: row.get(9)?,
    })
}
