// ==========================================
// 模联会议注册系统 - 学校数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: school / country_preference 表的读写
// ==========================================

use crate::domain::{CountryPreference, School, SchoolId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// SchoolRepository - 学校仓储
// ==========================================
pub struct SchoolRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SchoolRepository {
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

    /// 插入或更新学校
    pub fn upsert(&self, school: &School) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO school (id, name, max_delegation_size, waitlist, registered_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO UPDATE SET
                name = ?2, max_delegation_size = ?3, waitlist = ?4
            "#,
            params![
                school.id,
                school.name,
                school.max_delegation_size,
                school.waitlist,
                school.registered_at,
            ],
        )?;
        Ok(())
    }

    /// 按 ID 查询学校
    ///
    /// # 返回
    /// - Ok(Some(School)): 找到
    /// - Ok(None): 未找到
    pub fn find_by_id(&self, school_id: SchoolId) -> RepositoryResult<Option<School>> {
        let conn = self.get_conn()?;
        let school = conn
            .query_row(
                r#"
                SELECT id, name, max_delegation_size, waitlist, registered_at
                FROM school WHERE id = ?1
                "#,
                params![school_id],
                |row| {
                    Ok(School {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        max_delegation_size: row.get(2)?,
                        waitlist: row.get(3)?,
                        registered_at: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(school)
    }

    /// 更新候补标志
    pub fn set_waitlist(&self, school_id: SchoolId, waitlist: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE school SET waitlist = ?1 WHERE id = ?2",
            params![waitlist, school_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "School".to_string(),
                id: school_id.to_string(),
            });
        }
        Ok(())
    }

    // ==========================================
    // 国家偏好
    // ==========================================

    /// 整体替换学校的国家偏好（同一事务内先清空再批量插入）
    ///
    /// # 错误
    /// - NotFound: 学校不存在
    /// - UniqueConstraintViolation: 偏好中存在重复国家
    pub fn replace_country_preferences(
        &self,
        school_id: SchoolId,
        preferences: &[CountryPreference],
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let exists: bool = tx
            .query_row("SELECT 1 FROM school WHERE id = ?1", params![school_id], |_| Ok(true))
            .optional()?
            .unwrap_or(false);
        if !exists {
            return Err(RepositoryError::NotFound {
                entity: "School".to_string(),
                id: school_id.to_string(),
            });
        }

        tx.execute(
            "DELETE FROM country_preference WHERE school_id = ?1",
            params![school_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO country_preference (school_id, country_id, rank) VALUES (?1, ?2, ?3)",
            )?;
            for pref in preferences {
                stmt.execute(params![school_id, pref.country_id, pref.rank])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// 按 rank 升序读取学校的国家偏好
    pub fn list_country_preferences(
        &self,
        school_id: SchoolId,
    ) -> RepositoryResult<Vec<CountryPreference>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT school_id, country_id, rank
            FROM country_preference
            WHERE school_id = ?1
            ORDER BY rank
            "#,
        )?;
        let prefs = stmt
            .query_map(params![school_id], |row| {
                Ok(CountryPreference {
                    school_id: row.get(0)?,
                    country_id: row.get(1)?,
                    rank: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<CountryPreference>>>()?;
        Ok(prefs)
    }
}
