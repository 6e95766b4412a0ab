// ==========================================
// 模联会议注册系统 - 席位数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: assignment 表的开设、查找、绑定
// 并发: bind_slot 使用 `WHERE school_id IS NULL` 条件更新,
//       保证并发分配下一个席位至多绑定一所学校
// ==========================================

use crate::domain::{Assignment, AssignmentId, CommitteeId, CountryId, SchoolId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::slot_store::SlotStore;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// AssignmentRepository - 席位仓储
// ==========================================
pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
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

    /// 为每个 委员会×国家 组合开设席位（已存在的组合不变）
    ///
    /// # 返回
    /// 新开设的席位数量
    pub fn provision_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let inserted = conn.execute(
            r#"
            INSERT OR IGNORE INTO assignment (committee_id, country_id)
            SELECT committee.id, country.id FROM committee CROSS JOIN country
            "#,
            [],
        )?;
        Ok(inserted)
    }

    /// 全部席位（按 id 排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, committee_id, country_id, school_id FROM assignment ORDER BY id",
        )?;
        let slots = stmt
            .query_map([], map_assignment)?
            .collect::<SqliteResult<Vec<Assignment>>>()?;
        Ok(slots)
    }

    /// 某学校已分配的席位
    pub fn list_by_school(&self, school_id: SchoolId) -> RepositoryResult<Vec<Assignment>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, committee_id, country_id, school_id
            FROM assignment
            WHERE school_id = ?1
            ORDER BY committee_id, country_id
            "#,
        )?;
        let slots = stmt
            .query_map(params![school_id], map_assignment)?
            .collect::<SqliteResult<Vec<Assignment>>>()?;
        Ok(slots)
    }

    /// 某学校已占用的代表名额（已分配席位的 delegation_size 之和）
    pub fn assigned_seats(&self, school_id: SchoolId) -> RepositoryResult<i32> {
        let conn = self.get_conn()?;
        let seats: i32 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(committee.delegation_size), 0)
            FROM assignment
            JOIN committee ON committee.id = assignment.committee_id
            WHERE assignment.school_id = ?1
            "#,
            params![school_id],
            |row| row.get(0),
        )?;
        Ok(seats)
    }

    /// 管理员覆写: 直接设置/清空席位的学校（不经过分配引擎）
    pub fn override_school(
        &self,
        slot_id: AssignmentId,
        school_id: Option<SchoolId>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE assignment SET school_id = ?1 WHERE id = ?2",
            params![school_id, slot_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Assignment".to_string(),
                id: slot_id.to_string(),
            });
        }
        Ok(())
    }
}

impl SlotStore for AssignmentRepository {
    fn find_slot(
        &self,
        committee_id: CommitteeId,
        country_id: CountryId,
    ) -> RepositoryResult<Option<Assignment>> {
        let conn = self.get_conn()?;
        let slot = conn
            .query_row(
                r#"
                SELECT id, committee_id, country_id, school_id
                FROM assignment
                WHERE committee_id = ?1 AND country_id = ?2
                "#,
                params![committee_id, country_id],
                map_assignment,
            )
            .optional()?;
        Ok(slot)
    }

    fn bind_slot(&self, slot_id: AssignmentId, school_id: SchoolId) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE assignment SET school_id = ?1 WHERE id = ?2 AND school_id IS NULL",
            params![school_id, slot_id],
        )?;
        Ok(affected == 1)
    }
}

fn map_assignment(row: &Row<'_>) -> SqliteResult<Assignment> {
    Ok(Assignment {
        id: row.get(0)?,
        committee_id: row.get(1)?,
        country_id: row.get(2)?,
        school_id: row.get(3)?,
    })
}
