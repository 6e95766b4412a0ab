// ==========================================
// 模联会议注册系统 - 内存席位存储
// ==========================================
// 用途: 纯内存的实体存储,供测试与试算（dry run）使用
// ==========================================

use crate::domain::{Assignment, AssignmentId, CommitteeId, CountryId, SchoolId};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::slot_store::SlotStore;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type SlotKey = (CommitteeId, CountryId);

#[derive(Debug, Default)]
struct SlotTable {
    slots: HashMap<SlotKey, Assignment>,
    keys_by_id: HashMap<AssignmentId, SlotKey>,
    next_id: AssignmentId,
}

impl SlotTable {
    /// 插入席位; id 或 (委员会, 国家) 已存在时拒绝
    fn insert(&mut self, slot: Assignment) -> RepositoryResult<()> {
        let key = (slot.committee_id, slot.country_id);
        if self.keys_by_id.contains_key(&slot.id) {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "assignment.id={}",
                slot.id
            )));
        }
        if self.slots.contains_key(&key) {
            return Err(RepositoryError::UniqueConstraintViolation(format!(
                "assignment(committee_id={}, country_id={})",
                key.0, key.1
            )));
        }
        self.next_id = self.next_id.max(slot.id);
        self.keys_by_id.insert(slot.id, key);
        self.slots.insert(key, slot);
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemorySlotStore {
    table: Mutex<SlotTable>,
}

impl InMemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由已有席位构建（如从 SQLite 快照复制用于试算）
    ///
    /// # 错误
    /// - UniqueConstraintViolation: 席位 id 或 (委员会, 国家) 组合重复
    pub fn from_slots(slots: impl IntoIterator<Item = Assignment>) -> RepositoryResult<Self> {
        let mut table = SlotTable::default();
        for slot in slots {
            table.insert(slot)?;
        }
        Ok(Self {
            table: Mutex::new(table),
        })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, SlotTable>> {
        self.table
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 开设一个未分配席位（重复开设返回已有席位）
    ///
    /// 新 id 取当前最大 id + 1
    pub fn provision(
        &self,
        committee_id: CommitteeId,
        country_id: CountryId,
    ) -> RepositoryResult<Assignment> {
        let mut table = self.lock()?;
        if let Some(slot) = table.slots.get(&(committee_id, country_id)) {
            return Ok(*slot);
        }
        let slot = Assignment {
            id: table.next_id + 1,
            committee_id,
            country_id,
            school_id: None,
        };
        table.insert(slot)?;
        Ok(slot)
    }

    /// 当前全部席位（按 id 排序）
    pub fn slots(&self) -> RepositoryResult<Vec<Assignment>> {
        let mut all: Vec<Assignment> = self.lock()?.slots.values().copied().collect();
        all.sort_by_key(|s| s.id);
        Ok(all)
    }

    /// 某学校已分配的席位
    pub fn slots_for_school(&self, school_id: SchoolId) -> RepositoryResult<Vec<Assignment>> {
        Ok(self
            .slots()?
            .into_iter()
            .filter(|s| s.school_id == Some(school_id))
            .collect())
    }
}

impl SlotStore for InMemorySlotStore {
    fn find_slot(
        &self,
        committee_id: CommitteeId,
        country_id: CountryId,
    ) -> RepositoryResult<Option<Assignment>> {
        Ok(self.lock()?.slots.get(&(committee_id, country_id)).copied())
    }

    fn bind_slot(&self, slot_id: AssignmentId, school_id: SchoolId) -> RepositoryResult<bool> {
        let mut table = self.lock()?;
        let not_found = || RepositoryError::NotFound {
            entity: "Assignment".to_string(),
            id: slot_id.to_string(),
        };
        let key = *table.keys_by_id.get(&slot_id).ok_or_else(not_found)?;
        let slot = table.slots.get_mut(&key).ok_or_else(not_found)?;
        if slot.school_id.is_some() {
            return Ok(false);
        }
        slot.school_id = Some(school_id);
        Ok(true)
    }
}

/// 测试用: 第 N 次绑定时返回存储故障,之前的绑定照常写入
#[cfg(test)]
pub(crate) struct FailingSlotStore {
    pub inner: InMemorySlotStore,
    fail_on_bind: usize,
    binds: std::cell::Cell<usize>,
}

#[cfg(test)]
impl FailingSlotStore {
    pub fn new(inner: InMemorySlotStore, fail_on_bind: usize) -> Self {
        Self {
            inner,
            fail_on_bind,
            binds: std::cell::Cell::new(0),
        }
    }
}

#[cfg(test)]
impl SlotStore for FailingSlotStore {
    fn find_slot(
        &self,
        committee_id: CommitteeId,
        country_id: CountryId,
    ) -> RepositoryResult<Option<Assignment>> {
        self.inner.find_slot(committee_id, country_id)
    }

    fn bind_slot(&self, slot_id: AssignmentId, school_id: SchoolId) -> RepositoryResult<bool> {
        let n = self.binds.get() + 1;
        self.binds.set(n);
        if n == self.fail_on_bind {
            return Err(RepositoryError::DatabaseQueryError("disk I/O error".to_string()));
        }
        self.inner.bind_slot(slot_id, school_id)
    }
}
