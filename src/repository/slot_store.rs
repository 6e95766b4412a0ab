// ==========================================
// 模联会议注册系统 - 席位查找/绑定接口
// ==========================================
// 职责: 分配引擎与持久化层之间唯一的接缝
// 实现者: InMemorySlotStore（内存）、AssignmentRepository（SQLite）
// ==========================================

use crate::domain::{Assignment, AssignmentId, CommitteeId, CountryId, SchoolId};
use crate::repository::error::RepositoryResult;

pub trait SlotStore {
    /// 按 (委员会, 国家) 查找席位
    ///
    /// # 返回
    /// - Ok(Some(slot)): 席位存在（可能已分配）
    /// - Ok(None): 该组合未开设席位,属于正常分支
    /// - Err: 存储故障
    fn find_slot(
        &self,
        committee_id: CommitteeId,
        country_id: CountryId,
    ) -> RepositoryResult<Option<Assignment>>;

    /// 比较并设置: 仅当席位仍未分配时绑定学校,立即持久化
    ///
    /// # 返回
    /// - Ok(true): 绑定成功
    /// - Ok(false): 席位已被占用（并发竞争失败或已分配）
    fn bind_slot(&self, slot_id: AssignmentId, school_id: SchoolId) -> RepositoryResult<bool>;
}
