// ==========================================
// 模联会议注册系统 - 席位（Assignment）
// ==========================================
// 不变量:
// - (committee_id, country_id) 唯一
// - school_id 至多一个;分配引擎只做 未分配 → 已分配 的单向转换
// ==========================================

use crate::domain::types::{AssignmentId, CommitteeId, CountryId, SchoolId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: AssignmentId,
    pub committee_id: CommitteeId,
    pub country_id: CountryId,
    pub school_id: Option<SchoolId>, // None = 未分配
}

impl Assignment {
    /// 是否已绑定学校
    pub fn is_bound(&self) -> bool {
        self.school_id.is_some()
    }
}
