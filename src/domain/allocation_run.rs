// ==========================================
// 模联会议注册系统 - 分配运行日志
// ==========================================
// 用途: 审计追踪,记录每次自动分配的种子与结果,便于复现
// ==========================================

use crate::domain::types::SchoolId;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRun {
    pub run_id: String, // UUID v4
    pub school_id: SchoolId,
    pub seed: u64,      // 随机源种子（复现用）
    pub trigger: String, // 触发来源: ADMIN / WAITLIST_RELEASE
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,

    // ===== 结果摘要 =====
    pub spots_before: i32,
    pub spots_after: i32,
    pub bindings: i32,
    pub outcome: String, // 最后一个执行轮次的结果
}
