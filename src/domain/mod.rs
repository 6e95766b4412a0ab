// ==========================================
// 模联会议注册系统 - 领域模型层
// ==========================================
// 职责: 定义国家、委员会、学校、席位等领域实体
// 红线: 不含数据访问逻辑,不含分配引擎逻辑
// ==========================================

pub mod allocation_run;
pub mod assignment;
pub mod conference;
pub mod reference;
pub mod school;
pub mod types;

// 重导出核心类型
pub use allocation_run::AllocationRun;
pub use assignment::Assignment;
pub use conference::Conference;
pub use reference::{Committee, ConferenceCatalog, Country};
pub use school::{CountryPreference, PreferenceColumns, School};
pub use types::{AssignmentId, CommitteeId, CountryId, SchoolId};
