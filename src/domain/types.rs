// ==========================================
// 模联会议注册系统 - 领域类型定义
// ==========================================

/// 国家主键
pub type CountryId = i64;

/// 委员会主键
pub type CommitteeId = i64;

/// 学校主键
pub type SchoolId = i64;

/// 席位（Assignment）主键
pub type AssignmentId = i64;
