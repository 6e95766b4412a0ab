// ==========================================
// 模联会议注册系统 - API 层
// ==========================================
// 职责: 向外部 CRUD 层暴露分配核心
// ==========================================

pub mod error;
pub mod registration_api;

pub use error::{ApiError, ApiResult};
pub use registration_api::{RegistrationApi, TRIGGER_ADMIN, TRIGGER_WAITLIST_RELEASE};
