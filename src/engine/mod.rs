// ==========================================
// 模联会议注册系统 - 引擎层
// ==========================================
// 职责: 偏好解析、席位分配、四轮编排
// 红线: Engine 不拼 SQL, 席位读写只经过 SlotStore
// ==========================================

pub mod allocation;
pub mod error;
pub mod orchestrator;
pub mod preference;

// 重导出核心引擎
pub use allocation::{AllocationEngine, AssignOutcome, PassLimits, PassResult, SlotBinding};
pub use error::{EngineError, EngineResult};
pub use orchestrator::{AllocationOrchestrator, AllocationPass, AllocationReport, PassReport};
pub use preference::{shuffled, PreferenceResolver};
