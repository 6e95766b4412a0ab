// ==========================================
// 模联会议注册系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod allocation_run_repo;
pub mod assignment_repo;
pub mod catalog_repo;
pub mod error;
pub mod memory_store;
pub mod school_repo;
pub mod slot_store;

// 重导出核心仓储
pub use allocation_run_repo::AllocationRunRepository;
pub use assignment_repo::AssignmentRepository;
pub use catalog_repo::CatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use memory_store::InMemorySlotStore;
pub use school_repo::SchoolRepository;
pub use slot_store::SlotStore;
