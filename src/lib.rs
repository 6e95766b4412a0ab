// ==========================================
// 模联会议注册系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 学校注册后按偏好自动分配 (委员会, 国家) 席位
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 偏好解析与席位分配
pub mod engine;

// 配置层 - 分配参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 注册接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    AllocationRun, Assignment, Committee, Conference, ConferenceCatalog, Country,
    CountryPreference, PreferenceColumns, School,
};

// 引擎
pub use engine::{
    AllocationEngine, AllocationOrchestrator, AllocationReport, AssignOutcome, PassLimits,
    PreferenceResolver,
};

// 仓储
pub use repository::{InMemorySlotStore, SlotStore};

// API
pub use api::RegistrationApi;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "模联会议注册系统";
