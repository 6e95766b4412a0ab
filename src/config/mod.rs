// ==========================================
// 模联会议注册系统 - 配置层
// ==========================================
// 职责: 分配参数管理,支持 config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod allocation_config;
pub mod config_manager;

// 重导出核心配置
pub use allocation_config::{AllocationConfig, AllocationConfigReader};
pub use config_manager::{config_keys, ConfigManager};
