// ==========================================
// 模联会议注册系统 - 引擎层错误类型
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// 席位读写失败: 本次运行中已完成的绑定保留,不回滚
    #[error("席位存储失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("分配参数读取失败: {0}")]
    Config(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
