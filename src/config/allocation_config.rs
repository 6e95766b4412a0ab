// ==========================================
// 模联会议注册系统 - 分配参数
// ==========================================
// 职责: 四轮分配的阈值/配额/比例
// 默认值即标准分配流程的取值
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// 第 1/2 轮触发阈值: spots_left 大于此值才进入稀缺轮次
    pub special_pass_threshold: i32,
    /// 第 1 轮上限比例: max_spots = ratio * max_delegation_size + 1
    pub special_country_ratio: f64,
    /// 第 2 轮上限比例
    pub regular_country_ratio: f64,
    /// 第 1/2 轮每个委员会的新绑定配额
    pub special_pass_quota: u32,
    /// 第 3 轮（学校偏好国家）每个委员会的新绑定配额
    pub preference_pass_quota: u32,
    /// 未指定时的每委员会配额
    pub default_quota: u32,
    /// 未指定时的轮次上限
    pub default_max_spots: i32,
    /// 剩余名额低于此值视为已用尽
    pub exhausted_below: i32,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            special_pass_threshold: 10,
            special_country_ratio: 0.15,
            regular_country_ratio: 0.20,
            special_pass_quota: 1,
            preference_pass_quota: 3,
            default_quota: 100,
            default_max_spots: 100,
            exhausted_below: 2,
        }
    }
}

impl AllocationConfig {
    /// 按比例计算轮次上限: ratio * max_delegation_size + 1
    ///
    /// 向下取整: 上限只与整数名额比较（`max_spots < 0`）,取整不改变触发时机
    pub fn ceiling(ratio: f64, max_delegation_size: i32) -> i32 {
        (ratio * f64::from(max_delegation_size) + 1.0).floor() as i32
    }
}

// ==========================================
// AllocationConfigReader Trait
// ==========================================
// 用途: 分配编排器所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）、AllocationConfig（固定值）
pub trait AllocationConfigReader: Send + Sync {
    /// 读取分配参数,缺失项使用默认值
    fn allocation_config(&self) -> Result<AllocationConfig, Box<dyn Error>>;
}

impl AllocationConfigReader for AllocationConfig {
    fn allocation_config(&self) -> Result<AllocationConfig, Box<dyn Error>> {
        Ok(self.clone())
    }
}
