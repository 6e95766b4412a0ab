// ==========================================
// 模联会议注册系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::allocation_config::{AllocationConfig, AllocationConfigReader};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        Ok(())
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// 随分配日志一起留存,保证复现时参数一致
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key",
        )?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 读取并解析配置值; 缺失返回默认值,格式错误告警后返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy,
    {
        let Some(raw) = self.get_global_config_value(key)? else {
            return Ok(default);
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                tracing::warn!(
                    config_key = key,
                    raw_value = %raw,
                    "分配参数格式错误，使用默认值"
                );
                Ok(default)
            }
        }
    }
}

// ==========================================
// AllocationConfigReader Trait 实现
// ==========================================
impl AllocationConfigReader for ConfigManager {
    fn allocation_config(&self) -> Result<AllocationConfig, Box<dyn Error>> {
        let d = AllocationConfig::default();
        Ok(AllocationConfig {
            special_pass_threshold: self
                .get_parsed_or_default(config_keys::SPECIAL_PASS_THRESHOLD, d.special_pass_threshold)?,
            special_country_ratio: self
                .get_parsed_or_default(config_keys::SPECIAL_COUNTRY_RATIO, d.special_country_ratio)?,
            regular_country_ratio: self
                .get_parsed_or_default(config_keys::REGULAR_COUNTRY_RATIO, d.regular_country_ratio)?,
            special_pass_quota: self
                .get_parsed_or_default(config_keys::SPECIAL_PASS_QUOTA, d.special_pass_quota)?,
            preference_pass_quota: self
                .get_parsed_or_default(config_keys::PREFERENCE_PASS_QUOTA, d.preference_pass_quota)?,
            default_quota: self.get_parsed_or_default(config_keys::DEFAULT_QUOTA, d.default_quota)?,
            default_max_spots: self
                .get_parsed_or_default(config_keys::DEFAULT_MAX_SPOTS, d.default_max_spots)?,
            exhausted_below: self
                .get_parsed_or_default(config_keys::EXHAUSTED_BELOW, d.exhausted_below)?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 稀缺轮次（第 1/2 轮）
    pub const SPECIAL_PASS_THRESHOLD: &str = "alloc_special_pass_threshold";
    pub const SPECIAL_COUNTRY_RATIO: &str = "alloc_special_country_ratio";
    pub const REGULAR_COUNTRY_RATIO: &str = "alloc_regular_country_ratio";
    pub const SPECIAL_PASS_QUOTA: &str = "alloc_special_pass_quota";

    // 偏好轮次（第 3 轮）
    pub const PREFERENCE_PASS_QUOTA: &str = "alloc_preference_pass_quota";

    // 兜底
    pub const DEFAULT_QUOTA: &str = "alloc_default_quota";
    pub const DEFAULT_MAX_SPOTS: &str = "alloc_default_max_spots";
    pub const EXHAUSTED_BELOW: &str = "alloc_exhausted_below";
}
