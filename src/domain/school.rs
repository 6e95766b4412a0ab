// ==========================================
// 模联会议注册系统 - 学校与国家偏好
// ==========================================

use crate::domain::types::{CountryId, SchoolId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 偏好展示固定长度（双栏各 5 个）
pub const PREFERENCE_DISPLAY_LEN: usize = 10;

// ==========================================
// School - 学校注册记录
// ==========================================
// 说明: 只保留分配相关字段,联系人/费用等属于外部 CRUD 层
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: SchoolId,
    pub name: String,
    pub max_delegation_size: i32, // 可填充的代表总名额
    pub waitlist: bool,           // 是否在候补名单
    pub registered_at: DateTime<Utc>,
}

// ==========================================
// CountryPreference - 国家偏好
// ==========================================
// 不变量: 同一学校 rank 从 0 严格递增, (school_id, country_id) 唯一
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryPreference {
    pub school_id: SchoolId,
    pub country_id: CountryId,
    pub rank: i32,
}

// ==========================================
// PreferenceColumns - 偏好双栏展示布局
// ==========================================
// 展示层辅助,不参与分配逻辑
pub struct PreferenceColumns;

impl PreferenceColumns {
    /// 双栏交错布局: 先补齐到 10 个,再拆成 [0..5] 与 [5..10] 两栏配对
    ///
    /// 例如 [1..=7] → [(1,6), (2,7), (3,-), (4,-), (5,-)]
    pub fn shuffle<T>(items: Vec<T>) -> Vec<(Option<T>, Option<T>)> {
        let mut padded: Vec<Option<T>> = items.into_iter().map(Some).collect();
        if padded.len() < PREFERENCE_DISPLAY_LEN {
            padded.resize_with(PREFERENCE_DISPLAY_LEN, || None);
        }

        let half = PREFERENCE_DISPLAY_LEN / 2;
        let second: Vec<Option<T>> = padded.split_off(half);
        padded.into_iter().zip(second).collect()
    }

    /// 还原 shuffle 的布局: 先第一栏,再第二栏,丢弃空位
    pub fn unshuffle<T>(columns: Vec<(Option<T>, Option<T>)>) -> Vec<T> {
        let (first, second): (Vec<Option<T>>, Vec<Option<T>>) = columns.into_iter().unzip();
        first.into_iter().chain(second).flatten().collect()
    }
}
