// ==========================================
// 模联会议注册系统 - 偏好解析器
// ==========================================
// 职责:
// 1) 原始国家 ID 序列 → 去重、去空、重新编号的偏好
// 2) 偏好记录 → 按 rank 排序的国家列表
// 3) 委员会偏好顺序（全局 special 划分,各自随机打乱）
// 随机源由调用方注入,固定种子即可复现
// ==========================================

use crate::domain::{Committee, ConferenceCatalog, Country, CountryId, CountryPreference, SchoolId};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;

#[derive(Debug, Default, Clone, Copy)]
pub struct PreferenceResolver;

impl PreferenceResolver {
    pub fn new() -> Self {
        Self
    }

    /// 过滤原始国家 ID: 跳过 0 / None 与重复项,保持原始顺序
    ///
    /// 例: [3, 0, 3, 5, 0, 7] → [3, 5, 7]
    pub fn process_country_ids<I, T>(&self, raw: I) -> Vec<CountryId>
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<CountryId>>,
    {
        let mut seen = HashSet::new();
        raw.into_iter()
            .filter_map(Into::into)
            .filter(|id| *id != 0 && seen.insert(*id))
            .collect()
    }

    /// 由已过滤的 ID 构建偏好记录, rank 为过滤后的位置（从 0 开始）
    pub fn build_preferences(
        &self,
        school_id: SchoolId,
        country_ids: &[CountryId],
    ) -> Vec<CountryPreference> {
        country_ids
            .iter()
            .enumerate()
            .map(|(rank, &country_id)| CountryPreference {
                school_id,
                country_id,
                rank: rank as i32,
            })
            .collect()
    }

    /// 偏好记录 → 按 rank 升序的国家列表
    ///
    /// 未知国家与重复国家被跳过
    pub fn resolve_country_preferences(
        &self,
        preferences: &[CountryPreference],
        catalog: &ConferenceCatalog,
    ) -> Vec<Country> {
        let mut ranked: Vec<&CountryPreference> = preferences.iter().collect();
        ranked.sort_by_key(|p| p.rank);

        let mut seen = HashSet::new();
        ranked
            .into_iter()
            .filter(|p| seen.insert(p.country_id))
            .filter_map(|p| catalog.country(p.country_id).cloned())
            .collect()
    }

    /// 委员会偏好顺序: 特殊委员会在前,普通委员会在后,组内随机
    pub fn committee_preferences<R: Rng + ?Sized>(
        &self,
        catalog: &ConferenceCatalog,
        rng: &mut R,
    ) -> Vec<Committee> {
        let mut order = shuffled(catalog.special_committees(), rng);
        order.extend(shuffled(catalog.regular_committees(), rng));
        order
    }
}

/// 随机打乱一个池（显式随机步骤,替代数据库层的随机排序）
pub fn shuffled<T, R: Rng + ?Sized>(mut pool: Vec<T>, rng: &mut R) -> Vec<T> {
    pool.shuffle(rng);
    pool
}
