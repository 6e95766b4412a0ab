// ==========================================
// 模联会议注册系统 - 分配编排器
// ==========================================
// 职责: 按固定顺序驱动四轮分配
//
// | 轮次 | 触发条件            | 国家池           | 委员会池           | 配额 | 上限                 |
// |------|---------------------|------------------|--------------------|------|----------------------|
// | 1    | spots_left > 阈值   | 稀缺国家（随机） | 学校委员会偏好     | 1    | 0.15 * 总名额 + 1    |
// | 2    | spots_left > 阈值   | 普通国家（随机） | 学校委员会偏好     | 1    | 0.20 * 总名额 + 1    |
// | 3    | spots_left > 0      | 学校国家偏好     | 普通委员会（随机） | 3    | 默认                 |
// | 4    | spots_left > 0      | 普通国家（随机） | 普通委员会（随机） | 默认 | 默认                 |
// ==========================================

use crate::config::{AllocationConfig, AllocationConfigReader};
use crate::domain::{ConferenceCatalog, CountryPreference, School, SchoolId};
use crate::engine::allocation::{AllocationEngine, AssignOutcome, PassLimits, PassResult, SlotBinding};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::preference::{shuffled, PreferenceResolver};
use crate::repository::slot_store::SlotStore;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{info, instrument};

// ==========================================
// AllocationPass - 轮次
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationPass {
    SpecialCountries,   // 第 1 轮: 稀缺国家
    RegularCountries,   // 第 2 轮: 普通国家
    PreferredCountries, // 第 3 轮: 学校偏好国家
    Fallback,           // 第 4 轮: 兜底
}

impl AllocationPass {
    /// 轮次序号（1-4）
    pub fn number(&self) -> u8 {
        match self {
            AllocationPass::SpecialCountries => 1,
            AllocationPass::RegularCountries => 2,
            AllocationPass::PreferredCountries => 3,
            AllocationPass::Fallback => 4,
        }
    }
}

impl fmt::Display for AllocationPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocationPass::SpecialCountries => write!(f, "SPECIAL_COUNTRIES"),
            AllocationPass::RegularCountries => write!(f, "REGULAR_COUNTRIES"),
            AllocationPass::PreferredCountries => write!(f, "PREFERRED_COUNTRIES"),
            AllocationPass::Fallback => write!(f, "FALLBACK"),
        }
    }
}

// ==========================================
// AllocationReport - 分配结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReport {
    pub pass: AllocationPass,
    pub spots_before: i32,
    pub limits: PassLimits,
    pub result: PassResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationReport {
    pub school_id: SchoolId,
    pub spots_before: i32, // 运行前剩余名额
    pub spots_left: i32,   // 运行后剩余名额
    pub passes: Vec<PassReport>, // 仅包含实际执行的轮次
}

impl AllocationReport {
    /// 本次运行绑定的全部席位
    pub fn bindings(&self) -> impl Iterator<Item = &SlotBinding> {
        self.passes.iter().flat_map(|p| p.result.bindings.iter())
    }

    pub fn total_bindings(&self) -> usize {
        self.passes.iter().map(|p| p.result.bindings.len()).sum()
    }

    /// 最后一个执行轮次的结束原因（未执行任何轮次时为 None）
    pub fn last_outcome(&self) -> Option<AssignOutcome> {
        self.passes.last().map(|p| p.result.outcome)
    }
}

// ==========================================
// AllocationOrchestrator - 分配编排器
// ==========================================
pub struct AllocationOrchestrator<C>
where
    C: AllocationConfigReader,
{
    config: Arc<C>,
    resolver: PreferenceResolver,
}

impl<C> AllocationOrchestrator<C>
where
    C: AllocationConfigReader,
{
    /// 创建新的编排器实例
    ///
    /// # 参数
    /// - config: 分配参数读取器
    pub fn new(config: Arc<C>) -> Self {
        Self {
            config,
            resolver: PreferenceResolver::new(),
        }
    }

    /// 为学校自动分配国家与委员会席位
    ///
    /// # 参数
    /// - store: 席位存储（查找 + 比较并设置绑定）
    /// - catalog: 国家/委员会参考数据
    /// - school: 目标学校
    /// - preferences: 学校国家偏好
    /// - assigned_seats: 学校已占用的名额（重复运行时不会超配）
    /// - rng: 随机源（固定种子可复现）
    ///
    /// # 返回
    /// 各轮次结果; 存储故障时已完成的绑定保留
    #[instrument(skip(self, store, catalog, school, preferences, rng), fields(
        school_id = school.id,
        max_delegation_size = school.max_delegation_size
    ))]
    pub fn auto_country_assign<S, R>(
        &self,
        store: &S,
        catalog: &ConferenceCatalog,
        school: &School,
        preferences: &[CountryPreference],
        assigned_seats: i32,
        rng: &mut R,
    ) -> EngineResult<AllocationReport>
    where
        S: SlotStore + ?Sized,
        R: Rng + ?Sized,
    {
        let cfg = self
            .config
            .allocation_config()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        let engine = AllocationEngine::with_exhausted_below(cfg.exhausted_below);

        let remaining = (school.max_delegation_size - assigned_seats).max(0);
        // 已分配过的学校若剩余不足下限,与上次运行的 Exhausted 结果一致
        let spots_before = if assigned_seats > 0 && remaining < cfg.exhausted_below {
            0
        } else {
            remaining
        };
        let mut spots_left = spots_before;
        let mut passes = Vec::new();

        info!(spots_before, assigned_seats, "开始自动分配");

        let committee_prefs = self.resolver.committee_preferences(catalog, rng);

        // ==========================================
        // 第 1 轮: 稀缺国家 × 学校委员会偏好
        // ==========================================
        if spots_left > cfg.special_pass_threshold {
            let countries = shuffled(catalog.special_countries(), rng);
            let limits = PassLimits {
                num_delegations: cfg.special_pass_quota,
                max_spots: AllocationConfig::ceiling(cfg.special_country_ratio, school.max_delegation_size),
            };
            let result = engine.auto_assign(store, &countries, &committee_prefs, school, spots_left, limits)?;
            spots_left = record_pass(&mut passes, AllocationPass::SpecialCountries, spots_left, limits, result);
        }

        // ==========================================
        // 第 2 轮: 普通国家 × 学校委员会偏好
        // ==========================================
        if spots_left > cfg.special_pass_threshold {
            let countries = shuffled(catalog.regular_countries(), rng);
            let limits = PassLimits {
                num_delegations: cfg.special_pass_quota,
                max_spots: AllocationConfig::ceiling(cfg.regular_country_ratio, school.max_delegation_size),
            };
            let result = engine.auto_assign(store, &countries, &committee_prefs, school, spots_left, limits)?;
            spots_left = record_pass(&mut passes, AllocationPass::RegularCountries, spots_left, limits, result);
        }

        // ==========================================
        // 第 3 轮: 学校偏好国家 × 普通委员会
        // ==========================================
        if spots_left > 0 {
            let countries = self.resolver.resolve_country_preferences(preferences, catalog);
            let committees = shuffled(catalog.regular_committees(), rng);
            let limits = PassLimits {
                num_delegations: cfg.preference_pass_quota,
                max_spots: cfg.default_max_spots,
            };
            let result = engine.auto_assign(store, &countries, &committees, school, spots_left, limits)?;
            spots_left = record_pass(&mut passes, AllocationPass::PreferredCountries, spots_left, limits, result);
        }

        // ==========================================
        // 第 4 轮: 普通国家 × 普通委员会（兜底）
        // ==========================================
        if spots_left > 0 {
            let countries = shuffled(catalog.regular_countries(), rng);
            let committees = shuffled(catalog.regular_committees(), rng);
            let limits = PassLimits {
                num_delegations: cfg.default_quota,
                max_spots: cfg.default_max_spots,
            };
            let result = engine.auto_assign(store, &countries, &committees, school, spots_left, limits)?;
            spots_left = record_pass(&mut passes, AllocationPass::Fallback, spots_left, limits, result);
        }

        let report = AllocationReport {
            school_id: school.id,
            spots_before,
            spots_left,
            passes,
        };

        info!(
            passes_run = report.passes.len(),
            bindings = report.total_bindings(),
            spots_left,
            "自动分配完成"
        );

        Ok(report)
    }
}

/// 记录轮次结果,返回下一轮的 spots_left
fn record_pass(
    passes: &mut Vec<PassReport>,
    pass: AllocationPass,
    spots_before: i32,
    limits: PassLimits,
    result: PassResult,
) -> i32 {
    let spots_left = result.spots_left();
    info!(
        pass = %pass,
        spots_before,
        spots_left,
        bindings = result.bindings.len(),
        outcome = %result.outcome,
        "轮次完成"
    );
    passes.push(PassReport {
        pass,
        spots_before,
        limits,
        result,
    });
    spots_left
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Committee, Country, CountryId};
    use crate::repository::memory_store::{FailingSlotStore, InMemorySlotStore};
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn catalog(special_countries: i64, regular_countries: i64) -> ConferenceCatalog {
        let countries = (1..=special_countries + regular_countries)
            .map(|id| Country {
                id,
                name: format!("Country {}", id),
                special: id <= special_countries,
            })
            .collect();
        let committees = vec![
            Committee {
                id: 1,
                name: "SC".to_string(),
                full_name: "Security Council".to_string(),
                delegation_size: 2,
                special: true,
            },
            Committee {
                id: 2,
                name: "DISEC".to_string(),
                full_name: "Disarmament".to_string(),
                delegation_size: 2,
                special: false,
            },
            Committee {
                id: 3,
                name: "WHO".to_string(),
                full_name: "World Health Organization".to_string(),
                delegation_size: 2,
                special: false,
            },
        ];
        ConferenceCatalog::new(countries, committees)
    }

    fn provision_all(catalog: &ConferenceCatalog) -> InMemorySlotStore {
        let store = InMemorySlotStore::new();
        for cm in &catalog.committees {
            for ct in &catalog.countries {
                store.provision(cm.id, ct.id).unwrap();
            }
        }
        store
    }

    fn school(max_delegation_size: i32) -> School {
        School {
            id: 1,
            name: "Berkeley High".to_string(),
            max_delegation_size,
            waitlist: false,
            registered_at: Utc::now(),
        }
    }

    fn prefs(ids: &[CountryId]) -> Vec<CountryPreference> {
        ids.iter()
            .enumerate()
            .map(|(rank, &country_id)| CountryPreference {
                school_id: 1,
                country_id,
                rank: rank as i32,
            })
            .collect()
    }

    #[test]
    fn test_small_school_skips_special_passes() {
        let catalog = catalog(2, 6);
        let store = provision_all(&catalog);
        let orchestrator = AllocationOrchestrator::new(Arc::new(AllocationConfig::default()));

        let report = orchestrator
            .auto_country_assign(&store, &catalog, &school(6), &prefs(&[5, 6]), 0, &mut StdRng::seed_from_u64(1))
            .unwrap();

        assert_eq!(report.passes[0].pass, AllocationPass::PreferredCountries);
        // 偏好国家 5、6 在普通委员会中优先分配
        let first_pass_countries: Vec<_> =
            report.passes[0].result.bindings.iter().map(|b| b.country_id).collect();
        assert!(first_pass_countries.iter().all(|id| *id == 5 || *id == 6));
        assert_eq!(report.spots_left, 0);
        assert_eq!(report.total_bindings(), 3);
    }

    #[test]
    fn test_large_school_runs_special_pass_with_ceiling() {
        let catalog = catalog(4, 10);
        let store = provision_all(&catalog);
        let orchestrator = AllocationOrchestrator::new(Arc::new(AllocationConfig::default()));

        let report = orchestrator
            .auto_country_assign(&store, &catalog, &school(20), &[], 0, &mut StdRng::seed_from_u64(2))
            .unwrap();

        let first = &report.passes[0];
        assert_eq!(first.pass, AllocationPass::SpecialCountries);
        assert_eq!(first.limits.max_spots, 4);
        assert_eq!(first.limits.num_delegations, 1);
        // 每个委员会配额 1,委员会 3 个,上限 4 → 第 3 次绑定突破上限
        assert_eq!(first.result.bindings.len(), 3);
        assert_eq!(first.result.outcome, AssignOutcome::CeilingReached { spots_left: 14 });
        assert!(first.result.bindings.iter().all(|b| b.country_id <= 4));
        assert_eq!(report.spots_left, 0);
    }

    #[test]
    fn test_second_run_on_exhausted_school_binds_nothing() {
        let catalog = catalog(2, 6);
        let store = provision_all(&catalog);
        let orchestrator = AllocationOrchestrator::new(Arc::new(AllocationConfig::default()));
        let school = school(12);

        let first = orchestrator
            .auto_country_assign(&store, &catalog, &school, &[], 0, &mut StdRng::seed_from_u64(3))
            .unwrap();
        // 第 1 轮上限 2 → 两次绑定后中止; 第 2 轮跳过; 第 4 轮填满剩余 8 个名额
        let seats: i32 = first.bindings().map(|b| b.seats).sum();
        assert_eq!(seats, 12);
        assert_eq!(first.last_outcome(), Some(AssignOutcome::Exhausted));
        let run: Vec<AllocationPass> = first.passes.iter().map(|p| p.pass).collect();
        assert_eq!(
            run,
            vec![
                AllocationPass::SpecialCountries,
                AllocationPass::PreferredCountries,
                AllocationPass::Fallback
            ]
        );

        let second = orchestrator
            .auto_country_assign(&store, &catalog, &school, &[], seats, &mut StdRng::seed_from_u64(4))
            .unwrap();
        assert_eq!(second.spots_before, 0);
        assert_eq!(second.spots_left, 0);
        assert!(second.passes.is_empty());
        assert_eq!(second.total_bindings(), 0);
        assert_eq!(store.slots_for_school(1).unwrap().len(), 6);
    }

    #[test]
    fn test_store_failure_aborts_run_and_keeps_bindings() {
        let catalog = catalog(2, 6);
        let store = FailingSlotStore::new(provision_all(&catalog), 3);
        let orchestrator = AllocationOrchestrator::new(Arc::new(AllocationConfig::default()));

        // 第 1 轮绑定 2 个席位,第 4 轮的第一次绑定失败
        let result = orchestrator.auto_country_assign(
            &store,
            &catalog,
            &school(12),
            &[],
            0,
            &mut StdRng::seed_from_u64(3),
        );

        assert!(matches!(result, Err(EngineError::Repository(_))));
        let kept = store.inner.slots_for_school(1).unwrap();
        assert_eq!(kept.len(), 2);
        assert!(kept.iter().any(|s| s.committee_id == 1));
    }

    #[test]
    fn test_same_seed_same_assignment() {
        let catalog = catalog(3, 9);
        let orchestrator = AllocationOrchestrator::new(Arc::new(AllocationConfig::default()));

        let run = |seed: u64| {
            let store = provision_all(&catalog);
            orchestrator
                .auto_country_assign(&store, &catalog, &school(16), &prefs(&[7]), 0, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            store.slots_for_school(1).unwrap()
        };

        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_rerun_with_one_seat_left_is_noop() {
        let catalog = catalog(2, 6);
        let store = provision_all(&catalog);
        let orchestrator = AllocationOrchestrator::new(Arc::new(AllocationConfig::default()));

        // 总名额 9,已占 8: 剩余 1 低于下限
        let report = orchestrator
            .auto_country_assign(&store, &catalog, &school(9), &prefs(&[5]), 8, &mut StdRng::seed_from_u64(5))
            .unwrap();

        assert_eq!(report.spots_before, 0);
        assert!(report.passes.is_empty());
        assert!(report.last_outcome().is_none());
        assert!(store.slots_for_school(1).unwrap().is_empty());
    }

    #[test]
    fn test_pass_numbers() {
        assert_eq!(AllocationPass::SpecialCountries.number(), 1);
        assert_eq!(AllocationPass::Fallback.number(), 4);
        assert_eq!(AllocationPass::PreferredCountries.to_string(), "PREFERRED_COUNTRIES");
    }
}
