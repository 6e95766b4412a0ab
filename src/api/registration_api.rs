// ==========================================
// 模联会议注册系统 - 注册 API
// ==========================================
// 职责: 外部 CRUD 层调用分配核心的唯一入口
// 1. 国家偏好整体刷新（去重、去空、重新编号）
// 2. 自动分配（管理员触发 / 学校移出候补名单触发）
// 3. 分配日志记录（种子可复现）
// ==========================================

use std::sync::{Arc, Mutex};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::Connection;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::{
    AllocationRun, Assignment, Country, CountryId, PreferenceColumns, School, SchoolId,
};
use crate::engine::{AllocationOrchestrator, AllocationReport, PreferenceResolver};
use crate::repository::{
    AllocationRunRepository, AssignmentRepository, CatalogRepository, SchoolRepository,
};

/// 分配触发来源: 管理员手动
pub const TRIGGER_ADMIN: &str = "ADMIN";
/// 分配触发来源: 移出候补名单
pub const TRIGGER_WAITLIST_RELEASE: &str = "WAITLIST_RELEASE";

// ==========================================
// RegistrationApi - 注册 API
// ==========================================
pub struct RegistrationApi {
    catalog_repo: Arc<CatalogRepository>,
    school_repo: Arc<SchoolRepository>,
    assignment_repo: Arc<AssignmentRepository>,
    run_repo: Arc<AllocationRunRepository>,
    orchestrator: AllocationOrchestrator<ConfigManager>,
    resolver: PreferenceResolver,
}

impl RegistrationApi {
    /// 创建新的RegistrationApi实例
    pub fn new(
        catalog_repo: Arc<CatalogRepository>,
        school_repo: Arc<SchoolRepository>,
        assignment_repo: Arc<AssignmentRepository>,
        run_repo: Arc<AllocationRunRepository>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            catalog_repo,
            school_repo,
            assignment_repo,
            run_repo,
            orchestrator: AllocationOrchestrator::new(config),
            resolver: PreferenceResolver::new(),
        }
    }

    /// 从共享连接装配全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self::new(
            Arc::new(CatalogRepository::new(conn.clone())),
            Arc::new(SchoolRepository::new(conn.clone())),
            Arc::new(AssignmentRepository::new(conn.clone())),
            Arc::new(AllocationRunRepository::new(conn.clone())),
            Arc::new(ConfigManager::from_connection(conn)),
        )
    }

    // ==========================================
    // 国家偏好
    // ==========================================

    /// 刷新学校的国家偏好
    ///
    /// # 参数
    /// - school_id: 学校ID
    /// - country_ids: 原始国家ID序列（可含 0 / None / 重复）
    ///
    /// # 返回
    /// 过滤后的国家ID; 过滤结果为空时不修改已有偏好
    pub fn update_country_preferences<I, T>(
        &self,
        school_id: SchoolId,
        country_ids: I,
    ) -> ApiResult<Vec<CountryId>>
    where
        I: IntoIterator<Item = T>,
        T: Into<Option<CountryId>>,
    {
        let processed = self.resolver.process_country_ids(country_ids);
        if processed.is_empty() {
            debug!(school_id, "国家偏好为空，保留原有偏好");
            return Ok(processed);
        }

        let preferences = self.resolver.build_preferences(school_id, &processed);
        self.school_repo
            .replace_country_preferences(school_id, &preferences)?;

        info!(school_id, count = processed.len(), "国家偏好已刷新");
        Ok(processed)
    }

    /// 双栏展示布局的国家偏好
    pub fn country_preference_columns(
        &self,
        school_id: SchoolId,
    ) -> ApiResult<Vec<(Option<Country>, Option<Country>)>> {
        let catalog = self.catalog_repo.load_catalog()?;
        let preferences = self.school_repo.list_country_preferences(school_id)?;
        let countries = self
            .resolver
            .resolve_country_preferences(&preferences, &catalog);
        Ok(PreferenceColumns::shuffle(countries))
    }

    // ==========================================
    // 自动分配
    // ==========================================

    /// 管理员触发自动分配
    ///
    /// # 参数
    /// - seed: 随机种子; None 时随机生成并写入分配日志
    pub fn auto_country_assign(
        &self,
        school_id: SchoolId,
        seed: Option<u64>,
    ) -> ApiResult<AllocationReport> {
        let school = self.get_school(school_id)?;
        self.run_allocation(&school, seed, TRIGGER_ADMIN)
    }

    /// 将学校移出候补名单并自动分配
    ///
    /// # 返回
    /// - Ok(None): 学校不在候补名单,无操作
    /// - Ok(Some(report)): 已移出并完成分配
    pub fn remove_from_waitlist(
        &self,
        school_id: SchoolId,
        seed: Option<u64>,
    ) -> ApiResult<Option<AllocationReport>> {
        let school = self.get_school(school_id)?;
        if !school.waitlist {
            debug!(school_id, "学校不在候补名单，跳过");
            return Ok(None);
        }

        self.school_repo.set_waitlist(school_id, false)?;
        let school = School {
            waitlist: false,
            ..school
        };
        info!(school_id, "学校已移出候补名单");

        self.run_allocation(&school, seed, TRIGGER_WAITLIST_RELEASE)
            .map(Some)
    }

    /// 学校已分配的席位
    pub fn school_assignments(&self, school_id: SchoolId) -> ApiResult<Vec<Assignment>> {
        Ok(self.assignment_repo.list_by_school(school_id)?)
    }

    /// 学校的分配日志（最新在前）
    pub fn allocation_history(&self, school_id: SchoolId) -> ApiResult<Vec<AllocationRun>> {
        Ok(self.run_repo.list_by_school(school_id)?)
    }

    // ==========================================
    // 内部方法
    // ==========================================

    fn get_school(&self, school_id: SchoolId) -> ApiResult<School> {
        self.school_repo
            .find_by_id(school_id)?
            .ok_or_else(|| ApiError::NotFound(format!("School(id={})不存在", school_id)))
    }

    fn run_allocation(
        &self,
        school: &School,
        seed: Option<u64>,
        trigger: &str,
    ) -> ApiResult<AllocationReport> {
        if school.waitlist {
            warn!(school_id = school.id, "候补名单中的学校被手动分配");
        }

        let catalog = self.catalog_repo.load_catalog()?;
        let preferences = self.school_repo.list_country_preferences(school.id)?;
        let assigned_seats = self.assignment_repo.assigned_seats(school.id)?;

        let seed = seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let started_at = Utc::now().naive_utc();

        let report = self.orchestrator.auto_country_assign(
            self.assignment_repo.as_ref(),
            &catalog,
            school,
            &preferences,
            assigned_seats,
            &mut rng,
        )?;

        let run = AllocationRun {
            run_id: Uuid::new_v4().to_string(),
            school_id: school.id,
            seed,
            trigger: trigger.to_string(),
            started_at,
            finished_at: Utc::now().naive_utc(),
            spots_before: report.spots_before,
            spots_after: report.spots_left,
            bindings: report.total_bindings() as i32,
            outcome: report
                .last_outcome()
                .map(|o| o.to_string())
                .unwrap_or_else(|| "SKIPPED".to_string()),
        };
        self.run_repo.insert(&run)?;

        info!(
            school_id = school.id,
            run_id = %run.run_id,
            seed,
            trigger,
            bindings = run.bindings,
            "分配日志已记录"
        );
        Ok(report)
    }
}
