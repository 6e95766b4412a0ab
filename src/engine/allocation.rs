// ==========================================
// 模联会议注册系统 - 席位分配引擎
// ==========================================
// 职责: 贪心填充 (委员会, 国家) 席位
// 输入: 国家池 + 委员会池 + 学校 + 剩余名额 + 轮次限额
// 输出: 绑定的席位 + 命名的结束原因
// 红线: 已分配的席位只跳过,永不改写
// ==========================================

use crate::domain::{AssignmentId, Committee, CommitteeId, Country, CountryId, School};
use crate::repository::error::RepositoryResult;
use crate::repository::slot_store::SlotStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, instrument};

/// 默认剩余名额下限: 低于此值视为已用尽
pub const DEFAULT_EXHAUSTED_BELOW: i32 = 2;

// ==========================================
// PassLimits - 单轮限额
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassLimits {
    /// 每个委员会在本轮内最多新绑定的席位数
    pub num_delegations: u32,
    /// 本轮总名额上限,随绑定递减,降到负数即结束本轮
    pub max_spots: i32,
}

impl Default for PassLimits {
    fn default() -> Self {
        Self {
            num_delegations: 100,
            max_spots: 100,
        }
    }
}

// ==========================================
// AssignOutcome - 单轮结束原因
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignOutcome {
    /// 剩余名额不足,学校视为已满（剩余名额按 0 计）
    Exhausted,
    /// 本轮上限被突破,提前结束
    CeilingReached { spots_left: i32 },
    /// 国家池/委员会池遍历完毕
    PoolEnded { spots_left: i32 },
}

impl AssignOutcome {
    /// 本轮结束后的剩余名额（恒非负）
    pub fn spots_left(&self) -> i32 {
        match self {
            AssignOutcome::Exhausted => 0,
            AssignOutcome::CeilingReached { spots_left } | AssignOutcome::PoolEnded { spots_left } => {
                *spots_left
            }
        }
    }
}

impl fmt::Display for AssignOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignOutcome::Exhausted => write!(f, "EXHAUSTED"),
            AssignOutcome::CeilingReached { .. } => write!(f, "CEILING_REACHED"),
            AssignOutcome::PoolEnded { .. } => write!(f, "POOL_ENDED"),
        }
    }
}

// ==========================================
// SlotBinding / PassResult
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotBinding {
    pub slot_id: AssignmentId,
    pub committee_id: CommitteeId,
    pub country_id: CountryId,
    pub seats: i32, // 占用名额 = committee.delegation_size
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassResult {
    pub outcome: AssignOutcome,
    pub bindings: Vec<SlotBinding>,
}

impl PassResult {
    pub fn spots_left(&self) -> i32 {
        self.outcome.spots_left()
    }
}

// ==========================================
// AllocationEngine - 席位分配引擎
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct AllocationEngine {
    exhausted_below: i32,
}

impl Default for AllocationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AllocationEngine {
    pub fn new() -> Self {
        Self {
            exhausted_below: DEFAULT_EXHAUSTED_BELOW,
        }
    }

    pub fn with_exhausted_below(exhausted_below: i32) -> Self {
        Self { exhausted_below }
    }

    /// 单轮贪心填充
    ///
    /// 外层遍历委员会（每个委员会重置配额）,内层遍历国家:
    /// - 席位不存在: 跳过
    /// - 席位已分配: 跳过
    /// - 席位未分配: 绑定并立即持久化,扣减 spots_left / max_spots / 配额
    ///
    /// 每次绑定后依次检查:
    /// 1) spots_left 低于下限 → Exhausted
    /// 2) max_spots < 0 → CeilingReached
    /// 3) 委员会配额用完 → 进入下一个委员会
    ///
    /// # 错误
    /// 存储故障直接返回,之前的绑定不回滚
    #[instrument(skip(self, store, countries, committees, school), fields(
        school_id = school.id,
        countries_count = countries.len(),
        committees_count = committees.len(),
        num_delegations = limits.num_delegations,
        max_spots = limits.max_spots
    ))]
    pub fn auto_assign<S>(
        &self,
        store: &S,
        countries: &[Country],
        committees: &[Committee],
        school: &School,
        spots_left: i32,
        limits: PassLimits,
    ) -> RepositoryResult<PassResult>
    where
        S: SlotStore + ?Sized,
    {
        let mut spots_left = spots_left;
        let mut max_spots = limits.max_spots;
        let mut bindings = Vec::new();

        for committee in committees {
            let mut quota = limits.num_delegations;
            if quota == 0 {
                continue;
            }

            for country in countries {
                let Some(slot) = store.find_slot(committee.id, country.id)? else {
                    continue;
                };
                if slot.is_bound() {
                    continue;
                }
                if !store.bind_slot(slot.id, school.id)? {
                    // 查找与绑定之间被其他分配抢占
                    debug!(slot_id = slot.id, "席位已被占用，跳过");
                    continue;
                }

                spots_left -= committee.delegation_size;
                max_spots -= committee.delegation_size;
                quota -= 1;
                bindings.push(SlotBinding {
                    slot_id: slot.id,
                    committee_id: committee.id,
                    country_id: country.id,
                    seats: committee.delegation_size,
                });

                debug!(
                    slot_id = slot.id,
                    committee = %committee.name,
                    country = %country.name,
                    spots_left,
                    max_spots,
                    "席位已绑定"
                );

                if spots_left < self.exhausted_below {
                    return Ok(PassResult {
                        outcome: AssignOutcome::Exhausted,
                        bindings,
                    });
                }
                if max_spots < 0 {
                    return Ok(PassResult {
                        outcome: AssignOutcome::CeilingReached {
                            spots_left: spots_left.max(0),
                        },
                        bindings,
                    });
                }
                if quota == 0 {
                    break;
                }
            }
        }

        Ok(PassResult {
            outcome: AssignOutcome::PoolEnded {
                spots_left: spots_left.max(0),
            },
            bindings,
        })
    }
}
