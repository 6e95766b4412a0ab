// ==========================================
// 模联会议注册系统 - 会议届次
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conference {
    pub session: i32, // 届次编号

    // ===== 会议日期 =====
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,

    // ===== 注册窗口 =====
    pub reg_open: NaiveDate,
    pub early_reg_close: NaiveDate,
    pub reg_close: NaiveDate,

    // ===== 人数范围 =====
    pub min_attendance: i32,
    pub max_attendance: i32,

    pub open_reg: bool,     // 开放注册
    pub waitlist_reg: bool, // 仅候补注册
}

impl Conference {
    /// 显示名称（如 "BMUN 63"）
    pub fn display_name(&self) -> String {
        format!("BMUN {}", self.session)
    }

    /// 指定日期是否处于注册窗口内
    pub fn is_registration_open(&self, today: NaiveDate) -> bool {
        self.open_reg && today >= self.reg_open && today <= self.reg_close
    }

    /// 是否处于早鸟注册期
    pub fn is_early_registration(&self, today: NaiveDate) -> bool {
        self.is_registration_open(today) && today <= self.early_reg_close
    }
}
