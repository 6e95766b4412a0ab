// ==========================================
// 模联会议注册系统 - 参考数据（国家/委员会）
// ==========================================
// 生命周期: 每届会议初始化一次,之后只读
// ==========================================

use crate::domain::types::{CommitteeId, CountryId};
use serde::{Deserialize, Serialize};

// ==========================================
// Country - 国家
// ==========================================
// special = true 表示稀缺/高需求国家,在限额轮次中优先分配
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Country {
    pub id: CountryId,
    pub name: String,
    pub special: bool,
}

// ==========================================
// Committee - 委员会
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Committee {
    pub id: CommitteeId,
    pub name: String,      // 简称（如 "DISEC"）
    pub full_name: String, // 全称
    pub delegation_size: i32, // 每个席位占用的代表名额
    pub special: bool,
}

// ==========================================
// ConferenceCatalog - 已加载的参考数据
// ==========================================
// 用途: 分配引擎的内存输入,按 special 标志划分国家/委员会池
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConferenceCatalog {
    pub countries: Vec<Country>,
    pub committees: Vec<Committee>,
}

impl ConferenceCatalog {
    pub fn new(countries: Vec<Country>, committees: Vec<Committee>) -> Self {
        Self {
            countries,
            committees,
        }
    }

    /// 按 ID 查找国家
    pub fn country(&self, id: CountryId) -> Option<&Country> {
        self.countries.iter().find(|c| c.id == id)
    }

    /// 按 ID 查找委员会
    pub fn committee(&self, id: CommitteeId) -> Option<&Committee> {
        self.committees.iter().find(|c| c.id == id)
    }

    /// 稀缺国家池（保持加载顺序）
    pub fn special_countries(&self) -> Vec<Country> {
        self.countries.iter().filter(|c| c.special).cloned().collect()
    }

    /// 普通国家池（保持加载顺序）
    pub fn regular_countries(&self) -> Vec<Country> {
        self.countries.iter().filter(|c| !c.special).cloned().collect()
    }

    /// 特殊委员会池
    pub fn special_committees(&self) -> Vec<Committee> {
        self.committees.iter().filter(|c| c.special).cloned().collect()
    }

    /// 普通委员会池
    pub fn regular_committees(&self) -> Vec<Committee> {
        self.committees.iter().filter(|c| !c.special).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country(id: CountryId, special: bool) -> Country {
        Country {
            id,
            name: format!("Country {}", id),
            special,
        }
    }

    fn committee(id: CommitteeId, special: bool) -> Committee {
        Committee {
            id,
            name: format!("C{}", id),
            full_name: format!("Committee {}", id),
            delegation_size: 2,
            special,
        }
    }

    #[test]
    fn test_catalog_partitions_by_special_flag() {
        let catalog = ConferenceCatalog::new(
            vec![country(1, true), country(2, false), country(3, true)],
            vec![committee(10, false), committee(11, true)],
        );

        let special: Vec<_> = catalog.special_countries().iter().map(|c| c.id).collect();
        let regular: Vec<_> = catalog.regular_countries().iter().map(|c| c.id).collect();
        assert_eq!(special, vec![1, 3]);
        assert_eq!(regular, vec![2]);
        assert_eq!(catalog.special_committees()[0].id, 11);
        assert_eq!(catalog.regular_committees()[0].id, 10);
        assert!(catalog.country(4).is_none());
        assert_eq!(catalog.committee(11).map(|c| c.special), Some(true));
    }
}
