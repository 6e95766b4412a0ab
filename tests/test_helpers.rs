// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、参考数据生成等功能
// ==========================================

#![allow(dead_code)]

use chrono::Utc;
use mun_registry::db::{configure_sqlite_connection, init_schema};
use mun_registry::domain::{Committee, Country, School};
use mun_registry::repository::{AssignmentRepository, CatalogRepository, SchoolRepository};
use rusqlite::Connection;
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    mun_registry::logging::init_test();

    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = Connection::open(&db_path)?;
    configure_sqlite_connection(&conn)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接（所有仓储共用）
pub fn open_shared(db_path: &str) -> Arc<Mutex<Connection>> {
    let conn = Connection::open(db_path).expect("打开测试数据库失败");
    configure_sqlite_connection(&conn).expect("配置连接失败");
    Arc::new(Mutex::new(conn))
}

/// 标准测试会议的参考数据
///
/// - 国家: 1..=special 为稀缺国家, 其后 regular 个为普通国家
/// - 委员会: 1 个特殊委员会 (id=1) + regular_committees 个普通委员会, 均为 2 人代表团
pub fn seed_catalog(
    conn: &Arc<Mutex<Connection>>,
    special: i64,
    regular: i64,
    regular_committees: i64,
) -> (Vec<Country>, Vec<Committee>) {
    let repo = CatalogRepository::new(conn.clone());

    let countries: Vec<Country> = (1..=special + regular)
        .map(|id| Country {
            id,
            name: format!("Country {}", id),
            special: id <= special,
        })
        .collect();
    for c in &countries {
        repo.upsert_country(c).expect("插入国家失败");
    }

    let committees: Vec<Committee> = (1..=regular_committees + 1)
        .map(|id| Committee {
            id,
            name: format!("C{}", id),
            full_name: format!("Committee {}", id),
            delegation_size: 2,
            special: id == 1,
        })
        .collect();
    for c in &committees {
        repo.upsert_committee(c).expect("插入委员会失败");
    }

    AssignmentRepository::new(conn.clone())
        .provision_all()
        .expect("开设席位失败");

    (countries, committees)
}

/// 插入测试学校
pub fn insert_school(
    conn: &Arc<Mutex<Connection>>,
    id: i64,
    max_delegation_size: i32,
    waitlist: bool,
) -> School {
    let school = School {
        id,
        name: format!("School {}", id),
        max_delegation_size,
        waitlist,
        registered_at: Utc::now(),
    };
    SchoolRepository::new(conn.clone())
        .upsert(&school)
        .expect("插入学校失败");
    school
}
