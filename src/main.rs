// ==========================================
// 模联会议注册系统 - 管理命令行入口
// ==========================================
// 用途: 建库、开设席位、触发自动分配
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mun_registry::db::{init_schema, open_sqlite_connection};
use mun_registry::repository::AssignmentRepository;
use mun_registry::{logging, RegistrationApi};

#[derive(Parser)]
#[command(name = "mun-registry", version, about = "模联会议注册系统 - 席位分配管理工具")]
struct Cli {
    /// 数据库文件路径（默认: $MUN_REGISTRY_DB_PATH 或用户数据目录）
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 建表（幂等）
    Init,
    /// 为每个 委员会×国家 组合开设席位
    Provision,
    /// 手动触发自动分配
    Assign {
        #[arg(long)]
        school_id: i64,
        /// 随机种子（复现用）
        #[arg(long)]
        seed: Option<u64>,
    },
    /// 将学校移出候补名单并自动分配
    Release {
        #[arg(long)]
        school_id: i64,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// 刷新学校的国家偏好（按顺序, 0 表示空位）
    Preferences {
        #[arg(long)]
        school_id: i64,
        country_ids: Vec<i64>,
    },
}

fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    tracing::info!(version = mun_registry::VERSION, db_path = %db_path, "{}", mun_registry::APP_NAME);

    let conn = open_sqlite_connection(&db_path)
        .with_context(|| format!("无法打开数据库: {}", db_path))?;
    init_schema(&conn).context("建表失败")?;
    let conn = Arc::new(Mutex::new(conn));

    match cli.command {
        Command::Init => {
            tracing::info!("数据库已初始化");
        }
        Command::Provision => {
            let created = AssignmentRepository::new(conn).provision_all()?;
            tracing::info!(created, "席位开设完成");
        }
        Command::Assign { school_id, seed } => {
            let api = RegistrationApi::from_connection(conn);
            let report = api.auto_country_assign(school_id, seed)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Release { school_id, seed } => {
            let api = RegistrationApi::from_connection(conn);
            match api.remove_from_waitlist(school_id, seed)? {
                Some(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                None => tracing::info!(school_id, "学校不在候补名单"),
            }
        }
        Command::Preferences {
            school_id,
            country_ids,
        } => {
            let api = RegistrationApi::from_connection(conn);
            let processed = api.update_country_preferences(school_id, country_ids)?;
            println!("{:?}", processed);
        }
    }

    Ok(())
}

/// 默认数据库路径
///
/// 优先级: 环境变量 > 用户数据目录 > 当前目录
fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var("MUN_REGISTRY_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./mun_registry.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("mun-registry");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("mun_registry.db");
        }
    }
    path.to_string_lossy().to_string()
}
