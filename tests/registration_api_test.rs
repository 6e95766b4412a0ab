// ==========================================
// RegistrationApi 集成测试
// ==========================================
// 测试目标: 验证偏好刷新、自动分配、候补名单释放、分配日志
// ==========================================

mod test_helpers;

use mun_registry::api::{ApiError, RegistrationApi, TRIGGER_ADMIN, TRIGGER_WAITLIST_RELEASE};
use mun_registry::repository::{AssignmentRepository, SchoolRepository};
use std::collections::BTreeSet;
use test_helpers::{create_test_db, insert_school, open_shared, seed_catalog};

/// 标准会议: 2 个稀缺国家, 8 个普通国家, 1 个特殊委员会 + 3 个普通委员会
fn setup() -> (
    tempfile::NamedTempFile,
    std::sync::Arc<std::sync::Mutex<rusqlite::Connection>>,
    RegistrationApi,
) {
    let (tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    seed_catalog(&conn, 2, 8, 3);
    let api = RegistrationApi::from_connection(conn.clone());
    (tmp, conn, api)
}

// ==========================================
// 国家偏好
// ==========================================

#[test]
fn test_update_country_preferences_filters_and_ranks() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 12, false);

    let processed = api
        .update_country_preferences(1, vec![3_i64, 0, 3, 5, 0, 7])
        .unwrap();
    assert_eq!(processed, vec![3, 5, 7]);

    let prefs = SchoolRepository::new(conn.clone())
        .list_country_preferences(1)
        .unwrap();
    let pairs: Vec<(i64, i32)> = prefs.iter().map(|p| (p.country_id, p.rank)).collect();
    assert_eq!(pairs, vec![(3, 0), (5, 1), (7, 2)]);
}

#[test]
fn test_update_country_preferences_replaces_previous() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 12, false);

    api.update_country_preferences(1, vec![3_i64, 5, 7]).unwrap();
    api.update_country_preferences(1, vec![Some(8_i64), None, Some(4)])
        .unwrap();

    let prefs = SchoolRepository::new(conn.clone())
        .list_country_preferences(1)
        .unwrap();
    let ids: Vec<i64> = prefs.iter().map(|p| p.country_id).collect();
    assert_eq!(ids, vec![8, 4]);
}

#[test]
fn test_update_country_preferences_all_empty_keeps_existing() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 12, false);

    api.update_country_preferences(1, vec![3_i64, 5]).unwrap();
    let processed = api.update_country_preferences(1, vec![0_i64, 0]).unwrap();
    assert!(processed.is_empty());

    let prefs = SchoolRepository::new(conn.clone())
        .list_country_preferences(1)
        .unwrap();
    assert_eq!(prefs.len(), 2);
}

#[test]
fn test_update_country_preferences_unknown_school() {
    let (_tmp, _conn, api) = setup();

    let err = api.update_country_preferences(42, vec![3_i64]).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[test]
fn test_country_preference_columns_layout() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 12, false);
    api.update_country_preferences(1, vec![3_i64, 4, 5, 6, 7, 8, 9])
        .unwrap();

    let columns = api.country_preference_columns(1).unwrap();
    assert_eq!(columns.len(), 5);
    let first: Vec<Option<i64>> = columns.iter().map(|(a, _)| a.as_ref().map(|c| c.id)).collect();
    let second: Vec<Option<i64>> = columns.iter().map(|(_, b)| b.as_ref().map(|c| c.id)).collect();
    assert_eq!(first, vec![Some(3), Some(4), Some(5), Some(6), Some(7)]);
    assert_eq!(second, vec![Some(8), Some(9), None, None, None]);
}

// ==========================================
// 自动分配
// ==========================================

#[test]
fn test_auto_country_assign_fills_school_and_logs_run() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 12, false);

    let report = api.auto_country_assign(1, Some(7)).unwrap();

    // 第 1 轮上限 floor(0.15 * 12 + 1) = 2 → 两次绑定后中止,第 2 轮跳过
    assert_eq!(report.spots_before, 12);
    assert_eq!(report.passes[0].result.bindings.len(), 2);
    assert_eq!(report.passes.len(), 3);
    assert_eq!(report.spots_left, 0);
    assert_eq!(report.total_bindings(), 6);

    let seats = AssignmentRepository::new(conn.clone()).assigned_seats(1).unwrap();
    assert_eq!(seats, 12);
    assert_eq!(api.school_assignments(1).unwrap().len(), 6);

    let history = api.allocation_history(1).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].seed, 7);
    assert_eq!(history[0].trigger, TRIGGER_ADMIN);
    assert_eq!(history[0].bindings, 6);
    assert_eq!(history[0].spots_after, 0);
    assert_eq!(history[0].outcome, "EXHAUSTED");
}

#[test]
fn test_auto_country_assign_rerun_binds_nothing() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 12, false);

    api.auto_country_assign(1, Some(7)).unwrap();
    let second = api.auto_country_assign(1, Some(8)).unwrap();

    assert_eq!(second.total_bindings(), 0);
    assert!(second.passes.is_empty());
    assert_eq!(api.school_assignments(1).unwrap().len(), 6);

    let history = api.allocation_history(1).unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().any(|r| r.outcome == "SKIPPED" && r.seed == 8));
}

#[test]
fn test_auto_country_assign_same_seed_reproducible() {
    let run = |seed: u64| -> BTreeSet<(i64, i64)> {
        let (_tmp, conn, api) = setup();
        insert_school(&conn, 1, 16, false);
        api.update_country_preferences(1, vec![9_i64, 4]).unwrap();
        api.auto_country_assign(1, Some(seed)).unwrap();
        api.school_assignments(1)
            .unwrap()
            .into_iter()
            .map(|a| (a.committee_id, a.country_id))
            .collect()
    };

    let first = run(2026);
    let second = run(2026);
    assert!(!first.is_empty());
    assert_eq!(first, second);
}

#[test]
fn test_auto_country_assign_generates_seed_when_absent() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 6, false);

    let report = api.auto_country_assign(1, None).unwrap();
    let history = api.allocation_history(1).unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].bindings as usize, report.total_bindings());
}

#[test]
fn test_auto_country_assign_two_schools_share_pool() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 40, false);
    insert_school(&conn, 2, 40, false);

    api.auto_country_assign(1, Some(1)).unwrap();
    api.auto_country_assign(2, Some(2)).unwrap();

    let slots = AssignmentRepository::new(conn.clone()).list_all().unwrap();
    let first: BTreeSet<i64> = slots
        .iter()
        .filter(|s| s.school_id == Some(1))
        .map(|s| s.id)
        .collect();
    let second: BTreeSet<i64> = slots
        .iter()
        .filter(|s| s.school_id == Some(2))
        .map(|s| s.id)
        .collect();
    assert!(!first.is_empty());
    assert!(first.is_disjoint(&second));

    let repo = AssignmentRepository::new(conn.clone());
    assert!(repo.assigned_seats(1).unwrap() <= 40);
    assert!(repo.assigned_seats(2).unwrap() <= 40);
}

#[test]
fn test_auto_country_assign_storage_failure_keeps_bindings_without_run_log() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 12, false);

    // 第 3 次绑定时数据库报错
    conn.lock()
        .unwrap()
        .execute_batch(
            r#"
            CREATE TRIGGER fail_third_binding
            BEFORE UPDATE OF school_id ON assignment
            WHEN (SELECT COUNT(*) FROM assignment WHERE school_id IS NOT NULL) >= 2
            BEGIN
                SELECT RAISE(ABORT, 'disk I/O error');
            END;
            "#,
        )
        .unwrap();

    let err = api.auto_country_assign(1, Some(7)).unwrap_err();
    assert!(matches!(err, ApiError::DatabaseError(_)));

    // 已完成的绑定保留,且不写分配日志
    assert_eq!(api.school_assignments(1).unwrap().len(), 2);
    assert!(api.allocation_history(1).unwrap().is_empty());
}

#[test]
fn test_auto_country_assign_unknown_school() {
    let (_tmp, _conn, api) = setup();

    let err = api.auto_country_assign(999, Some(1)).unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

// ==========================================
// 候补名单释放
// ==========================================

#[test]
fn test_remove_from_waitlist_triggers_allocation() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 8, true);

    let report = api.remove_from_waitlist(1, Some(3)).unwrap();
    assert!(report.is_some());

    let school = SchoolRepository::new(conn.clone())
        .find_by_id(1)
        .unwrap()
        .unwrap();
    assert!(!school.waitlist);
    assert!(!api.school_assignments(1).unwrap().is_empty());

    let history = api.allocation_history(1).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].trigger, TRIGGER_WAITLIST_RELEASE);
}

#[test]
fn test_remove_from_waitlist_noop_when_not_waitlisted() {
    let (_tmp, conn, api) = setup();
    insert_school(&conn, 1, 8, false);

    let report = api.remove_from_waitlist(1, Some(3)).unwrap();
    assert!(report.is_none());
    assert!(api.school_assignments(1).unwrap().is_empty());
    assert!(api.allocation_history(1).unwrap().is_empty());
}
