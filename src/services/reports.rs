//! Team and organisation performance rollups.

use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::auth::{check, Access, Actor};
use crate::db::Database;
use crate::error::{AppError, AppResult};
use crate::models::{Capability, RoleTier, User, WON_STATUSES};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutiveMetrics {
    pub user_id: Uuid,
    pub user_name: String,
    pub user_email: String,
    pub total_leads: usize,
    pub total_calls: usize,
    pub closed_won: usize,
    pub conversion_rate: f64,
    pub total_dollar_value: f64,
    pub secured_orders: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub stage_distribution: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagerRollup {
    pub manager_id: Uuid,
    pub manager_name: String,
    pub manager_email: String,
    pub total_leads: usize,
    pub total_calls: usize,
    pub closed_won: usize,
    pub conversion_rate: f64,
    pub total_dollar_value: f64,
    pub secured_orders: usize,
    pub status_counts: BTreeMap<String, usize>,
    pub stage_distribution: BTreeMap<String, usize>,
    pub team: Vec<ExecutiveMetrics>,
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Won leads as a percentage of all leads; 0 when there are none.
pub fn conversion_rate(closed_won: usize, total_leads: usize) -> f64 {
    if total_leads == 0 {
        return 0.0;
    }
    round2(closed_won as f64 / total_leads as f64 * 100.0)
}

pub fn executive_metrics(db: &Database, exec: &User) -> AppResult<ExecutiveMetrics> {
    let leads = db.list_leads_assigned_to_any(&[exec.id])?;
    let calls = db.list_call_logs_by_users(&[exec.id])?;

    let mut status_counts = BTreeMap::new();
    for lead in &leads {
        *status_counts.entry(lead.status.clone()).or_insert(0) += 1;
    }
    let closed_won: usize = WON_STATUSES
        .iter()
        .map(|s| status_counts.get(*s).copied().unwrap_or(0))
        .sum();

    let mut stage_distribution = BTreeMap::new();
    for stage in calls.iter().filter_map(|c| c.stage) {
        *stage_distribution.entry(stage.to_string()).or_insert(0) += 1;
    }

    Ok(ExecutiveMetrics {
        user_id: exec.id,
        user_name: exec.name.clone(),
        user_email: exec.email.clone(),
        total_leads: leads.len(),
        total_calls: calls.len(),
        closed_won,
        conversion_rate: conversion_rate(closed_won, leads.len()),
        total_dollar_value: round2(calls.iter().filter_map(|c| c.dollar_value).sum()),
        secured_orders: calls.iter().filter(|c| c.secured_order).count(),
        status_counts,
        stage_distribution,
    })
}

fn executive_level() -> i64 {
    RoleTier::SalesExecutive.level().unwrap_or(2)
}

/// Sales Managers get their own team, Admins every executive.
pub fn team_performance(db: &Database, viewer: &Actor) -> AppResult<Vec<ExecutiveMetrics>> {
    check(&viewer.permissions, Capability::Reports, Access::Read)?;

    let executives = match viewer.tier() {
        RoleTier::Admin => db.list_users_at_level(executive_level())?,
        RoleTier::SalesManager => db.list_team(viewer.id(), Some(executive_level()))?,
        _ => {
            return Err(AppError::forbidden(
                "only Sales Managers and Admins can view team performance",
            ))
        }
    };

    executives
        .iter()
        .map(|exec| executive_metrics(db, exec))
        .collect()
}

/// Admin only: one rollup per Sales Manager.
pub fn org_performance(db: &Database, viewer: &Actor) -> AppResult<Vec<ManagerRollup>> {
    check(&viewer.permissions, Capability::Reports, Access::Read)?;
    if viewer.tier() != RoleTier::Admin {
        return Err(AppError::forbidden(
            "only Admins can view organization performance",
        ));
    }

    let manager_level = RoleTier::SalesManager.level().unwrap_or(1);
    let mut rollups = Vec::new();
    for manager in db.list_users_at_level(manager_level)? {
        let team = db
            .list_team(manager.id, Some(executive_level()))?
            .iter()
            .map(|exec| executive_metrics(db, exec))
            .collect::<AppResult<Vec<_>>>()?;
        rollups.push(rollup(manager, team));
    }
    Ok(rollups)
}

fn rollup(manager: User, team: Vec<ExecutiveMetrics>) -> ManagerRollup {
    let mut status_counts = BTreeMap::new();
    let mut stage_distribution = BTreeMap::new();
    for member in &team {
        for (k, v) in &member.status_counts {
            *status_counts.entry(k.clone()).or_insert(0) += v;
        }
        for (k, v) in &member.stage_distribution {
            *stage_distribution.entry(k.clone()).or_insert(0) += v;
        }
    }
    let total_leads: usize = team.iter().map(|m| m.total_leads).sum();
    let closed_won: usize = team.iter().map(|m| m.closed_won).sum();

    ManagerRollup {
        manager_id: manager.id,
        manager_name: manager.name,
        manager_email: manager.email,
        total_leads,
        total_calls: team.iter().map(|m| m.total_calls).sum(),
        closed_won,
        conversion_rate: conversion_rate(closed_won, total_leads),
        total_dollar_value: round2(team.iter().map(|m| m.total_dollar_value).sum()),
        secured_orders: team.iter().map(|m| m.secured_orders).sum(),
        status_counts,
        stage_distribution,
        team,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CallLog, Lead, Stage};
    use crate::services::testing::Fixture;

    #[test]
    fn test_conversion_rate() {
        assert_eq!(conversion_rate(0, 0), 0.0);
        assert_eq!(conversion_rate(4, 10), 40.0);
        assert_eq!(conversion_rate(1, 3), 33.33);
    }

    #[test]
    fn test_executive_metrics() {
        let fx = Fixture::new();
        let exec = fx.executive("Eli", Some(fx.manager.id()));

        let empty = executive_metrics(&fx.db, &exec.user).unwrap();
        assert_eq!(empty.total_leads, 0);
        assert_eq!(empty.conversion_rate, 0.0);

        for (i, status) in ["Closed Won", "Closed Won", "Closed Won", "Won"]
            .into_iter()
            .chain(std::iter::repeat("New").take(6))
            .enumerate()
        {
            let mut lead = Lead::new(format!("L{}", i), format!("l{}@x.test", i));
            lead.assign(exec.id(), exec.name());
            lead.status = status.into();
            fx.db.insert_lead(&lead).unwrap();
            if i < 2 {
                let mut call = CallLog::new(lead.id, exec.id());
                call.stage = Some(Stage::C);
                call.dollar_value = Some(100.123);
                call.secured_order = i == 0;
                fx.db.insert_call_log(&call).unwrap();
            }
        }

        let m = executive_metrics(&fx.db, &exec.user).unwrap();
        assert_eq!(m.total_leads, 10);
        assert_eq!(m.closed_won, 4);
        assert_eq!(m.conversion_rate, 40.0);
        assert_eq!(m.total_calls, 2);
        assert_eq!(m.total_dollar_value, 200.25);
        assert_eq!(m.secured_orders, 1);
        assert_eq!(m.status_counts["New"], 6);
        assert_eq!(m.stage_distribution["C"], 2);
    }

    #[test]
    fn test_team_scoping() {
        let fx = Fixture::new();
        let mine = fx.executive("Eli", Some(fx.manager.id()));
        fx.executive("Other", None);

        let team = team_performance(&fx.db, &fx.manager).unwrap();
        assert_eq!(team.len(), 1);
        assert_eq!(team[0].user_id, mine.id());
        assert_eq!(team_performance(&fx.db, &fx.admin).unwrap().len(), 2);

        let mut exec = mine.clone();
        exec.permissions.grant(Capability::Reports);
        assert!(matches!(
            team_performance(&fx.db, &exec),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn test_org_rollup() {
        let fx = Fixture::new();
        let exec = fx.executive("Eli", Some(fx.manager.id()));
        let mut lead = Lead::new("W".into(), "w@x.test".into());
        lead.assign(exec.id(), exec.name());
        lead.status = "Won".into();
        fx.db.insert_lead(&lead).unwrap();

        let org = org_performance(&fx.db, &fx.admin).unwrap();
        assert_eq!(org.len(), 1);
        assert_eq!(org[0].manager_id, fx.manager.id());
        assert_eq!(org[0].total_leads, 1);
        assert_eq!(org[0].conversion_rate, 100.0);
        assert_eq!(org[0].team.len(), 1);

        assert!(matches!(
            org_performance(&fx.db, &fx.manager),
            Err(AppError::Forbidden(_))
        ));
    }
}
