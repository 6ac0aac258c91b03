//! Role phase: create roles junior-first, then restore the hierarchy in one call.

use tracing::{debug, info};

use crate::directory::{Directory, NewRole, RolePosition};
use crate::error::Cancelled;
use crate::identity::IdentityMap;
use crate::model::{Role, Workspace};
use crate::outcome::{Outcome, Step};
use crate::pacing::{PaceKind, Pacer};
use crate::report::{Phase, PhaseReport};

/// Audit-log reason for every creation the engine performs.
pub const CLONE_REASON: &str = "Server cloning";

/// Audit-log reason for the bulk role position assignment.
pub const REORDER_REASON: &str = "Hierarchical reordering of roles";

/// Create every non-default source role on the target and record it in
/// `identity`, then reorder the copies to match the source hierarchy.
pub async fn replicate_roles<D>(
    directory: &D,
    pacer: &Pacer,
    source: &Workspace,
    target: &Workspace,
    identity: &mut IdentityMap,
) -> Result<PhaseReport, Cancelled>
where
    D: Directory + ?Sized,
{
    let mut report = PhaseReport::new(Phase::Roles);
    let mut roles: Vec<&Role> = source.replicable_roles().collect();
    roles.sort_by_key(|r| r.position);
    info!(count = roles.len(), "cloning roles");

    for role in &roles {
        let entity = format!("role \"{}\"", role.name);
        let result = directory
            .create_role(target.id, &NewRole::from(*role), CLONE_REASON)
            .await;
        match Outcome::from_result(Step::CreateRole, result) {
            Outcome::Done(new_id) => {
                identity.record_role(role.id, new_id);
                info!(source = %role.id, target = %new_id, "role created: {}", role.name);
                report.record_success();
                pacer.pause(PaceKind::RoleCreate).await?;
            }
            Outcome::Skipped(failure)
            | Outcome::PhaseAborted(failure)
            | Outcome::Fatal(failure) => {
                failure.log(&entity);
                report.record_skip(entity, &failure);
            }
        }
    }

    let plan = reorder_plan(&roles, identity);
    if plan.is_empty() {
        debug!("no replicated roles to reorder");
        return Ok(report);
    }

    let result = directory
        .edit_role_positions(target.id, &plan, REORDER_REASON)
        .await;
    match Outcome::from_result(Step::ReorderRoles, result) {
        Outcome::Done(()) => {
            info!(roles = plan.len(), "role hierarchy reordered");
            report.record_success();
            pacer.pause(PaceKind::PermissionUpdate).await?;
        }
        Outcome::Skipped(failure) | Outcome::PhaseAborted(failure) | Outcome::Fatal(failure) => {
            failure.log("role hierarchy");
            report.record_skip("role hierarchy", &failure);
        }
    }

    Ok(report)
}

/// The position assignment for every replicated role.
///
/// Source roles are taken most senior first and filtered to those present in
/// the identity map. The first gets rank `n`, the last rank `1`, so relative
/// order among the copies matches the source. Ties keep the caller's order.
pub fn reorder_plan(source_roles: &[&Role], identity: &IdentityMap) -> Vec<RolePosition> {
    let mut senior_first: Vec<&Role> = source_roles.to_vec();
    senior_first.sort_by(|a, b| b.position.cmp(&a.position));
    let mapped: Vec<_> = senior_first
        .iter()
        .filter_map(|r| identity.role(r.id))
        .collect();
    let n = mapped.len() as i64;
    mapped
        .into_iter()
        .enumerate()
        .map(|(i, id)| RolePosition {
            id,
            position: n - i as i64,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DirectoryError;
    use crate::id::{GuildId, RoleId};
    use crate::memory::{Call, FaultOp, MemoryDirectory};
    use proptest::prelude::*;

    fn source() -> Workspace {
        let mut ws = Workspace::new(GuildId(1), "Source");
        ws.roles.push(Role::new(RoleId(11), "Member", 1));
        ws.roles.push(Role::new(RoleId(13), "Admin", 3));
        ws.roles.push(Role::new(RoleId(12), "Mod", 2));
        ws
    }

    mod plan {
        use super::*;

        #[test]
        fn test_ranks_descend_from_count() {
            let ws = source();
            let roles: Vec<&Role> = ws.replicable_roles().collect();
            let mut identity = IdentityMap::new();
            identity.record_role(RoleId(11), RoleId(111));
            identity.record_role(RoleId(12), RoleId(112));
            identity.record_role(RoleId(13), RoleId(113));
            let plan = reorder_plan(&roles, &identity);
            assert_eq!(
                plan,
                vec![
                    RolePosition { id: RoleId(113), position: 3 },
                    RolePosition { id: RoleId(112), position: 2 },
                    RolePosition { id: RoleId(111), position: 1 },
                ]
            );
        }

        #[test]
        fn test_unmapped_roles_excluded() {
            let ws = source();
            let roles: Vec<&Role> = ws.replicable_roles().collect();
            let mut identity = IdentityMap::new();
            identity.record_role(RoleId(11), RoleId(111));
            identity.record_role(RoleId(13), RoleId(113));
            let plan = reorder_plan(&roles, &identity);
            assert_eq!(
                plan,
                vec![
                    RolePosition { id: RoleId(113), position: 2 },
                    RolePosition { id: RoleId(111), position: 1 },
                ]
            );
        }

        #[test]
        fn test_empty_map_gives_empty_plan() {
            let ws = source();
            let roles: Vec<&Role> = ws.replicable_roles().collect();
            assert!(reorder_plan(&roles, &IdentityMap::new()).is_empty());
        }
    }

    mod replicate {
        use super::*;

        #[tokio::test]
        async fn test_creates_ascending_and_reorders() {
            let src = source();
            let target = Workspace::new(GuildId(2), "Target");
            let dir = MemoryDirectory::new();
            dir.insert_workspace(target.clone());
            let mut identity = IdentityMap::new();

            let report = replicate_roles(&dir, &Pacer::unpaced(), &src, &target, &mut identity)
                .await
                .unwrap();

            assert!(report.is_clean());
            assert_eq!(identity.role_count(), 3);
            let created: Vec<String> = dir
                .calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::CreateRole(name) => Some(name),
                    _ => None,
                })
                .collect();
            assert_eq!(created, vec!["Member", "Mod", "Admin"]);

            let after = dir.workspace(GuildId(2)).unwrap();
            let mut names: Vec<&Role> = after.replicable_roles().collect();
            names.sort_by(|a, b| b.position.cmp(&a.position));
            let names: Vec<&str> = names.iter().map(|r| r.name.as_str()).collect();
            assert_eq!(names, vec!["Admin", "Mod", "Member"]);
        }

        #[tokio::test]
        async fn test_failed_role_omitted_from_map_and_reorder() {
            let src = source();
            let target = Workspace::new(GuildId(2), "Target");
            let dir = MemoryDirectory::new();
            dir.insert_workspace(target.clone());
            dir.fail(
                FaultOp::CreateRole,
                "Mod",
                DirectoryError::Forbidden {
                    msg: "Missing Permissions".into(),
                },
            );
            let mut identity = IdentityMap::new();

            let report = replicate_roles(&dir, &Pacer::unpaced(), &src, &target, &mut identity)
                .await
                .unwrap();

            assert_eq!(identity.role_count(), 2);
            assert_eq!(identity.role(RoleId(12)), None);
            assert_eq!(report.skipped.len(), 1);
            let reorder = dir.calls().into_iter().find_map(|c| match c {
                Call::EditRolePositions(p) => Some(p),
                _ => None,
            });
            assert_eq!(reorder.map(|p| p.len()), Some(2));
        }

        #[tokio::test]
        async fn test_reorder_failure_is_warning() {
            let src = source();
            let target = Workspace::new(GuildId(2), "Target");
            let dir = MemoryDirectory::new();
            dir.insert_workspace(target.clone());
            dir.fail(
                FaultOp::EditRolePositions,
                "*",
                DirectoryError::Forbidden {
                    msg: "Missing Permissions".into(),
                },
            );
            let mut identity = IdentityMap::new();

            let report = replicate_roles(&dir, &Pacer::unpaced(), &src, &target, &mut identity)
                .await
                .unwrap();
            assert!(report.completed());
            assert_eq!(identity.role_count(), 3);
            assert_eq!(report.skipped[0].step, Step::ReorderRoles);
        }

        #[tokio::test]
        async fn test_no_roles_no_reorder_call() {
            let src = Workspace::new(GuildId(1), "Source");
            let target = Workspace::new(GuildId(2), "Target");
            let dir = MemoryDirectory::new();
            dir.insert_workspace(target.clone());
            let mut identity = IdentityMap::new();

            replicate_roles(&dir, &Pacer::unpaced(), &src, &target, &mut identity)
                .await
                .unwrap();
            assert!(dir.calls().is_empty());
        }
    }

    proptest! {
        #[test]
        fn prop_plan_preserves_relative_order(
            positions in proptest::collection::vec(0i64..50, 0..20),
            mapped_mask in proptest::collection::vec(any::<bool>(), 20),
        ) {
            let roles: Vec<Role> = positions
                .iter()
                .enumerate()
                .map(|(i, p)| Role::new(RoleId(100 + i as u64), format!("r{i}"), *p))
                .collect();
            let refs: Vec<&Role> = roles.iter().collect();
            let mut identity = IdentityMap::new();
            for (i, role) in roles.iter().enumerate() {
                if mapped_mask[i] {
                    identity.record_role(role.id, RoleId(role.id.get() + 1000));
                }
            }

            let plan = reorder_plan(&refs, &identity);

            prop_assert_eq!(plan.len(), identity.role_count());
            for (i, entry) in plan.iter().enumerate() {
                prop_assert_eq!(entry.position, (plan.len() - i) as i64);
            }
            // A strictly more senior source role never ends up below a junior one.
            for a in &plan {
                for b in &plan {
                    let sa = roles.iter().find(|r| r.id.get() + 1000 == a.id.get()).unwrap();
                    let sb = roles.iter().find(|r| r.id.get() + 1000 == b.id.get()).unwrap();
                    if sa.position > sb.position {
                        prop_assert!(a.position > b.position);
                    }
                }
            }
        }
    }
}
