//! Startup seeding of reference data. Safe to run on every boot.

use std::collections::{HashMap, HashSet};

use anyhow::{Context, bail};
use tracing::info;

use totes_auth::{
    ACTIVE_STATE, INACTIVE_STATE, Permission, PermissionRegistry, Role, User, UserStateType, UserType, hash_password,
    normalize_email,
};
use totes_core::{Entity, EntityId};
use totes_inventory::ItemType;
use totes_invoicing::OrderStateType;
use totes_parties::IdentifierType;

use crate::service::{CrudService, ServiceError};
use crate::services::Services;

pub const ADMINISTRATOR: &str = "Administrator";

const IDENTIFIER_TYPES: &[&str] = &["Citizenship Card", "Tax ID", "Passport"];
const ITEM_TYPES: &[&str] = &["Product", "Service"];
const ORDER_STATE_TYPES: &[&str] = &["Pending", "Paid", "Cancelled"];

/// Initial administrator account.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub email: String,
    pub password: String,
    pub bcrypt_cost: u32,
}

/// Return the record holding `key = value`, creating `candidate` when absent.
async fn ensure<E: Entity>(svc: &CrudService<E>, key: &str, value: &str, candidate: E) -> anyhow::Result<E> {
    match svc.find_by_key(key, value).await {
        Ok(existing) => Ok(existing),
        Err(ServiceError::NotFound) => match svc.create(candidate).await {
            Ok(created) => Ok(created),
            // Another instance seeded it first.
            Err(ServiceError::Conflict(_)) => Ok(svc.find_by_key(key, value).await?),
            Err(e) => Err(e).with_context(|| format!("seeding {} '{value}'", E::KIND)),
        },
        Err(e) => Err(e.into()),
    }
}

pub async fn seed(services: &Services, registry: &PermissionRegistry, admin: Option<AdminAccount>) -> anyhow::Result<()> {
    sync_permissions(services, registry).await?;

    let all_codes: Vec<i32> = registry.iter().map(|(_, code)| code).collect();
    let mut admin_role = ensure(
        &services.roles,
        "name",
        ADMINISTRATOR,
        Role::new(ADMINISTRATOR, "Holds every permission", all_codes.clone())?,
    )
    .await?;
    if admin_role.permissions != all_codes {
        admin_role.permissions = all_codes;
        admin_role = services.roles.update(admin_role.id, admin_role).await?;
    }

    let admin_type = ensure(
        &services.user_types,
        "name",
        ADMINISTRATOR,
        UserType::new(ADMINISTRATOR, "System administrators", vec![admin_role.id])?,
    )
    .await?;

    let active = ensure(&services.user_state_types, "description", "Active", UserStateType::new("Active")).await?;
    let inactive =
        ensure(&services.user_state_types, "description", "Inactive", UserStateType::new("Inactive")).await?;
    if active.id.get() != ACTIVE_STATE || inactive.id.get() != INACTIVE_STATE {
        bail!(
            "user state types must be Active = {ACTIVE_STATE} and Inactive = {INACTIVE_STATE}, found {} and {}",
            active.id,
            inactive.id
        );
    }

    for name in IDENTIFIER_TYPES {
        ensure(&services.identifier_types, "name", name, IdentifierType::new(*name)).await?;
    }
    for name in ITEM_TYPES {
        ensure(&services.item_types, "name", name, ItemType::new(*name)).await?;
    }
    for description in ORDER_STATE_TYPES {
        ensure(&services.order_state_types, "description", description, OrderStateType::new(*description)).await?;
    }

    if let Some(account) = admin {
        seed_admin(services, account, admin_type.id, active.id).await?;
    }

    info!(permissions = registry.len(), "reference data seeded");
    Ok(())
}

/// Bring stored permission rows in line with `registry` and carry role
/// grants along with any code that moved.
///
/// Moving rows are first parked above every known code so that swapped codes
/// never collide on the unique `code` key. Not atomic across records: an
/// interrupted run can leave role grants on the old codes.
async fn sync_permissions(services: &Services, registry: &PermissionRegistry) -> anyhow::Result<()> {
    let stored = services.permissions.list().await.context("listing stored permissions")?;

    let moves: Vec<(Permission, i32)> = stored
        .iter()
        .filter_map(|row| match registry.by_name(&row.name) {
            Some((_, code)) if code != row.code => Some((row.clone(), code)),
            _ => None,
        })
        .collect();

    if !moves.is_empty() {
        let ceiling = stored
            .iter()
            .map(|row| row.code)
            .chain(registry.iter().map(|(_, code)| code))
            .max()
            .unwrap_or(0);

        for (offset, (row, _)) in moves.iter().enumerate() {
            let parked = i32::try_from(offset)
                .ok()
                .and_then(|offset| ceiling.checked_add(1)?.checked_add(offset))
                .context("no free permission code left to park a moving permission")?;
            move_permission(services, row, parked).await?;
        }
        for (row, code) in &moves {
            move_permission(services, row, *code).await?;
        }

        let remap: HashMap<i32, i32> = moves.iter().map(|(row, code)| (row.code, *code)).collect();
        migrate_role_grants(services, &remap).await?;
        info!(moved = moves.len(), "permission codes moved");
    }

    for (id, code) in registry.iter() {
        ensure(&services.permissions, "name", id.name(), Permission::from_registry(id, code)).await?;
    }
    Ok(())
}

async fn move_permission(services: &Services, row: &Permission, code: i32) -> anyhow::Result<()> {
    let mut moved = row.clone();
    moved.code = code;
    services
        .permissions
        .update(row.id, moved)
        .await
        .with_context(|| format!("moving {} to code {code}", row.name))?;
    Ok(())
}

/// Rewrite every role's grants through `remap` (old code to new code).
async fn migrate_role_grants(services: &Services, remap: &HashMap<i32, i32>) -> anyhow::Result<()> {
    for role in services.roles.list().await.context("listing roles")? {
        let mut seen = HashSet::with_capacity(role.permissions.len());
        let permissions: Vec<i32> = role
            .permissions
            .iter()
            .map(|code| remap.get(code).copied().unwrap_or(*code))
            .filter(|code| seen.insert(*code))
            .collect();
        if permissions == role.permissions {
            continue;
        }
        let mut migrated = role.clone();
        migrated.permissions = permissions;
        services
            .roles
            .update(role.id, migrated)
            .await
            .with_context(|| format!("migrating grants of role '{}'", role.name))?;
    }
    Ok(())
}

async fn seed_admin(
    services: &Services,
    account: AdminAccount,
    user_type_id: EntityId,
    state_id: EntityId,
) -> anyhow::Result<()> {
    let email = normalize_email(&account.email);
    match services.users.find_by_key("email", &email).await {
        Ok(_) => return Ok(()),
        Err(ServiceError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let AdminAccount { password, bcrypt_cost, .. } = account;
    let hash = tokio::task::spawn_blocking(move || hash_password(&password, bcrypt_cost))
        .await
        .context("password hashing task failed")??;

    match services.users.create(User::new(&email, hash, user_type_id, state_id)?).await {
        Ok(user) => info!(email = %user.email, "bootstrap administrator created"),
        Err(ServiceError::Conflict(_)) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use totes_auth::{PermissionId, Principal, check_permission, verify_password};

    use super::*;
    use crate::policy::PolicyResolver;

    fn admin() -> Option<AdminAccount> {
        Some(AdminAccount {
            email: "Root@Totes.test".into(),
            password: "correct horse".into(),
            bcrypt_cost: 4,
        })
    }

    #[tokio::test]
    async fn seeding_twice_changes_nothing() {
        let services = Services::in_memory();
        let registry = PermissionRegistry::with_defaults();

        seed(&services, &registry, admin()).await.unwrap();
        seed(&services, &registry, admin()).await.unwrap();

        assert_eq!(services.permissions.list().await.unwrap().len(), registry.len());
        assert_eq!(services.roles.list().await.unwrap().len(), 1);
        assert_eq!(services.user_state_types.list().await.unwrap().len(), 2);
        assert_eq!(services.identifier_types.list().await.unwrap().len(), 3);
        assert_eq!(services.item_types.list().await.unwrap().len(), 2);
        assert_eq!(services.order_state_types.list().await.unwrap().len(), 3);
        assert_eq!(services.users.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn bootstrap_admin_holds_every_permission() {
        let services = Services::in_memory();
        let registry = PermissionRegistry::with_defaults();
        seed(&services, &registry, admin()).await.unwrap();

        let user = services.users.find_by_key("email", "root@totes.test").await.unwrap();
        assert!(user.is_active());
        assert!(verify_password("correct horse", &user.password_hash).unwrap());

        let resolved = PolicyResolver::new(services).resolve("root@totes.test").await.unwrap().unwrap();
        for id in PermissionId::ALL {
            assert!(check_permission(Some(&resolved.principal), &registry, *id));
        }
    }

    #[tokio::test]
    async fn overridden_codes_are_persisted() {
        let services = Services::in_memory();
        let registry = PermissionRegistry::with_overrides([("CREATE_USER", 900)]).unwrap();
        seed(&services, &registry, None).await.unwrap();

        let stored = services.permissions.find_by_key("name", "CREATE_USER").await.unwrap();
        assert_eq!(stored.code, 900);
        assert!(services.users.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn role_grants_follow_moved_codes() {
        let services = Services::in_memory();
        seed(&services, &PermissionRegistry::with_defaults(), None).await.unwrap();

        let create_user = PermissionId::CreateUser.default_code();
        let clerk = services
            .roles
            .create(Role::new("Clerk", "", vec![create_user]).unwrap())
            .await
            .unwrap();

        let registry =
            PermissionRegistry::with_overrides([("CREATE_USER", 900), ("DELETE_APPOINTMENT", create_user)]).unwrap();
        seed(&services, &registry, None).await.unwrap();

        let clerk = services.roles.get(clerk.id).await.unwrap();
        assert_eq!(clerk.permissions, vec![900]);

        let principal = Principal::from_roles("clerk@totes.test", [&clerk]);
        assert!(check_permission(Some(&principal), &registry, PermissionId::CreateUser));
        assert!(!check_permission(Some(&principal), &registry, PermissionId::DeleteAppointment));
    }

    #[tokio::test]
    async fn swapped_codes_reseed_cleanly() {
        let services = Services::in_memory();
        seed(&services, &PermissionRegistry::with_defaults(), None).await.unwrap();

        let create_user = PermissionId::CreateUser.default_code();
        let get_user = PermissionId::GetUserById.default_code();
        let clerk = services
            .roles
            .create(Role::new("Clerk", "", vec![create_user]).unwrap())
            .await
            .unwrap();

        let registry =
            PermissionRegistry::with_overrides([("CREATE_USER", get_user), ("GET_USER_BY_ID", create_user)]).unwrap();
        seed(&services, &registry, None).await.unwrap();

        let stored = services.permissions.find_by_key("name", "CREATE_USER").await.unwrap();
        assert_eq!(stored.code, get_user);
        let stored = services.permissions.find_by_key("name", "GET_USER_BY_ID").await.unwrap();
        assert_eq!(stored.code, create_user);
        assert_eq!(services.permissions.list().await.unwrap().len(), registry.len());
        assert_eq!(services.roles.get(clerk.id).await.unwrap().permissions, vec![get_user]);

        let admin = services.roles.find_by_key("name", ADMINISTRATOR).await.unwrap();
        let principal = Principal::from_roles("root@totes.test", [&admin]);
        for id in PermissionId::ALL {
            assert!(check_permission(Some(&principal), &registry, *id));
        }
    }
}
