//! Integration tests across the storage stack.
//!
//! Tests: seed → service → repository → policy resolution
//!
//! The Postgres test runs only when `TOTES_TEST_DATABASE_URL` points at a
//! disposable database; otherwise it returns early.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sqlx::postgres::PgPoolOptions;
    use totes_auth::{PermissionId, PermissionRegistry, check_permission};
    use totes_parties::Customer;

    use crate::policy::PolicyResolver;
    use crate::seed::{AdminAccount, seed};
    use crate::service::{CrudService, ServiceError};
    use crate::services::Services;
    use crate::store::{PostgresRepository, Repository, apply_schema};

    fn customer(personal_id: &str) -> Customer {
        serde_json::from_value(serde_json::json!({
            "customer_name": "Lucia",
            "customer_id": personal_id,
            "email": "lucia@example.com",
            "identifier_type_id": 1
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn seeded_admin_can_manage_customers_end_to_end() {
        let services = Services::in_memory();
        let registry = PermissionRegistry::with_defaults();
        let admin = AdminAccount { email: "root@totes.test".into(), password: "pw-123456".into(), bcrypt_cost: 4 };
        seed(&services, &registry, Some(admin)).await.unwrap();

        let resolved = PolicyResolver::new(services.clone()).resolve("root@totes.test").await.unwrap().unwrap();
        assert!(check_permission(Some(&resolved.principal), &registry, PermissionId::CreateCustomer));

        let created = services.customers.create(customer("CC-77")).await.unwrap();
        assert_eq!(services.customers.find_by_key("customer_id", "CC-77").await.unwrap(), created);
        assert_eq!(services.customers.search("id", &created.id.to_string()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_creates_through_the_service_yield_one_winner() {
        let services = Services::in_memory();
        let svc = services.customers.clone();

        let (a, b) = tokio::join!(svc.create(customer("CC-1")), svc.create(customer("CC-1")));
        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(r, Err(ServiceError::Conflict(_)))));
    }

    #[tokio::test]
    async fn postgres_repository_enforces_natural_keys() {
        let Ok(url) = std::env::var("TOTES_TEST_DATABASE_URL") else {
            return;
        };
        let pool = PgPoolOptions::new().max_connections(4).connect(&url).await.unwrap();
        apply_schema(&pool).await.unwrap();
        sqlx::query("DELETE FROM entities WHERE kind = 'customer'").execute(&pool).await.unwrap();
        sqlx::query("DELETE FROM entity_keys WHERE kind = 'customer'").execute(&pool).await.unwrap();

        let repo: Arc<dyn Repository<Customer>> = Arc::new(PostgresRepository::new(pool));
        let svc = CrudService::new(repo);

        let created = svc.create(customer("PG-1")).await.unwrap();
        assert_eq!(svc.get(created.id).await.unwrap(), created);
        assert_eq!(svc.search("customer_name", "LUC").await.unwrap().len(), 1);

        let (a, b) = tokio::join!(svc.create(customer("PG-2")), svc.create(customer("PG-2")));
        assert_eq!([a, b].iter().filter(|r| r.is_ok()).count(), 1);

        svc.delete(created.id).await.unwrap();
        assert_eq!(svc.get(created.id).await, Err(ServiceError::NotFound));
    }
}
