//! One [`CrudService`] per entity kind, wired to a single backend.

use std::sync::Arc;

use sqlx::PgPool;

use totes_auth::{Permission, Role, User, UserStateType, UserType};
use totes_core::Entity;
use totes_crm::{Appointment, Comment};
use totes_inventory::{AdditionalExpense, Item, ItemType};
use totes_invoicing::{DiscountType, ExternalSale, Invoice, OrderStateType, TaxType};
use totes_parties::{Customer, Employee, IdentifierType};

use crate::service::CrudService;
use crate::store::{InMemoryRepository, PostgresRepository, Repository};

macro_rules! services {
    ($($field:ident: $entity:ty),+ $(,)?) => {
        #[derive(Clone)]
        pub struct Services {
            $(pub $field: CrudService<$entity>,)+
        }

        impl Services {
            pub fn in_memory() -> Self {
                Self { $($field: in_memory::<$entity>(),)+ }
            }

            pub fn postgres(pool: PgPool) -> Self {
                Self { $($field: postgres::<$entity>(&pool),)+ }
            }
        }
    };
}

fn in_memory<E: Entity>() -> CrudService<E> {
    let repo: Arc<dyn Repository<E>> = Arc::new(InMemoryRepository::<E>::new());
    CrudService::new(repo)
}

fn postgres<E: Entity>(pool: &PgPool) -> CrudService<E> {
    let repo: Arc<dyn Repository<E>> = Arc::new(PostgresRepository::<E>::new(pool.clone()));
    CrudService::new(repo)
}

services! {
    users: User,
    roles: Role,
    permissions: Permission,
    user_types: UserType,
    user_state_types: UserStateType,
    customers: Customer,
    employees: Employee,
    identifier_types: IdentifierType,
    items: Item,
    item_types: ItemType,
    additional_expenses: AdditionalExpense,
    invoices: Invoice,
    discount_types: DiscountType,
    tax_types: TaxType,
    order_state_types: OrderStateType,
    external_sales: ExternalSale,
    appointments: Appointment,
    comments: Comment,
}
