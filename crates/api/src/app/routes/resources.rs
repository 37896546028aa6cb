//! Permission tables for every CRUD resource.

use serde::Serialize;

use totes_auth::{Permission, PermissionId as P, Role, User, UserStateType, UserType};
use totes_core::EntityId;
use totes_crm::{Appointment, Comment};
use totes_infra::{CrudService, Services};
use totes_inventory::{AdditionalExpense, Item, ItemType};
use totes_invoicing::{DiscountType, ExternalSale, Invoice, OrderStateType, TaxType};
use totes_parties::{Customer, Employee, IdentifierType};

use super::crud::{CrudPermissions, Resource};

macro_rules! resource {
    ($name:ident, $entity:ty, $label:literal, $field:ident, { $($perms:tt)* }) => {
        pub struct $name;

        impl Resource for $name {
            type Entity = $entity;
            type View = $entity;

            const LABEL: &'static str = $label;
            const PERMISSIONS: CrudPermissions = CrudPermissions { $($perms)* ..CrudPermissions::NONE };

            fn service(services: &Services) -> &CrudService<$entity> {
                &services.$field
            }

            fn view(entity: $entity) -> $entity {
                entity
            }
        }
    };
}

/// A user as returned to clients: never includes the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct UserView {
    pub id: EntityId,
    pub email: String,
    pub user_type_id: EntityId,
    pub user_state_type_id: EntityId,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            user_type_id: user.user_type_id,
            user_state_type_id: user.user_state_type_id,
        }
    }
}

/// Create and update go through `users.rs` (password hashing).
pub struct Users;

impl Resource for Users {
    type Entity = User;
    type View = UserView;

    const LABEL: &'static str = "user";
    const PERMISSIONS: CrudPermissions = CrudPermissions {
        list: Some(P::GetAllUsers),
        get: Some(P::GetUserById),
        search: &[("id", P::SearchUserById), ("email", P::SearchUsersByEmail)],
        ..CrudPermissions::NONE
    };

    fn service(services: &Services) -> &CrudService<User> {
        &services.users
    }

    fn view(entity: User) -> UserView {
        entity.into()
    }
}

resource!(Roles, Role, "role", roles, {
    list: Some(P::GetAllRoles),
    get: Some(P::GetRoleById),
    search: &[("id", P::SearchRoleById), ("name", P::SearchRoleByName)],
});

resource!(Permissions, Permission, "permission", permissions, {
    list: Some(P::GetAllPermissions),
    get: Some(P::GetPermissionById),
    search: &[("id", P::SearchPermissionById), ("name", P::SearchPermissionByName)],
});

resource!(UserTypes, UserType, "user type", user_types, {
    list: Some(P::GetAllUserTypes),
    get: Some(P::GetUserTypeById),
    search: &[("id", P::SearchUserTypesById), ("name", P::SearchUserTypesByName)],
});

resource!(UserStateTypes, UserStateType, "user state type", user_state_types, {
    list: Some(P::GetAllUserStateTypes),
    get: Some(P::GetUserStateTypeById),
});

resource!(Customers, Customer, "customer", customers, {
    list: Some(P::GetAllCustomers),
    get: Some(P::GetCustomerById),
    search: &[
        ("id", P::SearchCustomersById),
        ("customer_name", P::SearchCustomersByName),
        ("last_name", P::SearchCustomersByLastname),
    ],
    create: Some(P::CreateCustomer),
    update: Some(P::UpdateCustomer),
});

resource!(Employees, Employee, "employee", employees, {
    list: Some(P::GetAllEmployees),
    get: Some(P::GetEmployeeById),
    search: &[("id", P::SearchEmployeesById), ("names", P::SearchEmployeesByName)],
    create: Some(P::CreateEmployee),
    update: Some(P::UpdateEmployee),
});

resource!(IdentifierTypes, IdentifierType, "identifier type", identifier_types, {
    list: Some(P::GetAllIdentifierTypes),
    get: Some(P::GetIdentifierTypeById),
});

resource!(Items, Item, "item", items, {
    list: Some(P::GetAllItems),
    get: Some(P::GetItemById),
    search: &[("id", P::SearchItemsById), ("name", P::SearchItemsByName)],
    create: Some(P::CreateItem),
    update: Some(P::UpdateItem),
});

resource!(ItemTypes, ItemType, "item type", item_types, {
    list: Some(P::GetItemTypes),
    get: Some(P::GetItemTypeById),
});

resource!(AdditionalExpenses, AdditionalExpense, "additional expense", additional_expenses, {
    list: Some(P::GetAllAdditionalExpense),
    get: Some(P::GetAdditionalExpenseById),
    create: Some(P::CreateAdditionalExpense),
    update: Some(P::UpdateAdditionalExpense),
    delete: Some(P::DeleteAdditionalExpense),
});

// Creation computes billing; see `invoices.rs`.
resource!(Invoices, Invoice, "invoice", invoices, {
    list: Some(P::GetAllInvoices),
    get: Some(P::GetInvoiceById),
    search: &[("id", P::SearchInvoiceById), ("customer_personal_id", P::SearchInvoiceByCustomerPersonalId)],
});

// Creation resolves the buyer; see `external_sales.rs`.
resource!(ExternalSales, ExternalSale, "external sale", external_sales, {
    list: Some(P::GetAllExternalSales),
    get: Some(P::GetExternalSaleById),
});

resource!(DiscountTypes, DiscountType, "discount type", discount_types, {
    list: Some(P::GetAllDiscountTypes),
    get: Some(P::GetDiscountTypeById),
    create: Some(P::CreateDiscountType),
});

resource!(TaxTypes, TaxType, "tax type", tax_types, {
    list: Some(P::GetAllTaxTypes),
    get: Some(P::GetTaxTypeById),
    create: Some(P::CreateTaxType),
});

resource!(OrderStateTypes, OrderStateType, "order state type", order_state_types, {
    list: Some(P::GetAllOrderStateTypes),
    get: Some(P::GetOrderStateTypeById),
});

// Create and update enforce the slot limit; see `appointments.rs`.
resource!(Appointments, Appointment, "appointment", appointments, {
    list: Some(P::GetAllAppointments),
    get: Some(P::GetAppointmentById),
    search: &[
        ("id", P::SearchAppointmentsById),
        ("customer_id", P::SearchAppointmentsByCustomerId),
        ("state", P::SearchAppointmentByState),
    ],
    delete: Some(P::DeleteAppointment),
});

resource!(Comments, Comment, "comment", comments, {
    list: Some(P::GetAllComments),
    get: Some(P::GetCommentById),
    search: &[("id", P::SearchCommentsById), ("name", P::SearchCommentsByName), ("email", P::SearchCommentsByEmail)],
    create: Some(P::CreateComment),
    update: Some(P::UpdateComment),
});
