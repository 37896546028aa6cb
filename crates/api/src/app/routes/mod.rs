use axum::Router;

pub mod appointments;
pub mod auth;
pub mod billing;
pub mod crud;
pub mod customers;
pub mod external_sales;
pub mod invoices;
pub mod items;
pub mod resources;
pub mod roles;
pub mod system;
pub mod users;

use resources::{
    AdditionalExpenses, Comments, DiscountTypes, Employees, IdentifierTypes, ItemTypes, OrderStateTypes,
    Permissions, TaxTypes, UserStateTypes,
};

/// Every pipeline route. The auth middleware is layered on by the caller.
pub fn router() -> Router {
    Router::new()
        .merge(auth::router())
        .nest("/users", users::router())
        .nest("/roles", roles::roles_router())
        .nest("/permissions", crud::router::<Permissions>())
        .nest("/user-types", roles::user_types_router())
        .nest("/user-state-types", crud::router::<UserStateTypes>())
        .nest("/customers", customers::router())
        .nest("/employees", crud::router::<Employees>())
        .nest("/identifier-types", crud::router::<IdentifierTypes>())
        .nest("/items", items::router())
        .nest("/item-types", crud::router::<ItemTypes>())
        .nest("/additional-expenses", crud::router::<AdditionalExpenses>())
        .nest("/invoices", invoices::router())
        .nest("/external-sales", external_sales::router())
        .nest("/discount-types", crud::router::<DiscountTypes>())
        .nest("/tax-types", crud::router::<TaxTypes>())
        .nest("/order-state-types", crud::router::<OrderStateTypes>())
        .nest("/appointments", appointments::router())
        .nest("/comments", crud::router::<Comments>())
        .nest("/billing", billing::router())
}
