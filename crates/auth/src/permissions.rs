//! Permission identifiers and the startup-resolved code registry.
//!
//! `PermissionId` is the closed set of gated operations. Integer codes are the
//! persisted representation (role permission lists store codes) and are
//! resolved once at startup: every id gets its default code (declaration
//! order, starting at 1) unless configuration overrides it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

use totes_core::{DomainResult, Entity, EntityId, UniqueKey, require_text};

macro_rules! permission_ids {
    ($($variant:ident => $name:literal),+ $(,)?) => {
        /// Symbolic identifier of one gated operation.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum PermissionId {
            $($variant),+
        }

        impl PermissionId {
            /// Every permission, in declaration order.
            pub const ALL: &'static [PermissionId] = &[$(PermissionId::$variant),+];

            /// The `SCREAMING_SNAKE` name used in configuration and logs.
            pub fn name(&self) -> &'static str {
                match self {
                    $(PermissionId::$variant => $name),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                match name {
                    $($name => Some(PermissionId::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

permission_ids! {
    // users
    GetAllUsers => "GET_ALL_USERS",
    GetUserById => "GET_USER_BY_ID",
    SearchUserById => "SEARCH_USER_BY_ID",
    SearchUsersByEmail => "SEARCH_USERS_BY_EMAIL",
    CreateUser => "CREATE_USER",
    UpdateUser => "UPDATE_USER",
    UpdateUserState => "UPDATE_USER_STATE",
    // roles and permissions
    GetAllRoles => "GET_ALL_ROLES",
    GetRoleById => "GET_ROLE_BY_ID",
    SearchRoleById => "SEARCH_ROLE_BY_ID",
    SearchRoleByName => "SEARCH_ROLE_BY_NAME",
    GetAllPermissionsOfRole => "GET_ALL_PERMISSIONS_OF_ROLE",
    ExistRole => "EXIST_ROLE",
    GetAllPermissions => "GET_ALL_PERMISSIONS",
    GetPermissionById => "GET_PERMISSION_BY_ID",
    SearchPermissionById => "SEARCH_PERMISSION_BY_ID",
    SearchPermissionByName => "SEARCH_PERMISSION_BY_NAME",
    // user types and states
    GetAllUserTypes => "GET_ALL_USER_TYPES",
    GetUserTypeById => "GET_USER_TYPE_BY_ID",
    SearchUserTypesById => "SEARCH_USER_TYPES_BY_ID",
    SearchUserTypesByName => "SEARCH_USER_TYPES_BY_NAME",
    ExistUserType => "EXIST_USER_TYPE",
    GetAllUserStateTypes => "GET_ALL_USER_STATE_TYPES",
    GetUserStateTypeById => "GET_USER_STATE_TYPE_BY_ID",
    // customers
    GetAllCustomers => "GET_ALL_CUSTOMERS",
    GetCustomerById => "GET_CUSTOMER_BY_ID",
    GetCustomerByCustomerId => "GET_CUSTOMER_BY_CUSTOMERID",
    GetCustomerByEmail => "GET_CUSTOMER_BY_EMAIL",
    SearchCustomersById => "SEARCH_CUSTOMERS_BY_ID",
    SearchCustomersByName => "SEARCH_CUSTOMERS_BY_NAME",
    SearchCustomersByLastname => "SEARCH_CUSTOMERS_BY_LASTNAME",
    CreateCustomer => "CREATE_CUSTOMER",
    UpdateCustomer => "UPDATE_CUSTOMER",
    // employees and identifier types
    GetAllEmployees => "GET_ALL_EMPLOYEES",
    GetEmployeeById => "GET_EMPLOYEE_BY_ID",
    SearchEmployeesById => "SEARCH_EMPLOYEES_BY_ID",
    SearchEmployeesByName => "SEARCH_EMPLOYEES_BY_NAME",
    CreateEmployee => "CREATE_EMPLOYEE",
    UpdateEmployee => "UPDATE_EMPLOYEE",
    GetAllIdentifierTypes => "GET_ALL_IDENTIFIER_TYPES",
    GetIdentifierTypeById => "GET_IDENTIFIER_TYPE_BY_ID",
    // inventory
    GetAllItems => "GET_ALL_ITEMS",
    GetItemById => "GET_ITEM_BY_ID",
    SearchItemsById => "SEARCH_ITEMS_BY_ID",
    SearchItemsByName => "SEARCH_ITEMS_BY_NAME",
    CreateItem => "CREATE_ITEM",
    UpdateItem => "UPDATE_ITEM",
    UpdateItemState => "UPDATE_ITEM_STATE",
    CheckItemStock => "CHECK_ITEM_STOCK",
    GetItemTypes => "GET_ITEM_TYPES",
    GetItemTypeById => "GET_ITEM_TYPE_BY_ID",
    GetAllAdditionalExpense => "GET_ALL_ADDITIONAL_EXPENSE",
    GetAdditionalExpenseById => "GET_ADDITIONAL_EXPENSE_BY_ID",
    CreateAdditionalExpense => "CREATE_ADDITIONAL_EXPENSE",
    UpdateAdditionalExpense => "UPDATE_ADDITIONAL_EXPENSE",
    DeleteAdditionalExpense => "DELETE_ADDITIONAL_EXPENSE",
    // invoicing and billing
    GetAllInvoices => "GET_ALL_INVOICES",
    GetInvoiceById => "GET_INVOICE_BY_ID",
    SearchInvoiceById => "SEARCH_INVOICE_BY_ID",
    SearchInvoiceByCustomerPersonalId => "SEARCH_INVOICE_BY_CUSTOMER_PERSONAL_ID",
    CreateInvoice => "CREATE_INVOICE",
    GetAllDiscountTypes => "GET_ALL_DISCOUNT_TYPES",
    GetDiscountTypeById => "GET_DISCOUNT_TYPE_BY_ID",
    CreateDiscountType => "CREATE_DISCOUNT_TYPE",
    GetAllTaxTypes => "GET_ALL_TAX_TYPES",
    GetTaxTypeById => "GET_TAX_TYPE_BY_ID",
    CreateTaxType => "CREATE_TAX_TYPE",
    GetAllOrderStateTypes => "GET_ALL_ORDER_STATE_TYPES",
    GetOrderStateTypeById => "GET_ORDER_STATE_TYPE_BY_ID",
    CalculateSubtotal => "CALCULATE_SUBTOTAL",
    CalculateTotal => "CALCULATE_TOTAL",
    // appointments
    GetAllAppointments => "GET_ALL_APPOINTMENTS",
    GetAppointmentById => "GET_APPOINTMENT_BY_ID",
    SearchAppointmentsById => "SEARCH_APPOINTMENTS_BY_ID",
    SearchAppointmentsByCustomerId => "SEARCH_APPOINTMENTS_BY_CUSTOMER_ID",
    SearchAppointmentByState => "SEARCH_APPOINTMENT_BY_STATE",
    GetAppointmentByCustomerId => "GET_APPOINTMENT_BY_CUSTOMER_ID",
    GetAppointmentsByCustomerIdAndDate => "GET_APPOINTMENTS_BY_CUSTOMERID_AND_DATE",
    GetAppointmentsByHour => "GET_APPOINTMENTS_BY_HOUR",
    CreateAppointment => "CREATE_APPOINTMENT",
    UpdateAppointment => "UPDATE_APPOINTMENT",
    DeleteAppointment => "DELETE_APPOINTMENT",
    // comments
    GetAllComments => "GET_ALL_COMMENTS",
    GetCommentById => "GET_COMMENT_BY_ID",
    SearchCommentsById => "SEARCH_COMMENTS_BY_ID",
    SearchCommentsByName => "SEARCH_COMMENTS_BY_NAME",
    SearchCommentsByEmail => "SEARCH_COMMENTS_BY_EMAIL",
    CreateComment => "CREATE_COMMENT",
    UpdateComment => "UPDATE_COMMENT",
    // external sales
    GetExternalSaleById => "GET_EXTERNAL_SALE_BY_ID",
    GetAllExternalSales => "GET_ALL_EXTERNAL_SALES",
    CreateExternalSale => "CREATE_EXTERNAL_SALE",
}

impl PermissionId {
    /// Code used when configuration does not override this permission.
    pub fn default_code(self) -> i32 {
        self as i32 + 1
    }

    /// Human-readable description derived from the symbolic name.
    pub fn description(self) -> String {
        let words = self.name().to_lowercase().replace('_', " ");
        let mut chars = words.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl core::fmt::Display for PermissionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for PermissionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("unknown permission '{0}'")]
    UnknownPermission(String),

    #[error("permission '{name}' has non-positive code {code}")]
    NonPositiveCode { name: String, code: i32 },

    #[error("code {code} is assigned to both '{first}' and '{second}'")]
    DuplicateCode {
        code: i32,
        first: &'static str,
        second: &'static str,
    },
}

/// Bijection between `PermissionId` and integer codes.
///
/// Immutable once built; shared behind an `Arc` by everything that checks
/// permissions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionRegistry {
    codes: Vec<i32>,
    by_code: HashMap<i32, PermissionId>,
}

impl PermissionRegistry {
    pub fn with_defaults() -> Self {
        let codes: Vec<i32> = PermissionId::ALL.iter().map(|p| p.default_code()).collect();
        let by_code = PermissionId::ALL.iter().map(|p| (p.default_code(), *p)).collect();
        Self { codes, by_code }
    }

    /// Build a registry from `NAME = code` overrides on top of the defaults.
    pub fn with_overrides<'a, I>(overrides: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (&'a str, i32)>,
    {
        let mut codes: Vec<i32> = PermissionId::ALL.iter().map(|p| p.default_code()).collect();
        for (name, code) in overrides {
            let id = PermissionId::from_name(name)
                .ok_or_else(|| RegistryError::UnknownPermission(name.to_string()))?;
            if code <= 0 {
                return Err(RegistryError::NonPositiveCode { name: name.to_string(), code });
            }
            codes[id as usize] = code;
        }

        let mut by_code: HashMap<i32, PermissionId> = HashMap::with_capacity(codes.len());
        for id in PermissionId::ALL {
            let code = codes[*id as usize];
            if let Some(existing) = by_code.insert(code, *id) {
                return Err(RegistryError::DuplicateCode {
                    code,
                    first: existing.name(),
                    second: id.name(),
                });
            }
        }

        Ok(Self { codes, by_code })
    }

    pub fn code(&self, id: PermissionId) -> i32 {
        self.codes[id as usize]
    }

    /// Resolve a code back to its permission. Unknown codes resolve to `None`.
    pub fn resolve(&self, code: i32) -> Option<PermissionId> {
        self.by_code.get(&code).copied()
    }

    pub fn by_name(&self, name: &str) -> Option<(PermissionId, i32)> {
        PermissionId::from_name(name).map(|id| (id, self.code(id)))
    }

    /// All `(permission, code)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (PermissionId, i32)> + '_ {
        PermissionId::ALL.iter().map(|id| (*id, self.code(*id)))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for PermissionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Persisted permission reference record (seeded from the registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(default)]
    pub id: EntityId,
    pub code: i32,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl Permission {
    pub fn from_registry(id: PermissionId, code: i32) -> Self {
        Self {
            id: EntityId::UNSET,
            code,
            name: id.name().to_string(),
            description: id.description(),
        }
    }
}

impl Entity for Permission {
    const KIND: &'static str = "permission";
    const SEARCH_FIELDS: &'static [&'static str] = &["id", "name"];

    fn id(&self) -> EntityId {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = id;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![
            UniqueKey::new("code", self.code.to_string()),
            UniqueKey::new("name", self.name.clone()),
        ]
    }

    fn validate(&self) -> DomainResult<()> {
        require_text("name", &self.name)
    }
}
