//! `totes-parties`: the people and businesses the CRM tracks.

pub mod customer;
pub mod employee;
pub mod identifier_type;

pub use customer::Customer;
pub use employee::Employee;
pub use identifier_type::IdentifierType;
