//! `totes-inventory`: sellable items, their types, and attached expenses.

pub mod additional_expense;
pub mod item;
pub mod item_type;

pub use additional_expense::AdditionalExpense;
pub use item::Item;
pub use item_type::ItemType;
