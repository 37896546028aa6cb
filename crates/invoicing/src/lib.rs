//! `totes-invoicing`: invoices, external sales, price adjustments, and the
//! billing calculator.
//!
//! Money is always integer minor units (cents).

pub mod adjustment;
pub mod billing;
pub mod external_sale;
pub mod invoice;
pub mod order_state_type;

pub use adjustment::{Adjustment, DiscountType, TaxType};
pub use billing::{BillingItem, BillingSummary, PricedLine, subtotal, summarize};
pub use external_sale::ExternalSale;
pub use invoice::{Invoice, InvoiceDraft};
pub use order_state_type::OrderStateType;
