pub mod calculator;
pub mod matcher;
pub mod service;
pub mod sources;

pub use service::{PricePreviewRequest, PricingService};
pub use sources::{
    ClientBalanceSource, OverrideStore, PaymentLedgerSource, PricingRuleSource, SnapshotInsert,
    SnapshotStore, WorkIdentitySource,
};
