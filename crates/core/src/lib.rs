pub mod billing;
pub mod config;
pub mod domain;
pub mod errors;
pub mod pricing;

pub use billing::{allocate, AllocationOutcome, BillingService};
pub use domain::payment::{
    ClientBalance, PaymentAllocation, PaymentPreview, PaymentStatus, WorkBalance,
};
pub use domain::rule::{PricingRule, RuleId, RuleQuery};
pub use domain::snapshot::{
    BasePriceResult, NewPriceOverride, NewPriceSnapshot, PriceOverride, PriceResolution,
    PriceSnapshot, SnapshotId,
};
pub use domain::work::{
    BridgeTooth, BridgeToothRole, BridgeWork, ClientId, CrownWork, WorkFamily, WorkId,
    WorkPricingIdentity, WorkRecord, WorkType,
};
pub use errors::PricingError;
pub use pricing::{
    ClientBalanceSource, OverrideStore, PaymentLedgerSource, PricePreviewRequest,
    PricingRuleSource, PricingService, SnapshotInsert, SnapshotStore, WorkIdentitySource,
};
