pub mod error;
pub mod identity;
pub mod normalize;
pub mod readable;
pub mod store;

pub use error::StoreError;
pub use identity::{EnvIdentity, IdentityResolver};
pub use normalize::normalize_text;
pub use readable::{ReadableReportWriter, SummaryBounds};
pub use store::ReportStore;
