pub mod monthly;
pub mod token_bucket;

pub use monthly::{month_key, MonthlyCounter, QuotaDecision, QuotaStatus};
pub use token_bucket::{TokenBucket, TokenBucketState};
