pub mod counter;

pub use counter::{CounterStore, JsonFileStore, MemoryStore, MonthlyQuotaRecord};
