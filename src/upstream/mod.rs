mod classify;
mod errors;

pub use classify::{classify, Classification, TransportOutcome};
pub use errors::{
    internal_error, normalize_error, unreachable_error, ErrorMappingEntry, NormalizedError,
    ERROR_MAP,
};
