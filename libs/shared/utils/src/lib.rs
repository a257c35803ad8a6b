pub mod clock;
pub mod extractor;
pub mod jwt;
pub mod principal;
pub mod test_utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use extractor::auth_middleware;
pub use principal::resolve_principal;
