pub mod logging;
pub mod rate_gate;
pub mod retry;
