pub mod aamp;
pub mod common;
pub mod schedule;
pub mod scraamp;
pub mod stimp;
pub mod stimped;
