// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Execution drivers for compiled vexpr programs.
//!
//! [`ExprFilter`] produces pixel data plane by plane; [`SingleExprFilter`]
//! produces frame properties. Both compile through a shared
//! [`ProgramCache`](vexpr_compiler::ProgramCache) at construction and are
//! immutable afterwards, so one filter can serve frame requests from many
//! threads.

pub mod error;
pub mod expr;
pub mod single;

pub use error::DriverError;
pub use expr::ExprFilter;
pub use single::SingleExprFilter;
