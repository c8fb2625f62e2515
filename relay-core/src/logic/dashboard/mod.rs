//! Dashboard Module - section router and per-session state
//!
//! ```text
//!            ChangeSection(s)
//!   [Overall] ───────────────► [s] ──Submit(record)──► [s + outcome]
//!       ▲                                                   │
//!       └──────────── unknown choice falls back ◄───────────┘
//! ```

pub mod accumulator;
pub mod section;
pub mod state;

pub use accumulator::{AccumulatorStatus, SessionAccumulator, WrongSchema};
pub use section::Section;
pub use state::{DashboardState, DashboardView, SessionContext, Transition, ViewSummary};
