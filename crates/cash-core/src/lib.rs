//! # cash-core
//!
//! Daily crypto money workflow: scan the market, check the portfolio, hunt
//! for trading bots, then turn the findings into a Markdown playbook and an
//! append-only log of money moves.
//!
//! ## Principles
//!
//! - **Partial data beats no data** - a failing feed, exchange or wallet
//!   becomes a warning in the report, never an aborted run
//! - **Cross-checked signals** - a coin is only an opportunity when at least
//!   two independent sources mention it
//! - **Decimal money** - balances, prices and totals never touch f64
//! - **Append-only history** - past runs are never rewritten
//!
//! ## One Run
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ Market scan  │   │ Portfolio    │   │ Bot hunt     │
//! │ 4 sources ∥  │   │ exchanges    │   │ topics       │
//! │ aggregate    │   │ wallets      │   │ score, rank  │
//! └──────┬───────┘   │ manual       │   └──────┬───────┘
//!        │           └──────┬───────┘          │
//!        └──────────────────┼──────────────────┘
//!                           ▼
//!                 ┌───────────────────┐
//!                 │ Playbook composer │ ──▶ playbook_<ts>.md
//!                 └─────────┬─────────┘
//!                           ▼
//!                 ┌───────────────────┐     portfolio_history.json
//!                 │ Money logger      │ ──▶ money_moves.md
//!                 └───────────────────┘     lessons_learned.md
//! ```
//!
//! Between runs, [`KnowledgeBase`] folds the newest snapshots into
//! `KNOWLEDGE_BASE.md`.

pub mod bots;
pub mod config;
pub mod error;
pub mod exchange;
pub mod ledger;
pub mod market;
pub mod model;
pub mod playbook;
pub mod portfolio;
pub mod signals;

pub use bots::{BotHunt, BotHunter};
pub use config::{AppConfig, OutputPaths, WorkflowContext};
pub use error::{CashError, Result};
pub use ledger::{KnowledgeBase, MoneyLogger};
pub use market::{MarketScan, MarketScanner};
pub use model::{Holding, Opportunity, RiskFlag, SignalItem, Warning};
pub use playbook::{compose, PlaybookReport};
pub use portfolio::{PortfolioEvaluator, PortfolioReport};
