//! RichHabitsOS order pipeline - stage classification and risk detection
//!
//! This library provides the core functionality behind `rhos`, including:
//! - The stage registry and the classifier that places orders on the board
//! - Risk detection (high priority, overdue, stale)
//! - Role-based stage visibility and detail-view section configuration
//! - A local SQLite snapshot store for imported orders
//! - Filter expression parsing and evaluation
//! - CLI command parsing and execution
//!
//! # Example
//!
//! ```no_run
//! use richhabits::models::{Order, OrderStatus};
//! use richhabits::pipeline::{get_order_stage, is_at_risk};
//!
//! let order = Order::new(1).with_status(OrderStatus::Production);
//! let stage = get_order_stage(&order).map(|s| s.label);
//! println!("{:?} at risk: {}", stage, is_at_risk(&order));
//! ```

pub mod config;
pub mod db;
pub mod models;
pub mod repo;
pub mod pipeline;
pub mod detail;
pub mod cli;
pub mod utils;
pub mod filter;
