//! # Voxtask Core Library
//!
//! Persistence layer for the voxtask voice assistant: users, categories and
//! tasks stored in SQLite, with database failures translated into a small
//! error taxonomy that the voice workflows can act on.
//!
//! ## Core Modules
//!
//! - [`db`]: Database connection and migration management
//! - [`models`]: Core data structures, filters and transfer objects
//! - [`repository`]: Data access layer with Repository pattern
//! - [`timezone`]: Local-day arithmetic and date formatting
//! - [`error`]: Error taxonomy and store error translation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use voxtask_core::{
//!     db,
//!     models::{NewTaskData, NewUserData, Priority},
//!     repository::{SqliteRepository, TaskRepository, UserRepository},
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = db::establish_connection("voxtask.db").await?;
//!     let repo = SqliteRepository::new(pool);
//!
//!     let user = repo
//!         .add_user(NewUserData { email: "ada@example.com".into(), display_name: None })
//!         .await?;
//!     let task = repo
//!         .add_task(NewTaskData {
//!             title: "Buy groceries".to_string(),
//!             priority: Some(Priority::High),
//!             user_id: user.id,
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("Created task: {}", task.title);
//!
//!     Ok(())
//! }
//! ```

pub mod db;
pub mod error;
pub mod models;
pub mod repository;
pub mod timezone;
