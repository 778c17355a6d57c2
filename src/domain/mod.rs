//! Domain module for task management.
//!
//! This module contains the task and user models and their value objects.

pub mod task;
pub mod user;

pub use task::{
    DueDate, InvalidDueDate, InvalidTaskId, Task, TaskDocument, TaskId, TaskPatch,
};
pub use user::{PasswordDigest, User, UserId};
