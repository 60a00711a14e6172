// SPDX-License-Identifier: MIT

pub mod activity;
pub mod directory;
pub mod export;
pub mod lifecycle;
pub mod notify;
pub mod permissions;

pub use activity::ActivityService;
pub use directory::Directory;
pub use lifecycle::LifecycleService;
pub use notify::{Mailer, Notice};
