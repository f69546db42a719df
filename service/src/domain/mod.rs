//! Domain definitions.

pub mod agreement;
pub mod listing;
pub mod notification;
pub mod trust;
pub mod user;

pub use self::{
    agreement::Agreement, listing::Listing, notification::Notification,
    user::User,
};
