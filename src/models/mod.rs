pub mod notification;
pub mod push;
pub mod token;

pub use notification::{CreateNotificationRequest, DispatchResult, Notification, SendNotificationRequest};
pub use push::{DeliveryHints, DeliveryOutcome, PushMessage, PushPriority};
pub use token::{RegisterTokenRequest, RegisterTokenResponse, TokenSet};
