mod subscriber_manager;

pub use subscriber_manager::{SubscriberDraft, SubscriberManager, UpdateSubscriberRequest};
