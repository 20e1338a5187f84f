//! # zapbot-channels
//!
//! WhatsApp transports for zapbot: the Meta Cloud API and a generic
//! WhatsApp-Web bridge relay.

pub mod bridge;
pub mod cloud;
pub mod utils;

pub use bridge::{BridgeChannel, BridgeEvent};
pub use cloud::{CloudChannel, WebhookPayload};
