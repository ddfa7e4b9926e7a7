// HedgeBot - Discord moderation and utility bot
// Library exports

pub mod analysis;
pub mod bot;
pub mod config;
pub mod logging;
pub mod members;
pub mod moderation;
pub mod openai;
pub mod reminders;
pub mod rolemenus;
pub mod storage;
