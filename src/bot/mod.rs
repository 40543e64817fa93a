// src/bot/mod.rs
pub mod commands;
pub mod cooldown;
pub mod presenter;

pub use commands::{
    parse_command, BotService, Button, ButtonAction, ChatKind, Command, Incoming, Reply,
};
pub use cooldown::CooldownGate;
