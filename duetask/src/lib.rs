//! `DueTask`: a conversational task tracker shared by two identities.

pub mod bot;
pub mod clock;
pub mod conversation;
pub mod gateway;
pub mod reminder;
pub mod session;
pub mod tasks;
