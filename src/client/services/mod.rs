pub mod chat_session;
pub mod http_api;
pub mod line_parser;
pub mod pending;
pub mod poll_channel;
pub mod push_channel;
pub mod roster;
pub mod sync_engine;
