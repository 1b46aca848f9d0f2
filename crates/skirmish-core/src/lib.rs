//! Shared data model and wire protocol for the Skirmish arena server.
//!
//! Everything here is plain data: the entity and pickup views that are
//! broadcast to clients, and the binary codec for the events exchanged over
//! the WebSocket gateway.

pub mod entity;
pub mod net;
pub mod pickup;
