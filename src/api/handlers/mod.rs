//! API handlers for the lab tasks portal.
//!
//! `auth` owns the token lifecycle (login, register, refresh, logout, me);
//! `labs` owns the topics/tasks surface behind the access-token gate.

pub mod auth;
pub mod health;
pub mod labs;
pub mod root;
