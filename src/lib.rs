//! Session-scoped song previews: request-scoped caching, batch hydration and
//! reaping of previews whose session has expired.

pub mod api;

pub mod artist;

pub mod cache;

pub mod config;

pub mod entity;

pub mod migration;

pub mod options;

pub mod playable;

pub mod preview;

pub mod reaper;

pub mod store;
