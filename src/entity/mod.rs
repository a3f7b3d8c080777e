pub mod artist;

pub mod session;

pub mod song_preview;
