// HTTP routes owned by the bootstrap layer

pub mod health;
