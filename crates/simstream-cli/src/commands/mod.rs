pub mod decode;
pub mod watch;
