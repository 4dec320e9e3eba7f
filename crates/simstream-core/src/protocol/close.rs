//! WebSocket close-code classification (RFC 6455 section 7.4.1)

/// Normal closure
pub const CLOSE_NORMAL: u16 = 1000;
/// Endpoint going away (page navigation, server shutdown)
pub const CLOSE_GOING_AWAY: u16 = 1001;
/// No status code was present in the close frame
pub const CLOSE_NO_STATUS: u16 = 1005;
/// Connection dropped without a close frame
pub const CLOSE_ABNORMAL: u16 = 1006;

const ABNORMAL_RANGE: std::ops::RangeInclusive<u16> = 1002..=1015;

/// Whether a close should be surfaced to the user as a failure.
///
/// `quitting` is set when the client itself asked to leave, which turns a
/// going-away close into a normal one.
pub fn is_abnormal(code: u16, quitting: bool) -> bool {
    ABNORMAL_RANGE.contains(&code) || (code == CLOSE_GOING_AWAY && !quitting)
}
