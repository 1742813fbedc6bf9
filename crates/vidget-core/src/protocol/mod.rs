//! Agent wire protocol.
//!
//! Messages are JSON objects carried in native-messaging frames. Requests are
//! tagged by `action`; correlated requests additionally carry `_id`, which the
//! agent echoes on its reply.

mod frame;
mod request;
mod response;

pub use frame::{
    encode_frame, read_frame, read_message, write_message, FrameError, MAX_FRAME_BYTES,
};
pub use request::{
    correlation_id, stamp_correlation_id, AgentRequest, MediaFormat, Quality, CORRELATION_FIELD,
};
pub use response::{DownloadAck, PathReply, PingReply, ProgressReport, DEFAULT_FAILURE_REASON};
