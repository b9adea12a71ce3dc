//! Binary frame protocol: the 8-byte header, frame I/O and the connect
//! banner.

mod frame;
mod wire;

pub use frame::{build_frame, read_banner, read_frame, write_frame, Frame};
pub use wire::{
    is_callback_handle, Header, DEFAULT_MAX_BODY_SIZE, FIRST_CALL_HANDLE, HEADER_SIZE,
    MAX_BANNER_SIZE, PROTOCOL_NAME, RESPONSE_BIT,
};
