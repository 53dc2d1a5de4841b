//! Line-oriented frame transport.
//!
//! The reader accumulates lines between the start and end markers; lines
//! arriving outside a marker pair are ignored. End-of-stream is a normal
//! disconnect, reported as `Ok(None)` rather than an error.

use std::io::{self, BufRead, Write};

use crate::protocol::{self, Message, MSG_END, MSG_START};

/// Write one framed message to the stream and flush it.
pub fn write_frame<W: Write>(writer: &mut W, msg: &Message) -> io::Result<()> {
    writer.write_all(protocol::encode(msg).as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()
}

/// Read lines until a complete frame has been accumulated, returning the
/// frame with its markers still attached. `Ok(None)` means the peer
/// closed the stream.
pub fn read_frame<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut frame = String::new();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let line = line.trim_end();

        // Start collecting only on a start marker.
        if frame.is_empty() && line != MSG_START {
            continue;
        }
        frame.push_str(line);

        if line == MSG_END {
            return Ok(Some(frame));
        }
    }
}
