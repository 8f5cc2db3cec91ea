use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::Path;

use crate::error::Error;

const READ_CHUNK: usize = 4096;

/// Buffers raw bytes and only decodes UTF-8 once a full line is available,
/// so a multi-byte character split across two reads never gets decoded
/// half-formed.
#[derive(Debug, Default)]
pub struct LineReassembler {
    buf: Vec<u8>,
}

impl LineReassembler {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Pops one complete line (without its trailing `\n`), if one is
    /// buffered. A trailing partial line is retained for the next push.
    pub fn pop_line(&mut self) -> Option<Result<String, Error>> {
        let newline_at = self.buf.iter().position(|&b| b == b'\n')?;
        let mut line: Vec<u8> = self.buf.drain(..=newline_at).collect();
        line.pop(); // drop the '\n'
        Some(String::from_utf8(line).map_err(|e| Error::Malformed(e.to_string())))
    }
}

/// A blocking, newline-delimited frame transport over a Unix-domain
/// stream socket. Frames never contain an embedded newline
/// because they are single-line JSON.
pub struct LineTransport {
    stream: UnixStream,
    reassembler: LineReassembler,
}

impl LineTransport {
    pub fn connect(path: &Path) -> Result<Self, Error> {
        let stream = UnixStream::connect(path)?;
        Ok(Self { stream, reassembler: LineReassembler::new() })
    }

    pub fn send(&mut self, frame: &str) -> Result<(), Error> {
        debug_assert!(!frame.contains('\n'), "a frame must not embed a newline");
        self.stream.write_all(frame.as_bytes())?;
        self.stream.write_all(b"\n")?;
        self.stream.flush()?;
        Ok(())
    }

    /// Blocks until one full line arrives, decoding it as a frame.
    pub fn receive(&mut self) -> Result<String, Error> {
        loop {
            if let Some(line) = self.reassembler.pop_line() {
                return line;
            }
            let mut buf = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut buf)?;
            if n == 0 {
                return Err(Error::Closed);
            }
            self.reassembler.push(&buf[..n]);
        }
    }

    pub fn close(&mut self) -> Result<(), Error> {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
        Ok(())
    }

    pub fn try_clone(&self) -> Result<UnixStream, Error> {
        Ok(self.stream.try_clone()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idempotent_under_arbitrary_chunking() {
        let original = b"hello\nworld\nthis is a longer frame\n".to_vec();
        for chunk_size in 1..=original.len() {
            let mut r = LineReassembler::new();
            let mut lines = Vec::new();
            for chunk in original.chunks(chunk_size) {
                r.push(chunk);
                while let Some(line) = r.pop_line() {
                    lines.push(line.unwrap());
                }
            }
            let reassembled = lines.join("\n") + "\n";
            assert_eq!(
                reassembled.as_bytes(),
                &original[..],
                "chunk_size={chunk_size} produced a different reassembly"
            );
        }
    }

    #[test]
    fn retains_partial_trailing_line() {
        let mut r = LineReassembler::new();
        r.push(b"abc\ndef");
        assert_eq!(r.pop_line().unwrap().unwrap(), "abc");
        assert!(r.pop_line().is_none());
        r.push(b"gh\n");
        assert_eq!(r.pop_line().unwrap().unwrap(), "defgh");
    }

    #[test]
    fn does_not_split_a_multibyte_character_across_pushes() {
        // U+00E9 'é' = 0xC3 0xA9 in UTF-8.
        let mut r = LineReassembler::new();
        r.push(&[b'a', 0xC3]);
        assert!(r.pop_line().is_none());
        r.push(&[0xA9, b'\n']);
        assert_eq!(r.pop_line().unwrap().unwrap(), "a\u{e9}");
    }
}
