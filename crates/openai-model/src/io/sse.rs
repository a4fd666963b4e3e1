use super::{Chunks, ChunksError};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    Chunks(ChunksError),
    InvalidPayload,
}

/// Reads the `data` payloads of server-sent events from a chunk stream.
pub struct Sse {
    buf: String,
    // Bytes of a multi-byte character split across two chunks.
    tail: Vec<u8>,
    chunks: Chunks,
}

impl Sse {
    #[inline]
    pub fn new(chunks: Chunks) -> Self {
        Self {
            buf: String::new(),
            tail: Vec::new(),
            chunks,
        }
    }

    /// Returns the next data payload, or `None` at the end of the stream.
    ///
    /// Comment lines and events without data are skipped.
    pub async fn next_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            if let Some(data) = self.try_parse_event()? {
                return Ok(Some(data));
            }

            let Some(bytes) =
                self.chunks.next_chunk().await.map_err(Error::Chunks)?
            else {
                return Ok(None);
            };
            self.push_bytes(&bytes)?;
        }
    }

    fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.tail.extend_from_slice(bytes);
        let valid_up_to = match str::from_utf8(&self.tail) {
            Ok(s) => s.len(),
            Err(err) if err.error_len().is_none() => err.valid_up_to(),
            Err(_) => return Err(Error::InvalidPayload),
        };
        let rest = self.tail.split_off(valid_up_to);
        let text = String::from_utf8(std::mem::replace(&mut self.tail, rest))
            .map_err(|_| Error::InvalidPayload)?;
        self.buf.push_str(&text.replace('\r', ""));
        Ok(())
    }

    fn try_parse_event(&mut self) -> Result<Option<String>, Error> {
        loop {
            let Some(end) = self.buf.find("\n\n") else {
                return Ok(None);
            };
            let block: String = self.buf.drain(..end + 2).collect();

            let mut data: Option<String> = None;
            for line in block.lines() {
                if line.is_empty() || line.starts_with(':') {
                    continue;
                }
                let (field, value) = match line.split_once(':') {
                    Some((field, value)) => {
                        (field, value.strip_prefix(' ').unwrap_or(value))
                    }
                    None => (line, ""),
                };
                match field {
                    "data" => {
                        let data = data.get_or_insert_default();
                        if !data.is_empty() {
                            data.push('\n');
                        }
                        data.push_str(value);
                    }
                    "event" | "id" | "retry" => {}
                    _ => return Err(Error::InvalidPayload),
                }
            }

            if let Some(data) = data {
                return Ok(Some(data));
            }
        }
    }
}
