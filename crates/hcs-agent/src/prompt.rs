//! Multi-line prompt input.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Reads one prompt from `reader`.
///
/// A prompt is a run of lines closed by an empty line. The lines are
/// joined with `\n`. An empty line on its own yields an empty prompt.
///
/// Returns `None` once the input is exhausted. When the input ends in the
/// middle of a prompt, the lines read so far are returned first.
pub async fn read_prompt<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines: Vec<String> = vec![];
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            if lines.is_empty() {
                return Ok(None);
            }
            break;
        }

        let line = line.trim_end_matches(['\n', '\r']);
        if line.is_empty() {
            break;
        }
        lines.push(line.to_owned());
    }
    Ok(Some(lines.join("\n")))
}
