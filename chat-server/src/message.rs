//! Text protocol shared by the connection handler and the registry.
//!
//! Everything on the wire is plain newline-delimited text so `nc` or `telnet`
//! work as clients. Builders here are pure; the only clock read happens in
//! [`timestamped`], which the registry calls at broadcast time.

use std::{fmt::Display, io};

use chrono::{DateTime, Local, TimeZone};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Sent once, immediately after accept. No trailing newline so the client's
/// cursor stays on the prompt line.
pub const NAME_PROMPT: &str = "Please enter your name: ";

/// Sent instead of a welcome when the requested name is taken.
pub const NAME_TAKEN: &str = "Chatter with that name already exists.\n";

/// Longest accepted line in bytes, terminator included. A client that sends
/// more without a newline loses its connection.
pub const MAX_LINE_LENGTH: usize = 64 * 1024;

// 12-hour clock without a leading zero, e.g. `3:04PM`.
const KITCHEN_FORMAT: &str = "%-I:%M%p";

pub fn welcome(name: &str, total: usize) -> String {
    if total > 1 {
        format!("Welcome {name}! There are {total} total people here. Happy chatting!\n")
    } else {
        format!("Welcome {name}! You are alone here. We hope that changes soon.\n")
    }
}

pub fn login(name: &str) -> String {
    format!("{name} has logged in!\n")
}

pub fn logout(name: &str) -> String {
    format!("{name} has logged out\n")
}

pub fn chat(name: &str, text: &str) -> String {
    format!("{name}: {text}\n")
}

/// Prefixes `payload` with the current local time.
pub fn timestamped(payload: &str) -> String {
    timestamped_at(&Local::now(), payload)
}

pub fn timestamped_at<Tz>(at: &DateTime<Tz>, payload: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("({}) {payload}", at.format(KITCHEN_FORMAT))
}

/// Reads the next line with its terminator stripped.
///
/// Returns `Ok(None)` on a clean EOF. A final unterminated line is still
/// returned. Only the `\n` and one `\r` before it are removed. Invalid UTF-8
/// is replaced rather than rejected so one stray byte does not cost a chatter
/// their session. Lines longer than [`MAX_LINE_LENGTH`] fail with
/// `InvalidData`.
pub async fn read_line<R>(reader: &mut R) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let bytes = (&mut *reader)
        .take(MAX_LINE_LENGTH as u64)
        .read_until(b'\n', &mut buf)
        .await?;
    if bytes == 0 {
        return Ok(None);
    }
    if bytes == MAX_LINE_LENGTH && buf.last() != Some(&b'\n') {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("line exceeds {MAX_LINE_LENGTH} bytes"),
        ));
    }

    let line = buf.strip_suffix(b"\n").unwrap_or(&buf);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    Ok(Some(String::from_utf8_lossy(line).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tokio::io::{AsyncWriteExt, BufReader};

    #[test]
    fn welcome_mentions_company_only_when_present() {
        assert_eq!(
            welcome("alice", 1),
            "Welcome alice! You are alone here. We hope that changes soon.\n"
        );
        assert_eq!(
            welcome("bob", 3),
            "Welcome bob! There are 3 total people here. Happy chatting!\n"
        );
    }

    #[test]
    fn announcements_and_chat_lines() {
        assert_eq!(login("bob"), "bob has logged in!\n");
        assert_eq!(logout("bob"), "bob has logged out\n");
        assert_eq!(chat("alice", "hello"), "alice: hello\n");
        assert_eq!(chat("alice", ""), "alice: \n");
    }

    #[test]
    fn timestamp_uses_kitchen_clock() {
        let afternoon = Utc.with_ymd_and_hms(2024, 5, 1, 15, 4, 0).unwrap();
        assert_eq!(
            timestamped_at(&afternoon, "bob has logged in!\n"),
            "(3:04PM) bob has logged in!\n"
        );

        let just_after_midnight = Utc.with_ymd_and_hms(2024, 5, 1, 0, 9, 0).unwrap();
        assert_eq!(timestamped_at(&just_after_midnight, "x"), "(12:09AM) x");

        let morning = Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap();
        assert_eq!(timestamped_at(&morning, "x"), "(10:30AM) x");
    }

    #[tokio::test]
    async fn read_line_strips_terminators_and_reports_eof() {
        let (mut writer, reader) = tokio::io::duplex(256);
        let mut reader = BufReader::new(reader);

        writer
            .write_all(b"alice\r\n\nhi\r\r\nlast")
            .await
            .unwrap();
        drop(writer);

        assert_eq!(read_line(&mut reader).await.unwrap().as_deref(), Some("alice"));
        assert_eq!(read_line(&mut reader).await.unwrap().as_deref(), Some(""));
        assert_eq!(read_line(&mut reader).await.unwrap().as_deref(), Some("hi\r"));
        assert_eq!(read_line(&mut reader).await.unwrap().as_deref(), Some("last"));
        assert_eq!(read_line(&mut reader).await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_line_tolerates_invalid_utf8() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut reader = BufReader::new(reader);

        writer.write_all(b"caf\xff\n").await.unwrap();
        drop(writer);

        let line = read_line(&mut reader).await.unwrap().unwrap();
        assert_eq!(line, "caf\u{fffd}");
    }

    #[tokio::test]
    async fn read_line_accepts_lines_up_to_the_limit() {
        let (mut writer, reader) = tokio::io::duplex(2 * MAX_LINE_LENGTH);
        let mut reader = BufReader::new(reader);

        let mut longest = vec![b'a'; MAX_LINE_LENGTH - 1];
        longest.push(b'\n');
        writer.write_all(&longest).await.unwrap();
        writer.write_all(b"next\n").await.unwrap();
        drop(writer);

        let line = read_line(&mut reader).await.unwrap().unwrap();
        assert_eq!(line.len(), MAX_LINE_LENGTH - 1);
        assert_eq!(read_line(&mut reader).await.unwrap().as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn read_line_rejects_oversized_lines() {
        let (mut writer, reader) = tokio::io::duplex(2 * MAX_LINE_LENGTH);
        let mut reader = BufReader::new(reader);

        let mut oversized = vec![b'a'; MAX_LINE_LENGTH + 16];
        oversized.push(b'\n');
        writer.write_all(&oversized).await.unwrap();

        let err = read_line(&mut reader).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
