use super::Channel;
use crate::error::Result;
use std::collections::VecDeque;

/// Scripted channel: each read pops the next reply, an exhausted script
/// behaves like a read timeout.
#[derive(Default)]
pub struct FakeChannel {
    replies: VecDeque<Result<Vec<u8>>>,
    writes: Vec<String>,
    reads: usize,
    close_calls: usize,
    closed: bool,
}

impl FakeChannel {
    pub fn new(replies: Vec<Result<Vec<u8>>>) -> Self {
        Self {
            replies: replies.into(),
            ..Self::default()
        }
    }

    pub fn replying(line: &str) -> Self {
        Self::new(vec![Ok(line.as_bytes().to_vec())])
    }

    pub fn silent() -> Self {
        Self::new(Vec::new())
    }

    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    pub fn reads(&self) -> usize {
        self.reads
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls
    }
}

impl Channel for FakeChannel {
    fn write_command(&mut self, command: &str) -> Result<()> {
        self.writes.push(command.to_string());
        Ok(())
    }

    fn read_line(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        self.reads += 1;
        match self.replies.pop_front() {
            Some(Ok(bytes)) => {
                buf.extend_from_slice(&bytes);
                Ok(bytes.len())
            }
            Some(Err(err)) => Err(err),
            None => Ok(0),
        }
    }

    fn close(&mut self) {
        self.close_calls += 1;
        self.closed = true;
    }

    fn is_open(&self) -> bool {
        !self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn scripts_reads_and_records_writes() {
        let mut fake = FakeChannel::new(vec![
            Ok(b"first\n".to_vec()),
            Err(Error::MalformedResponse("boom".into())),
        ]);
        let mut buf = Vec::new();
        assert_eq!(fake.read_line(&mut buf).unwrap(), 6);
        assert_eq!(buf, b"first\n");
        assert!(fake.read_line(&mut buf).is_err());
        assert_eq!(fake.read_line(&mut buf).unwrap(), 0);
        fake.write_command("PING").unwrap();
        assert_eq!(fake.writes(), &["PING".to_string()]);
        assert_eq!(fake.reads(), 3);
    }

    #[test]
    fn close_is_tracked() {
        let mut fake = FakeChannel::silent();
        assert!(fake.is_open());
        fake.close();
        fake.close();
        assert!(!fake.is_open());
        assert_eq!(fake.close_calls(), 2);
    }
}
