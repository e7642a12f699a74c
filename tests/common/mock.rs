#![allow(unused)]

use spin::Mutex;
use std::{io, sync::Arc};
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log output in memory.
#[derive(Debug, Clone)]
pub struct MakeMockWriter {
    buf: Arc<Mutex<String>>,
}

#[derive(Debug, Clone)]
pub struct MockWriter {
    buf: Arc<Mutex<String>>,
}

impl io::Write for MockWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.lock().push_str(&String::from_utf8_lossy(bytes));
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl MakeMockWriter {
    pub fn new() -> Self {
        MakeMockWriter {
            buf: Arc::new(Mutex::new(String::new())),
        }
    }

    pub fn content(&self) -> String {
        self.buf.lock().clone()
    }

    pub fn lines(&self) -> Vec<String> {
        self.content().lines().map(str::to_string).collect()
    }
}

impl<'a> MakeWriter<'a> for MakeMockWriter {
    type Writer = MockWriter;
    fn make_writer(&'a self) -> Self::Writer {
        MockWriter {
            buf: self.buf.clone(),
        }
    }
}
