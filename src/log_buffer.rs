//! On-screen diagnostic buffer
//!
//! Keeps the most recent boot log lines so the host can show them while no
//! page has loaded yet.

use std::collections::VecDeque;

/// Lines kept for on-screen display
pub const LOG_BUFFER_CAPACITY: usize = 15;

/// Bounded ring of log lines, oldest evicted first
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    capacity: usize,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::with_capacity(LOG_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// HTML fragment for the host's message element
    pub fn render_html(&self) -> String {
        let body = self
            .lines
            .iter()
            .map(|l| escape_html(l))
            .collect::<Vec<_>>()
            .join("<br/>");
        format!("<div>{}</div>", body)
    }
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new()
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_evicts_oldest() {
        let mut buffer = LogBuffer::new();
        for i in 0..20 {
            buffer.push(format!("line {}", i));
            assert!(buffer.len() <= LOG_BUFFER_CAPACITY);
        }
        assert_eq!(buffer.len(), 15);
        let lines: Vec<&str> = buffer.lines().collect();
        assert_eq!(lines.first(), Some(&"line 5"));
        assert_eq!(lines.last(), Some(&"line 19"));
    }

    #[test]
    fn test_render_html() {
        let mut buffer = LogBuffer::new();
        assert_eq!(buffer.render_html(), "<div></div>");
        buffer.push("Booting...");
        buffer.push("Copying <assets> & co");
        assert_eq!(
            buffer.render_html(),
            "<div>Booting...<br/>Copying &lt;assets&gt; &amp; co</div>"
        );
    }
}
