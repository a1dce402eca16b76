//! Minimal XML emission for the test report writer.
//!
//! Emits the small fixed tree the report needs: nested elements with
//! attributes and text, pretty-printed with two-space indentation, empty
//! elements self-closed. Attribute values escape `&`, `<`, `>`, and `"`;
//! text escapes `&`, `<`, and `>`.

use std::io::{self, Write};

pub struct XmlWriter<W: Write> {
    out: W,
    stack: Vec<&'static str>,
    open_tag_pending: bool,
    has_children: bool,
}

impl<W: Write> XmlWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            stack: Vec::new(),
            open_tag_pending: false,
            has_children: false,
        }
    }

    /// Write the XML declaration.
    pub fn declaration(&mut self) -> io::Result<()> {
        writeln!(self.out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)
    }

    /// Open a child element.
    pub fn open_element(&mut self, name: &'static str) -> io::Result<()> {
        self.seal_open_tag(true)?;
        write!(self.out, "{}<{name}", indent(self.stack.len()))?;
        self.stack.push(name);
        self.open_tag_pending = true;
        self.has_children = false;
        Ok(())
    }

    /// Add an attribute to the most recently opened element.
    pub fn attribute(&mut self, name: &str, value: &str) -> io::Result<()> {
        debug_assert!(self.open_tag_pending, "attribute outside an open tag");
        write!(self.out, " {name}=\"")?;
        self.write_escaped(value, true)?;
        write!(self.out, "\"")
    }

    /// Write text content inside the current element.
    pub fn text(&mut self, text: &str) -> io::Result<()> {
        self.seal_open_tag(false)?;
        self.write_escaped(text, false)
    }

    /// Close the current element.
    pub fn close_element(&mut self) -> io::Result<()> {
        let name = self.stack.pop().expect("close without open");
        if self.open_tag_pending {
            self.open_tag_pending = false;
            self.has_children = true;
            writeln!(self.out, "/>")
        } else {
            if self.has_children {
                write!(self.out, "{}", indent(self.stack.len()))?;
            }
            self.has_children = true;
            writeln!(self.out, "</{name}>")
        }
    }

    /// Flush and return the underlying writer.
    pub fn finish(mut self) -> io::Result<W> {
        debug_assert!(self.stack.is_empty(), "unclosed elements");
        self.out.flush()?;
        Ok(self.out)
    }

    /// Terminate a pending `<name attr="..."` before new content appears.
    ///
    /// `newline` distinguishes child elements (own line) from inline text.
    fn seal_open_tag(&mut self, newline: bool) -> io::Result<()> {
        if self.open_tag_pending {
            self.open_tag_pending = false;
            self.has_children = newline;
            if newline {
                writeln!(self.out, ">")?;
            } else {
                write!(self.out, ">")?;
            }
        }
        Ok(())
    }

    fn write_escaped(&mut self, value: &str, attribute: bool) -> io::Result<()> {
        for ch in value.chars() {
            match ch {
                '&' => write!(self.out, "&amp;")?,
                '<' => write!(self.out, "&lt;")?,
                '>' => write!(self.out, "&gt;")?,
                '"' if attribute => write!(self.out, "&quot;")?,
                _ => write!(self.out, "{ch}")?,
            }
        }
        Ok(())
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(build: impl FnOnce(&mut XmlWriter<Vec<u8>>) -> io::Result<()>) -> String {
        let mut writer = XmlWriter::new(Vec::new());
        build(&mut writer).expect("write xml");
        String::from_utf8(writer.finish().expect("finish")).expect("utf-8")
    }

    #[test]
    fn test_empty_element_self_closes() {
        let xml = render(|w| {
            w.open_element("testcase")?;
            w.attribute("name", "ok")?;
            w.close_element()
        });
        assert_eq!(xml, "<testcase name=\"ok\"/>\n");
    }

    #[test]
    fn test_nested_elements_indent() {
        let xml = render(|w| {
            w.open_element("testsuites")?;
            w.open_element("testsuite")?;
            w.open_element("testcase")?;
            w.close_element()?;
            w.close_element()?;
            w.close_element()
        });
        assert_eq!(
            xml,
            "<testsuites>\n  <testsuite>\n    <testcase/>\n  </testsuite>\n</testsuites>\n"
        );
    }

    #[test]
    fn test_text_stays_inline() {
        let xml = render(|w| {
            w.open_element("failure")?;
            w.attribute("type", "FAILED")?;
            w.text("expected 1, got 2")?;
            w.close_element()
        });
        assert_eq!(xml, "<failure type=\"FAILED\">expected 1, got 2</failure>\n");
    }

    #[test]
    fn test_escaping() {
        let xml = render(|w| {
            w.open_element("error")?;
            w.attribute("type", "\"<&>\"")?;
            w.text("a < b && c > d")?;
            w.close_element()
        });
        assert_eq!(
            xml,
            "<error type=\"&quot;&lt;&amp;&gt;&quot;\">a &lt; b &amp;&amp; c &gt; d</error>\n"
        );
    }
}
