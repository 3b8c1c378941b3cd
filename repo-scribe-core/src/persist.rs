//! Persistence sink writing the final document to disk.

use std::fs;
use std::path::Path;

use pulldown_cmark::{html, Options, Parser};
use tracing::{debug, info};

use crate::contract::{DocumentSink, ServiceError};

/// True when `destination` has an `html` or `htm` extension, in any case.
pub fn is_html_destination(destination: &Path) -> bool {
    destination
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

pub fn markdown_to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FileSink;

impl DocumentSink for FileSink {
    fn persist(&self, content: &str, destination: &Path) -> Result<(), ServiceError> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        if is_html_destination(destination) {
            debug!(path = %destination.display(), "Converting markdown to HTML");
            fs::write(destination, markdown_to_html(content))?;
        } else {
            fs::write(destination, content)?;
        }
        info!(path = %destination.display(), "[PERSIST] Documentation written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn html_extension_check_is_case_insensitive() {
        assert!(is_html_destination(Path::new("out/docs.HTML")));
        assert!(is_html_destination(Path::new("docs.htm")));
        assert!(!is_html_destination(Path::new("docs.md")));
        assert!(!is_html_destination(Path::new("html")));
    }

    #[test]
    fn markdown_is_written_verbatim() {
        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("documentation.md");
        FileSink.persist("# Title\n\nbody\n", &dest).unwrap();
        assert_eq!(fs::read_to_string(dest).unwrap(), "# Title\n\nbody\n");
    }

    #[test]
    fn html_destination_is_converted_and_parents_created() {
        let tmp = tempdir().unwrap();
        let dest = tmp.path().join("nested/dir/docs.html");
        FileSink.persist("# Title\n\n| a | b |\n|---|---|\n| 1 | 2 |\n", &dest).unwrap();
        let html = fs::read_to_string(dest).unwrap();
        assert!(html.contains("<h1>Title</h1>"), "got: {html}");
        assert!(html.contains("<table>"), "got: {html}");
    }
}
