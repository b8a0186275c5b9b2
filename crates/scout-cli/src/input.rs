use std::io::{self, BufRead};

/// Read one URL per line, skipping blank lines and `#` comments.
pub fn read_urls<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
    let mut urls = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let url = line.trim();
        if url.is_empty() || url.starts_with('#') {
            continue;
        }
        urls.push(url.to_string());
    }
    Ok(urls)
}
