use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use scout_core::error::ScrapeError;

/// How far into the document to look for a `<meta charset>` declaration.
const META_PRESCAN_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding: &'static str,
}

/// Decode raw bytes into UTF-8 using: BOM -> Content-Type charset -> meta charset -> chardetng fallback.
///
/// A charset named in the header that `encoding_rs` does not know is an
/// error; malformed byte sequences are replaced with U+FFFD.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedHtml, ScrapeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return Ok(decode_with(bytes, encoding));
    }

    if let Some(label) = content_type.and_then(header_charset) {
        let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| {
            ScrapeError::Decode(format!("unsupported charset '{label}' in Content-Type"))
        })?;
        return Ok(decode_with(bytes, encoding));
    }

    if let Some(encoding) =
        meta_charset(bytes).and_then(|label| Encoding::for_label(label.as_bytes()))
    {
        return Ok(decode_with(bytes, encoding));
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    Ok(decode_with(bytes, detector.guess(None, true)))
}

fn header_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| part.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
        .map(|(_, value)| value.trim().trim_matches(['"', '\'']).to_string())
        .filter(|label| !label.is_empty())
}

fn meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_LEN)];
    let text = String::from_utf8_lossy(head).to_ascii_lowercase();

    let mut rest = text.as_str();
    while let Some(start) = rest.find("<meta") {
        let tag = &rest[start..];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];
        if let Some(pos) = tag.find("charset=") {
            let label: String = tag[pos + "charset=".len()..]
                .trim_start_matches(['"', '\'', ' '])
                .chars()
                .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':'))
                .collect();
            if !label.is_empty() {
                return Some(label);
            }
        }
        rest = &rest[start + "<meta".len()..];
    }
    None
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> DecodedHtml {
    let (text, actual, _) = encoding.decode(bytes);
    DecodedHtml {
        html: text.into_owned(),
        encoding: actual.name(),
    }
}
