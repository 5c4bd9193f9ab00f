//! Content-type classification and document metadata extraction.
//!
//! When a URL turns out to be a document rather than a page, the preview
//! comes from file metadata instead of DOM heuristics: `pdfinfo` for PDFs,
//! the OOXML core-properties part for word-processor files. Bodies are
//! persisted to the process temp directory under the URL basename, read,
//! and deleted within the one call.

use std::{
    io::{Read, Seek},
    path::Path,
};

use {
    quick_xml::{Reader, events::Event},
    tokio::process::Command,
    tracing::debug,
};

use {
    crate::error::{Context, ExtractError},
    unfurl_format::strip_newlines,
};

pub const OOXML_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

fn normalized(content_type: &str) -> String {
    content_type.trim().to_ascii_lowercase()
}

/// Prefix match so charset parameters do not defeat classification.
pub fn is_pdf(content_type: &str) -> bool {
    normalized(content_type).starts_with("application/pdf")
}

pub fn is_office_document(content_type: &str) -> bool {
    let ct = normalized(content_type);
    ct.starts_with(OOXML_DOCUMENT) || ct.starts_with("application/msword")
}

/// Final path segment of a URL, query string and all.
pub fn url_basename(url: &str) -> &str {
    url.rsplit('/').next().unwrap_or(url)
}

/// Preview message for a PDF body: `pdfinfo`'s Title line, or the basename.
pub async fn describe_pdf(body: &[u8], basename: &str) -> Result<String, ExtractError> {
    let path = std::env::temp_dir().join(basename);
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("write {}", path.display()))?;

    let title = pdf_title(&path).await;
    let _ = tokio::fs::remove_file(&path).await;

    let title = match title {
        Some(t) => strip_newlines(&t),
        None => basename.to_string(),
    };
    Ok(format!("[ {title} ]"))
}

async fn pdf_title(path: &Path) -> Option<String> {
    let output = match Command::new("pdfinfo").arg(path).output().await {
        Ok(output) => output,
        Err(error) => {
            debug!(%error, "pdfinfo not runnable");
            return None;
        },
    };
    if !output.status.success() {
        return None;
    }
    title_from_pdfinfo(&String::from_utf8_lossy(&output.stdout))
}

/// Pull the Title value out of `pdfinfo` output.
pub fn title_from_pdfinfo(output: &str) -> Option<String> {
    output
        .lines()
        .find_map(|line| line.strip_prefix("Title:"))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Preview message for an OOXML word-processing body: the core properties.
pub async fn describe_office(body: &[u8], basename: &str) -> Result<String, ExtractError> {
    let path = std::env::temp_dir().join(basename);
    tokio::fs::write(&path, body)
        .await
        .with_context(|| format!("write {}", path.display()))?;

    let result = read_core_properties_at(&path);
    let _ = tokio::fs::remove_file(&path).await;

    let props = result?;
    Ok(office_summary(&props, basename))
}

fn read_core_properties_at(path: &Path) -> Result<CoreProperties, ExtractError> {
    let file = std::fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    read_core_properties(file)
}

/// Dublin Core subset stored in `docProps/core.xml`. Timestamps are kept as
/// written and formatted at render time.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CoreProperties {
    pub title: String,
    pub creator: String,
    pub created: String,
    pub modified: String,
    pub last_modified_by: String,
}

/// Open an OOXML package and read its core properties.
pub fn read_core_properties<R: Read + Seek>(reader: R) -> Result<CoreProperties, ExtractError> {
    let mut archive = zip::ZipArchive::new(reader).context("open package")?;
    let mut entry = archive
        .by_name("docProps/core.xml")
        .context("docProps/core.xml")?;
    let mut xml = String::new();
    entry
        .read_to_string(&mut xml)
        .context("read docProps/core.xml")?;
    parse_core_properties(&xml)
}

#[derive(Clone, Copy)]
enum Field {
    Title,
    Creator,
    Created,
    Modified,
    LastModifiedBy,
}

pub fn parse_core_properties(xml: &str) -> Result<CoreProperties, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut props = CoreProperties::default();
    let mut current: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                current = match e.name().as_ref() {
                    b"dc:title" => Some(Field::Title),
                    b"dc:creator" => Some(Field::Creator),
                    b"dcterms:created" => Some(Field::Created),
                    b"dcterms:modified" => Some(Field::Modified),
                    b"cp:lastModifiedBy" => Some(Field::LastModifiedBy),
                    _ => None,
                };
            },
            Ok(Event::Text(t)) => {
                if let Some(field) = current {
                    let text = t.unescape().context("core.xml text")?.trim().to_string();
                    match field {
                        Field::Title => props.title = text,
                        Field::Creator => props.creator = text,
                        Field::Created => props.created = text,
                        Field::Modified => props.modified = text,
                        Field::LastModifiedBy => props.last_modified_by = text,
                    }
                }
            },
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(e) => return Err(e).context("parse core.xml"),
            Ok(_) => {},
        }
    }

    Ok(props)
}

/// Render the office-document preview line.
pub fn office_summary(props: &CoreProperties, basename: &str) -> String {
    let title = if props.title.is_empty() {
        basename.to_string()
    } else {
        strip_newlines(&props.title)
    };
    format!(
        "[ Title: {title} ] [ Author: {author} ] [ Created: {created} ] \
         [ Last Modified: {modified} ] [ Last Modified By: {by} ]",
        author = props.creator,
        created = format_timestamp(&props.created),
        modified = format_timestamp(&props.modified),
        by = props.last_modified_by,
    )
}

/// W3CDTF timestamp to `YYYY-MM-DD HH:MM:SS`; anything unparseable passes
/// through unchanged.
fn format_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}
