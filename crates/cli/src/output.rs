use ragdb_vector_store::{Document, DocumentEntry, Metadata, SearchHit, StoreStats};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Serialize)]
pub(crate) struct IdOutput {
    pub id: String,
    pub status: &'static str,
}

#[derive(Serialize)]
pub(crate) struct GetOutput {
    pub id: String,
    #[serde(flatten)]
    pub document: Document,
}

#[derive(Serialize)]
pub(crate) struct ListOutput {
    pub total: usize,
    pub skip: usize,
    pub limit: usize,
    pub documents: Vec<DocumentEntry>,
}

#[derive(Serialize)]
pub(crate) struct SearchOutput {
    pub query: String,
    pub k: usize,
    pub hits: Vec<SearchHit>,
}

#[derive(Serialize)]
pub(crate) struct StatsOutput {
    pub snapshot: PathBuf,
    #[serde(flatten)]
    pub stats: StoreStats,
}

pub(crate) fn format_metadata(metadata: &Metadata) -> String {
    metadata
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

/// First `max_chars` characters of `text`, on one line.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push_str("...");
    cut
}

pub(crate) fn print_hits(hits: &[SearchHit]) {
    if hits.is_empty() {
        println!("No results");
        return;
    }
    for (i, hit) in hits.iter().enumerate() {
        println!(
            "{}. {} (relevance: {:.3}, distance: {:.4})",
            i + 1,
            hit.id,
            hit.relevance,
            hit.distance
        );
        if !hit.metadata.is_empty() {
            println!("   {}", format_metadata(&hit.metadata));
        }
        println!("   {}", preview(&hit.text, 160));
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_flattens_and_truncates() {
        assert_eq!(preview("a\n  b", 10), "a b");
        assert_eq!(preview("abcdefgh", 3), "abc...");
        assert_eq!(preview("ภาษาไทย", 4), "ภาษา...");
    }
}
