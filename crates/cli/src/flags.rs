use clap::ValueEnum;
use ragdb_vector_store::{EmbeddingMode, Metadata, MetadataValue};

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum EmbedMode {
    Stub,
    Http,
}

impl EmbedMode {
    pub(crate) const fn as_domain(self) -> EmbeddingMode {
        match self {
            EmbedMode::Stub => EmbeddingMode::Stub,
            EmbedMode::Http => EmbeddingMode::Http,
        }
    }
}

/// Parse one `--meta key=value` pair. Values are typed: bool, integer, float, else text.
pub(crate) fn parse_meta(raw: &str) -> Result<(String, MetadataValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty metadata key in '{raw}'"));
    }
    Ok((key.to_string(), MetadataValue::parse(value)))
}

pub(crate) fn collect_meta(pairs: Vec<(String, MetadataValue)>) -> Metadata {
    pairs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_pairs_are_typed() {
        assert_eq!(
            parse_meta("page=3").unwrap(),
            ("page".to_string(), MetadataValue::Integer(3))
        );
        assert_eq!(
            parse_meta("source=a=b.txt").unwrap(),
            ("source".to_string(), MetadataValue::from("a=b.txt"))
        );
        assert!(parse_meta("novalue").is_err());
        assert!(parse_meta("=x").is_err());
    }

    #[test]
    fn later_keys_win() {
        let meta = collect_meta(vec![
            parse_meta("lang=en").unwrap(),
            parse_meta("lang=th").unwrap(),
        ]);
        assert_eq!(meta["lang"], MetadataValue::from("th"));
    }
}
