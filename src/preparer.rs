//! Document Preparer: sanitize, flatten metadata, chunk,
//! hash, and assemble the `StoredItem` shapes a logical document
//! expands into.

use crate::chunking::chunk_content;
use crate::error::{EngineError, Result};
use crate::hashing::content_hash;
use crate::sanitize::{flatten_metadata, sanitize};
use crate::types::{LogicalDocument, MetaValue, Metadata};

/// One prospective stored item: an id, sanitized content, and the
/// metadata it would carry if written.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedItem {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
}

/// Reject ids that collide with the chunk-id suffix convention, before
/// any store call.
pub fn validate_id(id: &str) -> Result<()> {
    if is_chunk_suffixed(id) {
        return Err(EngineError::MalformedInput {
            message: format!("id {id} ends with a reserved _chunk_<n> suffix"),
        });
    }
    Ok(())
}

fn is_chunk_suffixed(id: &str) -> bool {
    match id.rfind("_chunk_") {
        Some(pos) => id[pos + "_chunk_".len()..].chars().all(|c| c.is_ascii_digit()) && pos + 7 < id.len(),
        None => false,
    }
}

/// Expand one logical document into the `StoredItem`s it produces: one
/// item whose id equals the logical id if content fits a single chunk,
/// otherwise `totalChunks` items named `<id>_chunk_<i>` carrying
/// `chunkIndex`/`totalChunks`/`parentDocId`.
pub fn prepare(doc: &LogicalDocument) -> Result<Vec<PreparedItem>> {
    validate_id(&doc.id)?;

    let content = sanitize(&doc.content);
    let base_metadata = flatten_metadata(&doc.metadata);

    let chunks = match &doc.pre_chunked {
        Some(pre) if pre.chunks.len() >= 2 => pre.chunks.iter().map(|c| sanitize(c)).collect(),
        _ => chunk_content(&content),
    };

    let total = chunks.len();
    let mut items = Vec::with_capacity(total);

    for (index, chunk_text) in chunks.into_iter().enumerate() {
        let mut metadata = base_metadata.clone();
        metadata.insert("_contentHash".to_string(), MetaValue::Str(content_hash(&chunk_text)));

        let id = if total == 1 {
            doc.id.clone()
        } else {
            metadata.insert("chunkIndex".to_string(), MetaValue::Num(index as f64));
            metadata.insert("totalChunks".to_string(), MetaValue::Num(total as f64));
            metadata.insert("parentDocId".to_string(), MetaValue::Str(doc.id.clone()));
            format!("{}_chunk_{}", doc.id, index)
        };

        items.push(PreparedItem {
            id,
            content: chunk_text,
            metadata,
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn doc(id: &str, content: &str) -> LogicalDocument {
        LogicalDocument {
            id: id.to_string(),
            content: content.to_string(),
            metadata: BTreeMap::new(),
            pre_chunked: None,
        }
    }

    #[test]
    fn short_doc_is_one_item_named_after_logical_id() {
        let items = prepare(&doc("jira-1", "Short issue")).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "jira-1");
        assert!(!items[0].metadata.contains_key("chunkIndex"));
    }

    #[test]
    fn long_doc_produces_indexed_chunk_ids() {
        let content = "x".repeat(9000);
        let items = prepare(&doc("doc-long", &content)).unwrap();
        assert!(items.len() >= 2);
        for (i, item) in items.iter().enumerate() {
            assert_eq!(item.id, format!("doc-long_chunk_{i}"));
            assert_eq!(item.metadata.get("chunkIndex").unwrap().as_f64(), Some(i as f64));
            assert_eq!(item.metadata.get("totalChunks").unwrap().as_f64(), Some(items.len() as f64));
            assert_eq!(item.metadata.get("parentDocId").unwrap().as_str(), Some("doc-long"));
        }
    }

    #[test]
    fn content_hash_is_over_the_stored_chunk_not_the_whole_document() {
        let content = "x".repeat(9000);
        let items = prepare(&doc("doc-long", &content)).unwrap();
        for item in &items {
            assert_eq!(
                item.metadata.get("_contentHash").unwrap().as_str(),
                Some(content_hash(&item.content).as_str())
            );
        }
    }

    #[test]
    fn reserved_chunk_suffix_id_is_rejected() {
        let err = prepare(&doc("doc_chunk_0", "hi")).unwrap_err();
        assert!(matches!(err, EngineError::MalformedInput { .. }));
    }

    #[test]
    fn pre_chunked_override_replaces_automatic_chunking() {
        let mut d = doc("doc-1", "will be ignored");
        d.pre_chunked = Some(crate::types::PreChunked {
            chunks: vec!["part one".to_string(), "part two".to_string()],
        });
        let items = prepare(&d).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].content, "part one");
        assert_eq!(items[1].content, "part two");
    }
}
