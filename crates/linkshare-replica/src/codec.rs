//! Conversion between records and remote nodes.

use std::collections::BTreeMap;

use linkshare_remote::{FieldValue, RemoteNode};
use linkshare_types::{fields, Millis, PostId, Record};

use crate::error::MalformedRecord;

/// Decode the node delivered under `id` into a record.
///
/// Every field of the record shape must be present with the right type.
/// Anything else is a tombstone, a metadata-only marker, or a partial node,
/// and is rejected.
pub fn decode_record(id: &str, node: Option<&RemoteNode>) -> Result<Record, MalformedRecord> {
    let node = node.ok_or(MalformedRecord::Tombstone)?;
    if node.is_metadata_only() {
        return Err(MalformedRecord::MetadataOnly);
    }

    let id = PostId::parse(id)?;
    for field in fields::REQUIRED {
        present(node, field)?;
    }
    let content = text_field(node, fields::CONTENT)?;
    let author = text_field(node, fields::AUTHOR)?;
    let created_at = count_field(node, fields::CREATED_AT)?;
    let like_count = count_field(node, fields::LIKE_COUNT)?;

    Ok(Record {
        id,
        content,
        author,
        created_at: Millis::new(created_at),
        like_count,
    })
}

/// The full set of node fields for a record. The id is the node key.
pub fn encode_record(record: &Record) -> BTreeMap<String, FieldValue> {
    let mut out = BTreeMap::new();
    out.insert(fields::CONTENT.to_string(), FieldValue::text(record.content.clone()));
    out.insert(fields::AUTHOR.to_string(), FieldValue::text(record.author.clone()));
    out.insert(
        fields::CREATED_AT.to_string(),
        FieldValue::Integer(clamp_i64(record.created_at.as_u64())),
    );
    out.insert(
        fields::LIKE_COUNT.to_string(),
        FieldValue::Integer(clamp_i64(record.like_count)),
    );
    out
}

/// Field value for a like count write.
pub fn encode_like_count(count: u64) -> FieldValue {
    FieldValue::Integer(clamp_i64(count))
}

fn clamp_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn present<'a>(node: &'a RemoteNode, field: &'static str) -> Result<&'a FieldValue, MalformedRecord> {
    match node.get(field) {
        None | Some(FieldValue::Null) => Err(MalformedRecord::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn text_field(node: &RemoteNode, field: &'static str) -> Result<String, MalformedRecord> {
    present(node, field)?
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| MalformedRecord::InvalidField {
            field,
            reason: "expected text".into(),
        })
}

fn count_field(node: &RemoteNode, field: &'static str) -> Result<u64, MalformedRecord> {
    let value = present(node, field)?
        .as_integer()
        .ok_or_else(|| MalformedRecord::InvalidField {
            field,
            reason: "expected an integer".into(),
        })?;
    u64::try_from(value).map_err(|_| MalformedRecord::InvalidField {
        field,
        reason: format!("negative value {value}"),
    })
}

#[cfg(test)]
mod tests {
    use linkshare_remote::NodeMeta;

    use super::*;

    fn node(pairs: &[(&str, FieldValue)]) -> RemoteNode {
        RemoteNode::from_fields(pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect())
    }

    fn with_marker(mut node: RemoteNode) -> RemoteNode {
        node.meta = Some(NodeMeta {
            soul: "posts/abc".into(),
            states: BTreeMap::new(),
        });
        node
    }

    fn full() -> RemoteNode {
        with_marker(node(&[
            ("content", "hi".into()),
            ("author", "alice".into()),
            ("createdAt", FieldValue::Integer(1000)),
            ("likeCount", FieldValue::Integer(2)),
        ]))
    }

    fn without(field: &str) -> RemoteNode {
        let mut node = full();
        node.fields.remove(field);
        node
    }

    #[test]
    fn decodes_complete_node() {
        let record = decode_record("abc", Some(&full())).unwrap();
        assert_eq!(record.id.as_str(), "abc");
        assert_eq!(record.content, "hi");
        assert_eq!(record.author, "alice");
        assert_eq!(record.created_at, Millis::new(1000));
        assert_eq!(record.like_count, 2);
    }

    #[test]
    fn rejects_tombstone_and_metadata_only() {
        assert_eq!(decode_record("abc", None), Err(MalformedRecord::Tombstone));
        let marker = with_marker(RemoteNode::default());
        assert_eq!(decode_record("abc", Some(&marker)), Err(MalformedRecord::MetadataOnly));
        let cleared = with_marker(node(&[("content", FieldValue::Null)]));
        assert_eq!(decode_record("abc", Some(&cleared)), Err(MalformedRecord::MetadataOnly));
    }

    #[test]
    fn every_record_field_is_required() {
        for field in fields::REQUIRED {
            assert_eq!(
                decode_record("abc", Some(&without(field))),
                Err(MalformedRecord::MissingField(field)),
                "without {field}"
            );
        }

        let mut nulled = full();
        nulled.fields.insert(fields::CONTENT.into(), FieldValue::Null);
        assert_eq!(
            decode_record("abc", Some(&nulled)),
            Err(MalformedRecord::MissingField(fields::CONTENT))
        );
    }

    #[test]
    fn missing_fields_are_reported_before_wrong_types() {
        let mut partial = without(fields::LIKE_COUNT);
        partial.fields.insert(fields::CONTENT.into(), FieldValue::Integer(5));
        assert_eq!(
            decode_record("abc", Some(&partial)),
            Err(MalformedRecord::MissingField(fields::LIKE_COUNT))
        );
    }

    #[test]
    fn rejects_wrong_types_and_negative_counts() {
        let mut wrong = full();
        wrong.fields.insert(fields::CONTENT.into(), FieldValue::Integer(5));
        assert!(matches!(
            decode_record("abc", Some(&wrong)),
            Err(MalformedRecord::InvalidField { field: "content", .. })
        ));

        let mut negative = full();
        negative.fields.insert(fields::LIKE_COUNT.into(), FieldValue::Integer(-1));
        assert!(matches!(
            decode_record("abc", Some(&negative)),
            Err(MalformedRecord::InvalidField { field: "likeCount", .. })
        ));

        let mut integral = full();
        integral.fields.insert(fields::CREATED_AT.into(), FieldValue::Float(1000.0));
        assert_eq!(
            decode_record("abc", Some(&integral)).unwrap().created_at,
            Millis::new(1000)
        );
    }

    #[test]
    fn rejects_empty_id() {
        assert!(matches!(
            decode_record("", Some(&full())),
            Err(MalformedRecord::InvalidId(_))
        ));
    }

    #[test]
    fn encoded_record_decodes_back() {
        let record = Record::new(PostId::parse("abc").unwrap(), "hi", "alice", Millis::new(1000));
        let node = RemoteNode::from_fields(encode_record(&record));
        assert_eq!(decode_record("abc", Some(&node)).unwrap(), record);
    }
}
